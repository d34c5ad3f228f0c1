//! One-shot decoder: an encoded frame is decoded in a single call, with no
//! state carried between frames.

use crate::dictionary::Dictionary;
use crate::hash::{finalize, frame_hash};
use crate::{Encoding, Error};

const DICT_BIT: u8 = 0x80;
const JUMP_PLAIN: u8 = 0xFF;
const JUMP_DICT: u8 = 0x7F;

/// The two dictionary slots a decoder may need, matching the encoder's
/// [`crate::encode::DictSlot`] assignment.
#[derive(Clone, Copy, Default)]
pub struct Dictionaries<'d> {
    pub dict1: Option<Dictionary<'d>>,
    pub dict2: Option<Dictionary<'d>>,
}

/// Result of a successful [`decode`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decoded {
    /// Number of bytes written to the caller's output buffer.
    pub len: usize,
    /// The 6-bit user tag carried in the frame trailer.
    pub user6: u8,
}

/// Decodes one DZCOBS frame from `src` into `dst`.
///
/// `src` must include the 2-byte trailer. `dst` must be large enough for the
/// decoded payload; there is no way to discover the required size without
/// decoding; callers without a tighter bound should size `dst` to
/// `src.len()`, which is always sufficient.
pub fn decode(src: &[u8], dst: &mut [u8], dicts: Dictionaries<'_>) -> Result<Decoded, Error> {
    if dst.is_empty() || src.len() < 3 {
        return Err(Error::BadArg);
    }

    let hash_received = src[src.len() - 1];
    let tag_received = src[src.len() - 2];
    if hash_received == 0 || tag_received == 0 {
        return Err(Error::BadEncodedPayload);
    }

    let without_hash = &src[..src.len() - 1];
    let computed = frame_hash(without_hash);
    if finalize(computed) != hash_received {
        return Err(Error::Crc);
    }

    let encoding = match tag_received & 0x03 {
        0 => Encoding::Plain,
        1 => Encoding::Dict1,
        2 => Encoding::Dict2,
        _ => Encoding::Reserved,
    };
    let user6 = (tag_received >> 2) & 0x3F;

    let body = &src[..src.len() - 2];

    let len = match encoding {
        Encoding::Plain => decode_plain(body, dst)?,
        Encoding::Dict1 => decode_dict(body, dst, dicts.dict1.ok_or(Error::NoDictionaryToDecode)?)?,
        Encoding::Dict2 => decode_dict(body, dst, dicts.dict2.ok_or(Error::NoDictionaryToDecode)?)?,
        Encoding::Reserved => return Err(Error::BadEncodedPayload),
    };

    Ok(Decoded { len, user6 })
}

fn decode_plain(body: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let n = body.len();
    let mut ip = 0usize;
    let mut op = 0usize;

    while ip < n {
        let code = body[ip];
        ip += 1;
        if code == 0 {
            return Err(Error::BadEncodedPayload);
        }
        let count = (code - 1) as usize;

        if count > dst.len() - op {
            return Err(Error::WriteOverflow);
        }
        if count > n - ip {
            return Err(Error::ReadOverflow);
        }
        for _ in 0..count {
            let b = body[ip];
            ip += 1;
            if b == 0 {
                return Err(Error::BadEncodedPayload);
            }
            dst[op] = b;
            op += 1;
        }

        if ip >= n {
            break;
        }
        if code != JUMP_PLAIN {
            if op >= dst.len() {
                return Err(Error::WriteOverflow);
            }
            dst[op] = 0;
            op += 1;
        }
    }

    Ok(op)
}

fn decode_dict(body: &[u8], dst: &mut [u8], dict: Dictionary<'_>) -> Result<usize, Error> {
    let n = body.len();
    let mut ip = 0usize;
    let mut op = 0usize;
    let mut zero_pending = false;

    while ip < n {
        let code = body[ip];
        ip += 1;
        if code == 0 {
            return Err(Error::BadEncodedPayload);
        }

        if code & DICT_BIT != 0 {
            zero_pending = false;
            let index = code & !DICT_BIT;
            let (word, word_len) = dict.get(index).ok_or(Error::WordNotFoundOnDictionary)?;
            let word_len = word_len as usize;
            if word_len > dst.len() - op {
                return Err(Error::WriteOverflow);
            }
            dst[op..op + word_len].copy_from_slice(word);
            op += word_len;

            if ip >= n {
                break;
            }
            continue;
        }

        if zero_pending {
            zero_pending = false;
            if op >= dst.len() {
                return Err(Error::WriteOverflow);
            }
            dst[op] = 0;
            op += 1;
        }

        let count = (code - 1) as usize;
        if count > dst.len() - op {
            return Err(Error::WriteOverflow);
        }
        if count > n - ip {
            return Err(Error::ReadOverflow);
        }
        for _ in 0..count {
            let b = body[ip];
            ip += 1;
            if b == 0 {
                return Err(Error::BadEncodedPayload);
            }
            dst[op] = b;
            op += 1;
        }

        if ip >= n {
            break;
        }
        if count == 0 {
            if op >= dst.len() {
                return Err(Error::WriteOverflow);
            }
            dst[op] = 0;
            op += 1;
        } else if code != JUMP_DICT {
            zero_pending = true;
        }
    }

    Ok(op)
}
