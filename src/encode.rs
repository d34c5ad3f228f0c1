//! Incremental encoder: `begin` a frame, `feed` it payload bytes in however
//! many calls are convenient, then `end` it to finalize the trailer.
//!
//! The encoder tracks its write position as a buffer index rather than a raw
//! pointer, and every write is bounds-checked against the caller's `dst`
//! slice, which is passed explicitly to each call rather than stored on the
//! encoder - that keeps the encoder reusable across frames targeting
//! different buffers without fighting the borrow checker.

use crate::dictionary::Dictionary;
use crate::hash::{finalize, hash8};
use crate::{Encoding, Error};

const DICT_BIT: u8 = 0x80;
const JUMP_PLAIN: u8 = 0xFF;
const JUMP_DICT: u8 = 0x7F;

/// Which dictionary slot a call to [`Encoder::set_dictionary`] fills.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum DictSlot {
    Dict1 = 0,
    Dict2 = 1,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Never successfully begun, or the previous frame ended.
    Created,
    /// `begin` succeeded with a usable encoding; `feed`/`end` accepted.
    Ready,
    /// `begin` succeeded but named a dictionary slot that can't ever encode
    /// (the reserved encoding); every `feed`/`end` call reports
    /// [`Error::NotInitialized`], same as before `begin` was ever called.
    Invalid,
}

/// Incremental DZCOBS encoder.
///
/// One encoder can be reused across many frames: call [`Encoder::begin`] to
/// start each new frame, [`Encoder::feed`] any number of times, then
/// [`Encoder::end`] to finalize it.
pub struct Encoder<'d> {
    dict: [Option<Dictionary<'d>>; 2],
    state: State,
    code_pos: usize,
    cur_pos: usize,
    code: u8,
    hashsum: u8,
    user6: u8,
    encoding: Encoding,
    is_last_code_dictionary: bool,
}

impl<'d> Default for Encoder<'d> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d> Encoder<'d> {
    pub fn new() -> Self {
        Encoder {
            dict: [None, None],
            state: State::Created,
            code_pos: 0,
            cur_pos: 0,
            code: 1,
            hashsum: 0,
            user6: 0,
            encoding: Encoding::Plain,
            is_last_code_dictionary: false,
        }
    }

    /// Registers a dictionary for later use by [`Encoder::begin`] with
    /// [`Encoding::Dict1`] or [`Encoding::Dict2`].
    pub fn set_dictionary(&mut self, dict: Dictionary<'d>, slot: DictSlot) {
        self.dict[slot as usize] = Some(dict);
    }

    /// Sets the 6-bit user tag carried in the trailer. Must be non-zero by
    /// the time [`Encoder::end`] is called; the encoder does not reset this
    /// value on `begin`, so a caller that reuses the same tag across frames
    /// need not call this again.
    pub fn set_user6(&mut self, user6: u8) {
        self.user6 = user6;
    }

    /// Starts a new frame into `dst`. Resets the internal cursor, code, and
    /// checksum state.
    pub fn begin(&mut self, encoding: Encoding, dst: &mut [u8]) -> Result<(), Error> {
        if dst.len() < 2 {
            return Err(Error::BadArg);
        }
        match encoding {
            Encoding::Dict1 if self.dict[0].is_none() => return Err(Error::BadArg),
            Encoding::Dict2 if self.dict[1].is_none() => return Err(Error::BadArg),
            _ => {}
        }

        self.code_pos = 0;
        self.cur_pos = 1;
        self.code = 1;
        self.hashsum = 0;
        self.is_last_code_dictionary = false;
        self.encoding = encoding;
        self.state = if matches!(encoding, Encoding::Reserved) {
            State::Invalid
        } else {
            State::Ready
        };
        Ok(())
    }

    /// Feeds `src` into the in-progress frame. A zero-length `src` is a
    /// successful no-op.
    pub fn feed(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), Error> {
        if !matches!(self.state, State::Ready) {
            return Err(Error::NotInitialized);
        }
        if src.is_empty() {
            return Ok(());
        }

        let result = match self.encoding {
            Encoding::Plain => self.feed_plain(dst, src),
            Encoding::Dict1 => self.feed_dict(dst, src, 0),
            Encoding::Dict2 => self.feed_dict(dst, src, 1),
            Encoding::Reserved => Err(Error::NotInitialized),
        };
        if result.is_err() {
            self.state = State::Invalid;
        }
        result
    }

    /// Finalizes the frame: writes the pending code byte (if any), the
    /// trailer tag, and the checksum byte. Returns the total encoded length
    /// written to `dst`.
    pub fn end(&mut self, dst: &mut [u8]) -> Result<usize, Error> {
        if !matches!(self.state, State::Ready) {
            return Err(Error::NotInitialized);
        }
        if self.cur_pos >= dst.len() {
            self.state = State::Invalid;
            return Err(Error::WriteOverflow);
        }
        if self.user6 == 0 {
            self.state = State::Invalid;
            return Err(Error::InvalidUser6Bits);
        }

        let result = self.finish(dst);
        self.state = if result.is_ok() { State::Created } else { State::Invalid };
        result
    }

    fn finish(&mut self, dst: &mut [u8]) -> Result<usize, Error> {
        if self.is_last_code_dictionary {
            // The reserved code slot was never filled with a literal group;
            // give it back.
            self.cur_pos -= 1;
        } else {
            let code = self.code;
            self.write_byte(dst, self.code_pos, code)?;
            self.hashsum = self.hashsum.wrapping_add(hash8(code));
        }

        let tag = (self.user6 << 2) | (self.encoding as u8 & 0x03);
        self.write_byte(dst, self.cur_pos, tag)?;
        self.hashsum = self.hashsum.wrapping_add(hash8(tag));
        self.cur_pos += 1;

        let checksum = finalize(self.hashsum);
        self.write_byte(dst, self.cur_pos, checksum)?;
        self.cur_pos += 1;

        Ok(self.cur_pos)
    }

    fn write_byte(&self, dst: &mut [u8], pos: usize, value: u8) -> Result<(), Error> {
        *dst.get_mut(pos).ok_or(Error::WriteOverflow)? = value;
        Ok(())
    }

    /// Closes the current literal group: writes the pending code byte at
    /// `code_pos`, reserves the next slot, and resets `code` to 1.
    fn close_group(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        let code = self.code;
        self.write_byte(dst, self.code_pos, code)?;
        self.hashsum = self.hashsum.wrapping_add(hash8(code));
        self.code_pos = self.cur_pos;
        self.cur_pos += 1;
        self.code = 1;
        Ok(())
    }

    fn feed_plain(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), Error> {
        let n = src.len();
        for (i, &b) in src.iter().enumerate() {
            let remaining_after = n - i - 1;
            if b == 0 {
                self.close_group(dst)?;
            } else {
                self.hashsum = self.hashsum.wrapping_add(hash8(b));
                self.write_byte(dst, self.cur_pos, b)?;
                self.cur_pos += 1;
                self.code += 1;
                if self.code == JUMP_PLAIN && remaining_after > 0 {
                    self.close_group(dst)?;
                }
            }
        }
        Ok(())
    }

    fn feed_dict(&mut self, dst: &mut [u8], src: &[u8], dict_idx: usize) -> Result<(), Error> {
        let dict = self.dict[dict_idx].expect("dictionary set by begin()");
        let n = src.len();
        let mut i = 0usize;

        while i < n {
            let (global_idx, matched_len) = dict.search(&src[i..]);
            if global_idx != 0 {
                let token = DICT_BIT | (global_idx - 1);
                self.hashsum = self.hashsum.wrapping_add(hash8(token));
                if self.code != 1 {
                    self.close_group(dst)?;
                }
                self.write_byte(dst, self.code_pos, token)?;
                self.code_pos = self.cur_pos;
                self.cur_pos += 1;
                i += matched_len as usize;
                self.is_last_code_dictionary = true;
                continue;
            }

            self.is_last_code_dictionary = false;
            let remaining_after = n - i - 1;
            let b = src[i];
            i += 1;
            if b == 0 {
                self.close_group(dst)?;
            } else {
                self.hashsum = self.hashsum.wrapping_add(hash8(b));
                self.write_byte(dst, self.cur_pos, b)?;
                self.cur_pos += 1;
                self.code += 1;
                if self.code == JUMP_DICT && remaining_after > 0 {
                    self.close_group(dst)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;

    fn encode_plain(payload: &[u8], user6: u8) -> std::vec::Vec<u8> {
        let mut dst = vec![0u8; crate::max_encoded_len(payload.len())];
        let mut enc = Encoder::new();
        enc.begin(Encoding::Plain, &mut dst).unwrap();
        enc.set_user6(user6);
        enc.feed(&mut dst, payload).unwrap();
        let len = enc.end(&mut dst).unwrap();
        dst.truncate(len);
        dst
    }

    #[test]
    fn encodes_single_byte_plain() {
        // Vector 0 from the reference plain-encoding table.
        let encoded = encode_plain(b"A", 0x3F);
        assert_eq!(encoded, vec![0x02, b'A', 0xFC, 0x54]);
    }

    #[test]
    fn encodes_four_literal_bytes_plain() {
        let encoded = encode_plain(b"ABCD", 0x3F);
        assert_eq!(encoded, vec![0x05, b'A', b'B', b'C', b'D', 0xFC, 0x9C]);
    }

    #[test]
    fn encodes_embedded_zero_plain() {
        let encoded = encode_plain(b"AB\x00C", 0x3F);
        assert_eq!(encoded, vec![0x03, b'A', b'B', 0x02, b'C', 0xFC, 0x74]);
    }

    #[test]
    fn encodes_leading_run_of_zeros_plain() {
        let encoded = encode_plain(b"A\x00\x00\x00BCD", 0x3F);
        assert_eq!(
            encoded,
            vec![0x02, b'A', 0x01, 0x01, 0x04, b'B', b'C', b'D', 0xFC, 0x7B]
        );
    }

    #[test]
    fn encodes_lone_zero_plain() {
        let encoded = encode_plain(&[0x00], 0x3F);
        assert_eq!(encoded, vec![0x01, 0x01, 0xFC, 0x37]);
    }

    #[test]
    fn encodes_two_zeros_plain() {
        let encoded = encode_plain(&[0x00, 0x00], 0x3F);
        assert_eq!(encoded, vec![0x01, 0x01, 0x01, 0xFC, 0xDC]);
    }

    #[test]
    fn encodes_mixed_zero_run_plain() {
        let encoded = encode_plain(&[0x00, 0x11, 0x00], 0x3F);
        assert_eq!(encoded, vec![0x01, 0x02, 0x11, 0x01, 0xFC, 0xC8]);
    }

    const TEST_DICTIONARY_1: &[u8] = &[
        b'2', 0x01, 0x01, //
        b'3', 0x02, 0x00, 0x02, //
        b'4', 0x03, 0x00, 0x00, 0x03, //
        b'5', 0x04, 0x00, 0x00, 0x00, 0x04, //
    ];

    fn encode_dict1(payload: &[u8], user6: u8) -> std::vec::Vec<u8> {
        let dict = Dictionary::new(TEST_DICTIONARY_1).unwrap();
        let mut dst = vec![0u8; crate::max_encoded_len(payload.len())];
        let mut enc = Encoder::new();
        enc.set_dictionary(dict, DictSlot::Dict1);
        enc.begin(Encoding::Dict1, &mut dst).unwrap();
        enc.set_user6(user6);
        enc.feed(&mut dst, payload).unwrap();
        let len = enc.end(&mut dst).unwrap();
        dst.truncate(len);
        dst
    }

    #[test]
    fn encodes_single_dictionary_word() {
        let encoded = encode_dict1(&[0x01, 0x01], 0x3F);
        assert_eq!(encoded, vec![0x80, 0xFD, 0x84]);
    }

    #[test]
    fn encodes_two_back_to_back_dictionary_words() {
        let encoded = encode_dict1(&[0x01, 0x01, 0x01, 0x01], 0x3F);
        assert_eq!(encoded, vec![0x80, 0x80, 0xFD, 0x74]);
    }

    #[test]
    fn encodes_literal_then_two_dictionary_words() {
        let encoded = encode_dict1(&[0x12, 0x01, 0x01, 0x01, 0x01], 0x3F);
        assert_eq!(encoded, vec![0x02, 0x12, 0x80, 0x80, 0xFD, 0x12]);
    }

    #[test]
    fn encodes_deferred_zero_before_dictionary_word() {
        // Vector 5 from the reference dictionary table: the explicit zero
        // between two dictionary words must still show up in the payload,
        // and must not be swallowed by the deferred-zero bookkeeping around
        // the dictionary token.
        let encoded = encode_dict1(&[0x12, 0x01, 0x01, 0x00, 0x02, 0x00, 0x02], 0x3F);
        assert_eq!(encoded, vec![0x02, 0x12, 0x80, 0x01, 0x81, 0xFD, 0x5C]);
    }

    #[test]
    fn begin_rejects_undersized_buffer() {
        let mut enc = Encoder::new();
        let mut dst = [0u8; 1];
        assert_eq!(enc.begin(Encoding::Plain, &mut dst), Err(Error::BadArg));
    }

    #[test]
    fn begin_rejects_dictionary_encoding_without_dictionary_set() {
        let mut enc = Encoder::new();
        let mut dst = [0u8; 8];
        assert_eq!(enc.begin(Encoding::Dict1, &mut dst), Err(Error::BadArg));
    }

    #[test]
    fn feed_before_begin_is_not_initialized() {
        let mut enc = Encoder::new();
        let mut dst = [0u8; 8];
        assert_eq!(enc.feed(&mut dst, b"x"), Err(Error::NotInitialized));
    }

    #[test]
    fn end_rejects_zero_user6() {
        let mut enc = Encoder::new();
        let mut dst = [0u8; 8];
        enc.begin(Encoding::Plain, &mut dst).unwrap();
        enc.feed(&mut dst, b"A").unwrap();
        assert_eq!(enc.end(&mut dst), Err(Error::InvalidUser6Bits));
    }

    #[test]
    fn end_reports_write_overflow_on_undersized_buffer() {
        let mut enc = Encoder::new();
        // Minimum begin-accepted size, but too small once payload is fed.
        let mut dst = [0u8; 2];
        enc.begin(Encoding::Plain, &mut dst).unwrap();
        enc.set_user6(1);
        let err = enc.feed(&mut dst, b"AB");
        assert_eq!(err, Err(Error::WriteOverflow));
    }

    #[test]
    fn reserved_encoding_begins_but_never_initializes() {
        let mut enc = Encoder::new();
        let mut dst = [0u8; 8];
        enc.begin(Encoding::Reserved, &mut dst).unwrap();
        assert_eq!(enc.feed(&mut dst, b"A"), Err(Error::NotInitialized));
        assert_eq!(enc.end(&mut dst), Err(Error::NotInitialized));
    }

    #[test]
    fn encoder_is_reusable_across_frames() {
        let mut enc = Encoder::new();
        let mut dst = vec![0u8; 16];

        enc.begin(Encoding::Plain, &mut dst).unwrap();
        enc.set_user6(1);
        enc.feed(&mut dst, b"A").unwrap();
        let len1 = enc.end(&mut dst).unwrap();
        assert_eq!(&dst[..len1], &[0x02, b'A', 0x04, hash_for(&[0x02, b'A', 0x04])]);

        let mut dst2 = vec![0u8; 16];
        enc.begin(Encoding::Plain, &mut dst2).unwrap();
        enc.set_user6(2);
        enc.feed(&mut dst2, b"BB").unwrap();
        let len2 = enc.end(&mut dst2).unwrap();
        assert_eq!(
            &dst2[..len2],
            &[0x03, b'B', b'B', 0x08, hash_for(&[0x03, b'B', b'B', 0x08])]
        );
    }

    fn hash_for(body: &[u8]) -> u8 {
        crate::hash::finalize(crate::hash::frame_hash(body))
    }
}
