#![cfg_attr(not(feature = "std"), no_std)]
//! # dzcobs
//!
//! Dictionary-extended Consistent Overhead Byte Stuffing: a COBS-family
//! framing codec for byte-oriented serial links, extended with optional
//! dictionary word substitution and a 2-byte trailer carrying an
//! application-defined 6-bit tag plus an order-independent checksum.
//!
//! A frame is always delimited by a single `0x00` byte in the transport
//! (not produced or consumed by this crate - see [`encode`]/[`decode`]
//! module docs), contains no embedded zero bytes, and ends with a 2-byte
//! trailer: a tag byte (6 user bits + a 2-bit encoding selector) and a
//! checksum byte that never itself reads as zero.
//!
//! ### Usage
//!
//! See the [`encode`] or [`decode`] module documentation for reference.
//!
//! In `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dzcobs = "1.0.0"
//! ```
//!
//! Or, to only enable certain features:
//!
//! ```toml
//! [dependencies.dzcobs]
//! version = "1.0.0"
//! default-features = false
//! features = ["encode", "decode"]
//! ```
//!
//! - `encode`: Enables the incremental [`encode::Encoder`].
//! - `decode`: Enables the one-shot [`decode::decode`] function.
//! - `alloc`: Enables [`encode_to_vec`]/[`decode_to_vec`] convenience
//!   wrappers that allocate their output buffer. Without `std`, this uses
//!   `extern crate alloc`.
//! - `std`: Enables use of `std`. Implies `alloc`.
//!
//! `encode`, `decode`, and `std` are enabled by default.

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod dictionary;
pub mod hash;

#[cfg(feature = "encode")]
pub mod encode;

#[cfg(feature = "decode")]
pub mod decode;

/// Major version, per [semver](https://semver.org/).
pub const VERSION_MAJOR: u32 = 1;
/// Minor version, per [semver](https://semver.org/).
pub const VERSION_MINOR: u32 = 0;
/// Patch version, per [semver](https://semver.org/).
pub const VERSION_PATCH: u32 = 0;
/// `(major, minor, patch)` convenience tuple.
pub const VERSION: (u32, u32, u32) = (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH);

/// One byte of overhead is introduced at most once every this many input
/// bytes.
const ONE_BYTE_OVERHEAD_EVERY: usize = 127;

/// Worst-case encoded length (including the 2-byte trailer) for a payload of
/// `len` bytes.
pub const fn max_encoded_len(len: usize) -> usize {
    let overhead = (len + ONE_BYTE_OVERHEAD_EVERY - 1) / ONE_BYTE_OVERHEAD_EVERY;
    let zero_bump = if len == 0 { 1 } else { 0 };
    len + overhead + zero_bump + 2
}

/// The encoding used by one frame, carried in the low 2 bits of the trailer
/// tag byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Encoding {
    /// No dictionary substitution.
    Plain = 0,
    /// Substitution using dictionary slot 1.
    Dict1 = 1,
    /// Substitution using dictionary slot 2.
    Dict2 = 2,
    /// Reserved for future use; never produced by [`encode`], and rejected
    /// by [`decode`] if received.
    Reserved = 3,
}

/// Error result codes shared by [`encode`] and [`decode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// An argument was invalid (undersized buffer, unset dictionary slot for
    /// the requested encoding, ...).
    BadArg,
    /// A `feed`/`end` call was made without a successful `begin`.
    NotInitialized,
    /// The destination buffer ran out of room.
    WriteOverflow,
    /// The source buffer ran out of bytes mid-group.
    ReadOverflow,
    /// The encoded payload is structurally malformed (stray zero byte,
    /// unrecognized encoding, ...).
    BadEncodedPayload,
    /// The trailer checksum did not match the frame contents.
    Crc,
    /// The frame uses a dictionary encoding but no matching dictionary was
    /// supplied to the decoder.
    NoDictionaryToDecode,
    /// A dictionary token referenced an index with no corresponding word.
    WordNotFoundOnDictionary,
    /// The 6-bit user tag was zero, which is not a valid value to encode.
    InvalidUser6Bits,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Error::BadArg => write!(f, "bad argument"),
            Error::NotInitialized => write!(f, "encoder not initialized"),
            Error::WriteOverflow => write!(f, "write overflow"),
            Error::ReadOverflow => write!(f, "read overflow"),
            Error::BadEncodedPayload => write!(f, "malformed encoded payload"),
            Error::Crc => write!(f, "checksum mismatch"),
            Error::NoDictionaryToDecode => write!(f, "no dictionary set for this encoding"),
            Error::WordNotFoundOnDictionary => write!(f, "dictionary token out of range"),
            Error::InvalidUser6Bits => write!(f, "user6 tag must be in 1..=63"),
        }
    }
}

impl core::error::Error for Error {}

/// Encodes `payload` into a freshly allocated buffer.
#[cfg(all(feature = "alloc", feature = "encode"))]
pub fn encode_to_vec(
    payload: &[u8],
    user6: u8,
    encoding: Encoding,
    dict1: Option<dictionary::Dictionary<'_>>,
    dict2: Option<dictionary::Dictionary<'_>>,
) -> Result<alloc::vec::Vec<u8>, Error> {
    use encode::{DictSlot, Encoder};

    let mut dst = alloc::vec![0u8; max_encoded_len(payload.len())];
    let mut enc = Encoder::new();
    if let Some(dict) = dict1 {
        enc.set_dictionary(dict, DictSlot::Dict1);
    }
    if let Some(dict) = dict2 {
        enc.set_dictionary(dict, DictSlot::Dict2);
    }
    enc.begin(encoding, &mut dst)?;
    enc.set_user6(user6);
    enc.feed(&mut dst, payload)?;
    let len = enc.end(&mut dst)?;
    dst.truncate(len);
    Ok(dst)
}

/// Decodes `encoded` into a freshly allocated buffer sized to the input
/// length, which is always large enough for the decoded payload.
#[cfg(all(feature = "alloc", feature = "decode"))]
pub fn decode_to_vec(
    encoded: &[u8],
    dicts: decode::Dictionaries<'_>,
) -> Result<(alloc::vec::Vec<u8>, u8), Error> {
    let mut dst = alloc::vec![0u8; encoded.len()];
    let decoded = decode::decode(encoded, &mut dst, dicts)?;
    dst.truncate(decoded.len);
    Ok((dst, decoded.user6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_encoded_len_matches_reference_macro() {
        assert_eq!(max_encoded_len(0), 3);
        assert_eq!(max_encoded_len(1), 4);
        assert_eq!(max_encoded_len(127), 130);
        assert_eq!(max_encoded_len(128), 132);
        assert_eq!(max_encoded_len(254), 258);
        assert_eq!(max_encoded_len(255), 260);
    }

    #[cfg(all(feature = "alloc", feature = "encode", feature = "decode"))]
    #[test]
    fn round_trips_through_vec_helpers_plain() {
        let payload = b"hello, dzcobs";
        let encoded = encode_to_vec(payload, 7, Encoding::Plain, None, None).unwrap();
        let (decoded, user6) = decode_to_vec(&encoded, decode::Dictionaries::default()).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(user6, 7);
    }

    #[cfg(all(feature = "alloc", feature = "encode", feature = "decode"))]
    #[test]
    fn round_trips_through_vec_helpers_with_dictionary() {
        let dict = dictionary::Dictionary::new(dictionary::DEFAULT_DICTIONARY).unwrap();
        let payload = [0x0D, 0x0A, b'x', b'y', 0x0D, 0x0A];
        let encoded = encode_to_vec(&payload, 1, Encoding::Dict1, Some(dict), None).unwrap();

        let dicts = decode::Dictionaries {
            dict1: Some(dict),
            dict2: None,
        };
        let (decoded, user6) = decode_to_vec(&encoded, dicts).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(user6, 1);
    }
}
