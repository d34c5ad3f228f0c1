//! Dictionary substitution tables used by the dictionary-backed encodings.
//!
//! A dictionary is a flat byte blob: a sequence of `(length_byte, word)`
//! pairs, where `length_byte = b'0' + word.len()` and `word.len()` is in
//! `2..=5`. Words of equal length form a run, sorted strictly descending
//! (byte-lexicographic); runs appear in ascending word-length order, with at
//! most [`MAX_WORD_SIZES`] distinct lengths and [`MAX_WORDS`] words total.
//! Global indices are assigned 1-based, in blob order, across all runs.

use core::cmp::Ordering;
use core::fmt;

/// At most this many distinct word lengths may appear in one dictionary.
pub const MAX_WORD_SIZES: usize = 4;
/// Shortest word length a dictionary entry may declare.
pub const MIN_WORD_SIZE: u8 = 2;
/// Longest word length a dictionary entry may declare.
pub const MAX_WORD_SIZE: u8 = 5;
/// At most this many words may appear in one dictionary (7-bit token field).
pub const MAX_WORDS: u32 = 127;

/// A small built-in dictionary tuned for embedded/JSON-ish byte streams:
/// common zero/one run patterns and a CRLF pair.
///
/// Transcribed from the reference dictionary, but re-sorted so each
/// same-length run is in strictly descending byte-lexicographic order, as
/// [`Dictionary::validate`] requires - the reference blob's comment claims
/// descending order but its bytes are actually ascending (see DESIGN.md).
pub const DEFAULT_DICTIONARY: &[u8] = &[
    b'2', 0x0D, 0x0A, //
    b'2', 0x01, 0x00, //
    b'2', 0x00, 0x01, //
    b'2', 0x00, 0x00, //
    b'3', 0x01, 0x00, 0x00, //
    b'3', 0x00, 0x01, 0x00, //
    b'3', 0x00, 0x00, 0x01, //
    b'3', 0x00, 0x00, 0x00, //
    0x00, // trailing NUL, as in the reference blob
];

/// Errors produced while validating or constructing a dictionary from a raw
/// blob. Kept separate from [`crate::Error`] because these describe defects
/// in dictionary *shape*, not in an encoded frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DictionaryError {
    /// A word is not strictly less than the previous word in its run.
    NotSorted,
    /// A declared word would read past the end of the blob, but at least one
    /// byte of it is present (a partially-truncated word).
    OutOfBounds,
    /// More than [`MAX_WORDS`] words are present.
    WordCounting,
    /// A length byte is outside `'0'+2 ..= '0'+5`, or a bucket's word length
    /// decreases relative to the previous bucket.
    WordSize,
    /// The blob ends immediately after a length byte, with zero word bytes
    /// present.
    EarlierEnd,
    /// More than [`MAX_WORD_SIZES`] distinct word lengths are present.
    NumberOfWordSizes,
}

impl fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DictionaryError::NotSorted => "dictionary words are not strictly descending within a run",
            DictionaryError::OutOfBounds => "declared word extends past the end of the dictionary blob",
            DictionaryError::WordCounting => "dictionary has more words than the 127-word limit",
            DictionaryError::WordSize => {
                "dictionary contains a length byte outside 2..=5, or word size decreases across buckets"
            }
            DictionaryError::EarlierEnd => "dictionary blob ends immediately after a length byte",
            DictionaryError::NumberOfWordSizes => "dictionary has more than 4 distinct word lengths",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for DictionaryError {}

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    /// Offset of this run's first length byte within the blob.
    start: usize,
    word_len: u8,
    /// `word_len + 1`: the byte stride between consecutive words in the run.
    stride: usize,
    count: u8,
    /// 0-based global index of this run's first word.
    global_start: u8,
}

/// A validated, searchable dictionary built from a borrowed blob.
#[derive(Clone, Copy, Debug)]
pub struct Dictionary<'d> {
    blob: &'d [u8],
    buckets: [Bucket; MAX_WORD_SIZES],
    bucket_count: usize,
}

/// Scans `blob`, optionally filling `buckets` with one entry per distinct
/// word length encountered. Shared by [`validate`] and [`Dictionary::new`]
/// so the two can never disagree about what makes a blob well-formed.
fn scan(blob: &[u8], mut buckets: Option<&mut [Bucket; MAX_WORD_SIZES]>) -> Result<usize, DictionaryError> {
    let mut pos = 0usize;
    let mut total_words: u32 = 0;
    let mut bucket_count = 0usize;
    let mut cur_word_len: Option<u8> = None;
    let mut prev_word: Option<&[u8]> = None;

    while pos < blob.len() {
        let size_byte = blob[pos];
        if size_byte == 0 {
            // Tolerated trailing terminator.
            break;
        }
        if size_byte < b'0' + MIN_WORD_SIZE || size_byte > b'0' + MAX_WORD_SIZE {
            return Err(DictionaryError::WordSize);
        }
        let word_len = size_byte - b'0';

        let word_start = pos + 1;
        if word_start >= blob.len() {
            return Err(DictionaryError::EarlierEnd);
        }
        let word_end = word_start + word_len as usize;
        if word_end > blob.len() {
            return Err(DictionaryError::OutOfBounds);
        }
        let word = &blob[word_start..word_end];

        let starts_new_bucket = match cur_word_len {
            None => true,
            Some(cl) if word_len == cl => false,
            Some(cl) if word_len > cl => true,
            // Word size decreasing across buckets.
            Some(_) => return Err(DictionaryError::WordSize),
        };

        if starts_new_bucket {
            cur_word_len = Some(word_len);
            prev_word = None;
            bucket_count += 1;
            if bucket_count > MAX_WORD_SIZES {
                return Err(DictionaryError::NumberOfWordSizes);
            }
            if let Some(buckets) = buckets.as_deref_mut() {
                buckets[bucket_count - 1] = Bucket {
                    start: pos,
                    word_len,
                    stride: word_len as usize + 1,
                    count: 0,
                    global_start: total_words as u8,
                };
            }
        }

        if let Some(prev) = prev_word {
            if word.cmp(prev) != Ordering::Less {
                return Err(DictionaryError::NotSorted);
            }
        }
        prev_word = Some(word);

        total_words += 1;
        if total_words > MAX_WORDS {
            return Err(DictionaryError::WordCounting);
        }
        if let Some(buckets) = buckets.as_deref_mut() {
            buckets[bucket_count - 1].count += 1;
        }

        pos = word_end;
    }

    Ok(bucket_count)
}

/// Validates that `blob` is a well-formed dictionary, without building a
/// searchable [`Dictionary`] from it.
pub fn validate(blob: &[u8]) -> Result<(), DictionaryError> {
    scan(blob, None).map(|_| ())
}

impl<'d> Dictionary<'d> {
    /// Validates and indexes `blob`, returning a dictionary ready for
    /// [`Dictionary::search`]/[`Dictionary::get`].
    pub fn new(blob: &'d [u8]) -> Result<Self, DictionaryError> {
        let mut buckets = [Bucket::default(); MAX_WORD_SIZES];
        let bucket_count = scan(blob, Some(&mut buckets))?;
        Ok(Dictionary {
            blob,
            buckets,
            bucket_count,
        })
    }

    /// Finds the longest dictionary word that is a prefix of `key`. Returns
    /// `(1-based global index, matched length)`, or `(0, 0)` if no word
    /// matches. Buckets are tried from longest word length to shortest so
    /// the match is always the longest available, never the first found.
    pub fn search(&self, key: &[u8]) -> (u8, u8) {
        for bucket in self.buckets[..self.bucket_count].iter().rev() {
            let word_len = bucket.word_len as usize;
            if word_len > key.len() {
                continue;
            }
            let probe = &key[..word_len];

            let mut lo: i32 = 0;
            let mut hi: i32 = bucket.count as i32 - 1;
            while lo <= hi {
                let mid = (lo + hi) / 2;
                let word_start = bucket.start + 1 + (mid as usize) * bucket.stride;
                let word = &self.blob[word_start..word_start + word_len];
                match probe.cmp(word) {
                    Ordering::Equal => {
                        let index = bucket.global_start + 1 + mid as u8;
                        return (index, word_len as u8);
                    }
                    // Run is sorted descending: a larger probe sits earlier.
                    Ordering::Greater => hi = mid - 1,
                    Ordering::Less => lo = mid + 1,
                }
            }
        }
        (0, 0)
    }

    /// Looks up a word by its 0-based dictionary token index (`0..=126`).
    pub fn get(&self, index: u8) -> Option<(&[u8], u8)> {
        for bucket in self.buckets[..self.bucket_count].iter() {
            let local_end = bucket.global_start.checked_add(bucket.count)?;
            if index >= bucket.global_start && index < local_end {
                let local_idx = (index - bucket.global_start) as usize;
                let word_start = bucket.start + 1 + local_idx * bucket.stride;
                let word_len = bucket.word_len as usize;
                return Some((&self.blob[word_start..word_start + word_len], bucket.word_len));
            }
        }
        None
    }
}
