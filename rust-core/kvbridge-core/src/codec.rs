// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Record codec.
//
// Serializes a multi-field record into the single string value the store
// holds, and parses it back with optional field projection.
//
// Text format (all lengths are decimal UTF-8 byte counts, no sign, no
// leading zeros):
//
//   record := "R" count ":" field{count}
//   field  := len ":" name ( "=" len ":" value | "~" )
//
// `~` is the explicit null marker. Names and values are carried verbatim by
// length, so separators, control characters and newlines need no escaping.
//
//   {}                      -> "R0:"
//   {name: "Ann"}           -> "R1:4:name=3:Ann"
//   {a: "1", d: null}       -> "R2:1:a=1:11:d~"

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

/// A decoded record: field name to field value.
///
/// Ordered by name so that encoding a `Record` is stable regardless of how
/// it was built.
pub type Record = BTreeMap<String, String>;

/// The set of field names a read asks for.
pub type FieldSet = HashSet<String>;

const RECORD_TAG: u8 = b'R';
const LEN_END: u8 = b':';
const VALUE_TAG: u8 = b'=';
const NULL_TAG: u8 = b'~';

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A record that cannot be represented in the encoded form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A field value is not valid UTF-8 text.
    #[error("value of field '{field}' is not valid UTF-8")]
    InvalidUtf8 {
        /// The offending field.
        field: String,
    },

    /// The same field name was supplied twice.
    #[error("field '{field}' appears more than once")]
    DuplicateField {
        /// The repeated field.
        field: String,
    },
}

/// A stored value that is not a well-formed encoded record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The value does not start with the record tag.
    #[error("missing record tag")]
    MissingTag,

    /// A length or count is empty, has a leading zero, or overflows.
    #[error("malformed length at offset {offset}")]
    BadLength {
        /// Byte offset of the length.
        offset: usize,
    },

    /// A specific byte was required but something else was found.
    #[error("expected '{expected}' at offset {offset}, found byte {found:#04x}")]
    UnexpectedByte {
        /// Byte offset of the mismatch.
        offset: usize,
        /// What the grammar required there.
        expected: char,
        /// What was actually present.
        found: u8,
    },

    /// The value ends before the declared content.
    #[error("record truncated at offset {offset}")]
    Truncated {
        /// Byte offset where more input was needed.
        offset: usize,
    },

    /// A declared length splits a multi-byte character.
    #[error("length at offset {offset} does not end on a character boundary")]
    NotCharBoundary {
        /// Byte offset of the content that was cut.
        offset: usize,
    },

    /// A field name occurs twice in one record.
    #[error("field '{field}' appears more than once")]
    DuplicateField {
        /// The repeated field.
        field: String,
    },

    /// Bytes remain after the declared number of fields.
    #[error("{remaining} trailing bytes after last field")]
    TrailingData {
        /// Number of unread bytes.
        remaining: usize,
    },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Incremental builder for an encoded record.
///
/// ```rust
/// use kvbridge_core::codec::RecordEncoder;
///
/// let mut encoder = RecordEncoder::new();
/// encoder.push("a", "1").unwrap();
/// encoder.push_null("d").unwrap();
/// assert_eq!(encoder.finish(), "R2:1:a=1:11:d~");
/// ```
#[derive(Debug, Default)]
pub struct RecordEncoder {
    body: String,
    seen: HashSet<String>,
}

impl RecordEncoder {
    /// Start an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn push(&mut self, name: &str, value: &str) -> Result<&mut Self, EncodeError> {
        self.push_name(name)?;
        self.body.push(VALUE_TAG as char);
        push_len_prefixed(&mut self.body, value);
        Ok(self)
    }

    /// Append a field whose value arrives as raw bytes.
    ///
    /// The bytes must be UTF-8; anything else is an [`EncodeError::InvalidUtf8`].
    pub fn push_bytes(&mut self, name: &str, value: &[u8]) -> Result<&mut Self, EncodeError> {
        let value = std::str::from_utf8(value).map_err(|_| EncodeError::InvalidUtf8 {
            field: name.to_string(),
        })?;
        self.push(name, value)
    }

    /// Append a field carrying the explicit null marker.
    pub fn push_null(&mut self, name: &str) -> Result<&mut Self, EncodeError> {
        self.push_name(name)?;
        self.body.push(NULL_TAG as char);
        Ok(self)
    }

    /// Number of fields appended so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Return true if no field has been appended.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Produce the encoded string.
    pub fn finish(self) -> String {
        let count = self.seen.len().to_string();
        let mut out = String::with_capacity(count.len() + 2 + self.body.len());
        out.push(RECORD_TAG as char);
        out.push_str(&count);
        out.push(LEN_END as char);
        out.push_str(&self.body);
        out
    }

    fn push_name(&mut self, name: &str) -> Result<(), EncodeError> {
        if !self.seen.insert(name.to_string()) {
            return Err(EncodeError::DuplicateField {
                field: name.to_string(),
            });
        }
        push_len_prefixed(&mut self.body, name);
        Ok(())
    }
}

fn push_len_prefixed(out: &mut String, text: &str) {
    out.push_str(&text.len().to_string());
    out.push(LEN_END as char);
    out.push_str(text);
}

/// Encode an ordered sequence of `(name, value)` pairs.
///
/// Values are taken as bytes so callers holding raw field buffers need no
/// conversion; they must still be valid UTF-8.
///
/// ```rust
/// assert_eq!(kvbridge_core::encode([("name", "Ann")]).unwrap(), "R1:4:name=3:Ann");
/// ```
pub fn encode<I, K, V>(fields: I) -> Result<String, EncodeError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<[u8]>,
{
    let mut encoder = RecordEncoder::new();
    for (name, value) in fields {
        encoder.push_bytes(name.as_ref(), value.as_ref())?;
    }
    Ok(encoder.finish())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn next_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self
            .src
            .as_bytes()
            .get(self.pos)
            .ok_or(DecodeError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), DecodeError> {
        let offset = self.pos;
        let found = self.next_byte()?;
        if found != expected {
            return Err(DecodeError::UnexpectedByte {
                offset,
                expected: expected as char,
                found,
            });
        }
        Ok(())
    }

    /// Parse a canonical decimal number followed by `:`.
    fn length(&mut self) -> Result<usize, DecodeError> {
        let start = self.pos;
        let digits = &self.src.as_bytes()[start..];
        let digits = &digits[..digits.iter().take_while(|b| b.is_ascii_digit()).count()];
        if digits.is_empty() || (digits.len() > 1 && digits[0] == b'0') {
            return Err(DecodeError::BadLength { offset: start });
        }
        let value = digits
            .iter()
            .try_fold(0usize, |acc, d| {
                acc.checked_mul(10)?.checked_add(usize::from(d - b'0'))
            })
            .ok_or(DecodeError::BadLength { offset: start })?;
        self.pos += digits.len();
        self.expect(LEN_END)?;
        Ok(value)
    }

    fn take(&mut self, len: usize) -> Result<&'a str, DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.src.len())
            .ok_or(DecodeError::Truncated {
                offset: self.src.len(),
            })?;
        let text = self
            .src
            .get(self.pos..end)
            .ok_or(DecodeError::NotCharBoundary { offset: self.pos })?;
        self.pos = end;
        Ok(text)
    }

    fn remaining(&self) -> usize {
        self.src.len() - self.pos
    }
}

/// Decode a stored value, keeping only the requested fields.
///
/// `fields` of `None` or an empty set returns every field. Requested fields
/// missing from the record are skipped, and fields carrying the null marker
/// are never returned. The whole value is validated even when projection
/// discards most of it.
///
/// ```rust
/// use kvbridge_core::codec::{decode, FieldSet};
///
/// let wanted: FieldSet = ["a".to_string(), "z".to_string()].into();
/// let record = decode("R2:1:a=1:11:b=1:2", Some(&wanted)).unwrap();
/// assert_eq!(record.len(), 1);
/// assert_eq!(record["a"], "1");
/// ```
pub fn decode(serialized: &str, fields: Option<&FieldSet>) -> Result<Record, DecodeError> {
    let wanted = |name: &str| match fields {
        Some(set) if !set.is_empty() => set.contains(name),
        _ => true,
    };

    let mut cursor = Cursor::new(serialized);
    match cursor.next_byte() {
        Ok(RECORD_TAG) => {}
        _ => return Err(DecodeError::MissingTag),
    }
    let count = cursor.length()?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut record = Record::new();
    for _ in 0..count {
        let name_len = cursor.length()?;
        let name = cursor.take(name_len)?;
        if !seen.insert(name) {
            return Err(DecodeError::DuplicateField {
                field: name.to_string(),
            });
        }

        let offset = cursor.pos;
        let value = match cursor.next_byte()? {
            VALUE_TAG => {
                let value_len = cursor.length()?;
                Some(cursor.take(value_len)?)
            }
            NULL_TAG => None,
            found => {
                return Err(DecodeError::UnexpectedByte {
                    offset,
                    expected: VALUE_TAG as char,
                    found,
                })
            }
        };

        if let Some(value) = value {
            if wanted(name) {
                record.insert(name.to_string(), value.to_string());
            }
        }
    }

    if cursor.remaining() > 0 {
        return Err(DecodeError::TrailingData {
            remaining: cursor.remaining(),
        });
    }
    Ok(record)
}
