//! Block-header format descriptor
//!
//! Compiles the textual field grammar `<[u|s]{8|16|32|64}[:type]>` into an
//! immutable ordered field list. Types: `sec`, `usec`, `nsec`, `length`, a
//! hexadecimal magic literal (`0x...`), or empty meaning "any value".

use regex::Regex;

use super::errors::{FormatError, FormatResult};

/// Semantic meaning of a header field during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unix timestamp in seconds, accepted within ±48 hours of now
    Seconds,
    /// Sub-second microseconds, 0..=999_999
    Microseconds,
    /// Sub-second nanoseconds, 0..=999_999_999
    Nanoseconds,
    /// Payload length in bytes, 0..=max_block_size
    Length,
    /// Constant that must match exactly
    Magic(u64),
    /// Any value is accepted
    Ignore,
}

/// Byte order for multi-byte fields (8-bit fields are order-independent)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

/// One field of a block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    /// Field width in bits: 8, 16, 32 or 64
    pub width_bits: u32,
    /// Validation semantics
    pub kind: FieldKind,
    /// Signed interpretation: the raw value is sign-extended before range
    /// checks (magic comparison stays on the raw bits)
    pub signed: bool,
}

impl HeaderField {
    /// Field width in bytes
    pub fn width_bytes(&self) -> usize {
        (self.width_bits / 8) as usize
    }
}

/// Compiled block-header format: ordered fields plus derived metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFormat {
    fields: Vec<HeaderField>,
    total_bytes: usize,
    length_index: Option<usize>,
    byte_order: ByteOrder,
}

impl BlockFormat {
    /// Compiles a format string into a `BlockFormat`.
    ///
    /// Fields are adjacent in the byte stream, in declaration order.
    /// At most one field may be typed `length`.
    ///
    /// # Errors
    ///
    /// Returns a `FormatError` when the string contains no recognizable
    /// tokens, a width outside {8, 16, 32, 64}, an unknown type keyword,
    /// a malformed hex magic literal, or a second `length` field.
    pub fn parse(spec: &str, byte_order: ByteOrder) -> FormatResult<Self> {
        let token = Regex::new(r"<([us])(\d+)(?::([^>]+))?>").expect("static pattern compiles");

        let mut fields = Vec::new();
        let mut total_bytes = 0usize;
        let mut length_index = None;

        for caps in token.captures_iter(spec) {
            let signed = &caps[1] == "s";

            let width_str = &caps[2];
            let width_bits: u32 = width_str
                .parse()
                .map_err(|_| FormatError::InvalidWidth(width_str.to_string()))?;
            if !matches!(width_bits, 8 | 16 | 32 | 64) {
                return Err(FormatError::InvalidWidth(width_str.to_string()));
            }

            let kind = match caps.get(3).map(|m| m.as_str()) {
                None | Some("") => FieldKind::Ignore,
                Some("sec") => FieldKind::Seconds,
                Some("usec") => FieldKind::Microseconds,
                Some("nsec") => FieldKind::Nanoseconds,
                Some("length") => {
                    if length_index.is_some() {
                        return Err(FormatError::DuplicateLength);
                    }
                    length_index = Some(fields.len());
                    FieldKind::Length
                }
                Some(hex) if hex.starts_with("0x") => {
                    let value = u64::from_str_radix(&hex[2..], 16)
                        .map_err(|_| FormatError::InvalidMagic(hex.to_string()))?;
                    FieldKind::Magic(value)
                }
                Some(other) => return Err(FormatError::UnknownType(other.to_string())),
            };

            let field = HeaderField {
                width_bits,
                kind,
                signed,
            };
            total_bytes += field.width_bytes();
            fields.push(field);
        }

        if fields.is_empty() {
            return Err(FormatError::NoFields(spec.to_string()));
        }

        Ok(Self {
            fields,
            total_bytes,
            length_index,
            byte_order,
        })
    }

    /// Ordered fields, as declared
    pub fn fields(&self) -> &[HeaderField] {
        &self.fields
    }

    /// Total header width in bytes; the scanner's minimum window size
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Index of the `length` field, if one was declared
    pub fn length_index(&self) -> Option<usize> {
        self.length_index
    }

    /// Configured byte order for multi-byte fields
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}
