//! Block boundary scanner
//!
//! Validates candidate record headers against a compiled `BlockFormat` and
//! searches byte windows for the first offset holding a valid header. Both
//! functions are pure; the rotation engine supplies the clock.

use super::format::{BlockFormat, ByteOrder, FieldKind, HeaderField};

/// Clock-skew tolerance for `sec` fields: ±48 hours
const SECONDS_TOLERANCE: i64 = 48 * 3600;

/// Validates a candidate block header at the start of `window`.
///
/// Fields are read strictly in declared order, consuming `width/8` bytes
/// each; multi-byte values are interpreted per the format's byte order.
/// Returns the declared payload length on success (0 when the format has no
/// `length` field), or `None` as soon as any field fails validation.
pub fn validate(
    window: &[u8],
    format: &BlockFormat,
    max_block_size: usize,
    now: i64,
) -> Option<usize> {
    if window.len() < format.total_bytes() {
        return None;
    }

    let mut payload_len = 0usize;
    let mut offset = 0usize;

    for field in format.fields() {
        let raw = read_value(&window[offset..], field, format.byte_order());
        offset += field.width_bytes();

        match field.kind {
            FieldKind::Seconds => {
                let secs = if field.signed {
                    sign_extend(raw, field.width_bits)
                } else {
                    i64::try_from(raw).ok()?
                };
                let skew = secs.checked_sub(now)?;
                if skew.unsigned_abs() > SECONDS_TOLERANCE as u64 {
                    return None;
                }
            }
            FieldKind::Microseconds => {
                if is_negative(raw, field) || raw > 999_999 {
                    return None;
                }
            }
            FieldKind::Nanoseconds => {
                if is_negative(raw, field) || raw > 999_999_999 {
                    return None;
                }
            }
            FieldKind::Length => {
                if is_negative(raw, field) || raw > max_block_size as u64 {
                    return None;
                }
                payload_len = raw as usize;
            }
            FieldKind::Magic(expected) => {
                // Magic comparison is over the raw bits, never sign-extended.
                if raw != expected {
                    return None;
                }
            }
            FieldKind::Ignore => {}
        }
    }

    Some(payload_len)
}

/// Scans `buffer` for the first offset holding a valid block header.
///
/// Candidate offsets `0..=len - total_bytes` are tried in increasing order.
/// Returns `(offset, payload_len)` for the first success, or `None` when no
/// offset in this window validates (a soft failure for the caller).
pub fn find_boundary(
    buffer: &[u8],
    format: &BlockFormat,
    max_block_size: usize,
    now: i64,
) -> Option<(usize, usize)> {
    if buffer.len() < format.total_bytes() {
        return None;
    }

    (0..=buffer.len() - format.total_bytes()).find_map(|offset| {
        validate(&buffer[offset..], format, max_block_size, now)
            .map(|payload_len| (offset, payload_len))
    })
}

/// Reads one field's raw value, unsigned, per the configured byte order.
/// 8-bit fields are order-independent.
fn read_value(bytes: &[u8], field: &HeaderField, order: ByteOrder) -> u64 {
    match field.width_bits {
        8 => u64::from(bytes[0]),
        16 => {
            let raw = [bytes[0], bytes[1]];
            match order {
                ByteOrder::Little => u64::from(u16::from_le_bytes(raw)),
                ByteOrder::Big => u64::from(u16::from_be_bytes(raw)),
            }
        }
        32 => {
            let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
            match order {
                ByteOrder::Little => u64::from(u32::from_le_bytes(raw)),
                ByteOrder::Big => u64::from(u32::from_be_bytes(raw)),
            }
        }
        _ => {
            let raw = [
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ];
            match order {
                ByteOrder::Little => u64::from_le_bytes(raw),
                ByteOrder::Big => u64::from_be_bytes(raw),
            }
        }
    }
}

/// Sign-extends a raw value of the given width to i64
fn sign_extend(raw: u64, width_bits: u32) -> i64 {
    match width_bits {
        8 => raw as u8 as i8 as i64,
        16 => raw as u16 as i16 as i64,
        32 => raw as u32 as i32 as i64,
        _ => raw as i64,
    }
}

/// True when a signed field holds a negative value
fn is_negative(raw: u64, field: &HeaderField) -> bool {
    field.signed && sign_extend(raw, field.width_bits) < 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const MAX_BLOCK: usize = 262_144;

    fn pcap_format() -> BlockFormat {
        BlockFormat::parse("<u32:sec><u32:usec><u32:length><u32>", ByteOrder::Little).unwrap()
    }

    fn pcap_header(sec: u32, usec: u32, length: u32) -> Vec<u8> {
        let mut header = Vec::with_capacity(16);
        header.extend_from_slice(&sec.to_le_bytes());
        header.extend_from_slice(&usec.to_le_bytes());
        header.extend_from_slice(&length.to_le_bytes());
        header.extend_from_slice(&0u32.to_le_bytes());
        header
    }

    #[test]
    fn accepts_well_formed_header() {
        let header = pcap_header(NOW as u32, 500_000, 1024);
        assert_eq!(
            validate(&header, &pcap_format(), MAX_BLOCK, NOW),
            Some(1024)
        );
    }

    #[test]
    fn rejects_stale_seconds() {
        // Everything else well-formed, but sec is far outside ±48h.
        let header = pcap_header((NOW - 49 * 3600 - 1) as u32, 0, 64);
        assert_eq!(validate(&header, &pcap_format(), MAX_BLOCK, NOW), None);

        let header = pcap_header((NOW + 49 * 3600) as u32, 0, 64);
        assert_eq!(validate(&header, &pcap_format(), MAX_BLOCK, NOW), None);
    }

    #[test]
    fn accepts_seconds_at_tolerance_edge() {
        let header = pcap_header((NOW - 48 * 3600) as u32, 0, 0);
        assert_eq!(validate(&header, &pcap_format(), MAX_BLOCK, NOW), Some(0));
    }

    #[test]
    fn rejects_out_of_range_subseconds() {
        let header = pcap_header(NOW as u32, 1_000_000, 64);
        assert_eq!(validate(&header, &pcap_format(), MAX_BLOCK, NOW), None);

        let format = BlockFormat::parse("<u32:nsec>", ByteOrder::Little).unwrap();
        let bytes = 1_000_000_000u32.to_le_bytes();
        assert_eq!(validate(&bytes, &format, MAX_BLOCK, NOW), None);
        let bytes = 999_999_999u32.to_le_bytes();
        assert_eq!(validate(&bytes, &format, MAX_BLOCK, NOW), Some(0));
    }

    #[test]
    fn rejects_oversized_length() {
        let header = pcap_header(NOW as u32, 0, MAX_BLOCK as u32 + 1);
        assert_eq!(validate(&header, &pcap_format(), MAX_BLOCK, NOW), None);
    }

    #[test]
    fn magic_must_match_exactly() {
        let format = BlockFormat::parse("<u8:0xAA><u8:0xBB><u16:length>", ByteOrder::Big).unwrap();

        assert_eq!(validate(&[0xAA, 0xBB, 0x00, 0x10], &format, MAX_BLOCK, NOW), Some(16));
        assert_eq!(validate(&[0xAA, 0xBC, 0x00, 0x10], &format, MAX_BLOCK, NOW), None);
    }

    #[test]
    fn big_endian_multibyte_fields() {
        let format = BlockFormat::parse("<u16:length>", ByteOrder::Big).unwrap();
        assert_eq!(validate(&[0x01, 0x00], &format, MAX_BLOCK, NOW), Some(256));

        let format = BlockFormat::parse("<u16:length>", ByteOrder::Little).unwrap();
        assert_eq!(validate(&[0x01, 0x00], &format, MAX_BLOCK, NOW), Some(1));
    }

    #[test]
    fn signed_negative_fails_range_checks() {
        let format = BlockFormat::parse("<s16:length>", ByteOrder::Little).unwrap();
        let bytes = (-1i16).to_le_bytes();
        assert_eq!(validate(&bytes, &format, MAX_BLOCK, NOW), None);
    }

    #[test]
    fn signed_seconds_use_signed_arithmetic() {
        // A signed 32-bit sec field within the window validates.
        let format = BlockFormat::parse("<s32:sec>", ByteOrder::Little).unwrap();
        let bytes = ((NOW - 3600) as i32).to_le_bytes();
        assert_eq!(validate(&bytes, &format, MAX_BLOCK, NOW), Some(0));
    }

    #[test]
    fn window_shorter_than_header_fails() {
        let header = pcap_header(NOW as u32, 0, 0);
        assert_eq!(validate(&header[..15], &pcap_format(), MAX_BLOCK, NOW), None);
    }

    #[test]
    fn no_length_field_yields_zero() {
        let format = BlockFormat::parse("<u8:0xFF><u8>", ByteOrder::Little).unwrap();
        assert_eq!(validate(&[0xFF, 0x42], &format, MAX_BLOCK, NOW), Some(0));
    }

    #[test]
    fn find_boundary_skips_leading_garbage() {
        let mut buffer = vec![0xFFu8; 7];
        buffer.extend_from_slice(&pcap_header(NOW as u32, 123, 99));

        let found = find_boundary(&buffer, &pcap_format(), MAX_BLOCK, NOW);
        assert_eq!(found, Some((7, 99)));
    }

    #[test]
    fn find_boundary_reports_soft_failure() {
        let buffer = vec![0xFFu8; 64];
        assert_eq!(find_boundary(&buffer, &pcap_format(), MAX_BLOCK, NOW), None);
        // Buffer shorter than one header can never match.
        assert_eq!(find_boundary(&[0u8; 4], &pcap_format(), MAX_BLOCK, NOW), None);
    }
}
