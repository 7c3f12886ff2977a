//! Enedis TeleInfo checksum.
//!
//! Sum the payload bytes modulo 256, keep the low six bits and add `0x20`
//! so the result is always a printable character.

use crate::error::{FrameError, Result};
use crate::group::DecodedGroup;

const LOW_SIX_BITS: u8 = 0x3F;
const PRINTABLE_OFFSET: u8 = 0x20;

/// Checksum of `payload` (the frame without its last separator and checksum).
pub fn compute(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    (sum & LOW_SIX_BITS) + PRINTABLE_OFFSET
}

/// Check a whole frame against its transmitted checksum character.
///
/// The last two bytes of `frame` (separator and checksum) are excluded from
/// the sum.
pub fn validate(frame: &[u8], checksum: u8) -> bool {
    compute(payload_of(frame)) == checksum
}

/// Like [`validate`], reporting both values on mismatch.
pub fn verify(group: &DecodedGroup) -> Result<()> {
    let computed = compute(payload_of(group.frame()));
    if computed == group.checksum {
        Ok(())
    } else {
        Err(FrameError::ChecksumMismatch {
            received: group.checksum,
            computed,
        })
    }
}

fn payload_of(frame: &[u8]) -> &[u8] {
    &frame[..frame.len().saturating_sub(2)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CompletedFrame;
    use crate::group::decode;

    #[test]
    fn reference_vector() {
        assert_eq!(compute(b"ADCO 031234567890"), b'G');
        assert!(validate(b"ADCO 031234567890 G", b'G'));
    }

    #[test]
    fn known_meter_groups() {
        assert_eq!(compute(b"IINST 23"), b',');
        assert_eq!(compute(b"PAPP 01250"), b')');
        assert_eq!(compute(b"OPTARIF BASE"), b'0');
        assert_eq!(compute(b"HCHC 001234567"), b'"');
    }

    #[test]
    fn result_is_always_printable() {
        for byte in 0u8..=255 {
            let sum = compute(&[byte, byte, byte]);
            assert!((0x20..=0x5F).contains(&sum));
        }
    }

    #[test]
    fn wraps_modulo_256() {
        // 0xFF + 0x02 wraps to 0x01.
        assert_eq!(compute(&[0xFF, 0x02]), 0x01 + 0x20);
    }

    #[test]
    fn corrupted_payload_fails() {
        assert!(!validate(b"ADCO 031234567891 G", b'G'));
        assert!(!validate(b"ADCO 131234567890 G", b'G'));
        assert!(!validate(b"ADCP 031234567890 G", b'G'));
        assert!(!validate(b"ADCO 031234567890 O", b'O'));
    }

    #[test]
    fn short_frames_do_not_panic() {
        assert!(validate(b"", b' '));
        assert!(validate(b"A", b' '));
        assert!(!validate(b"AB", b'!'));
    }

    #[test]
    fn verify_reports_both_values() {
        let group = decode(&CompletedFrame::from("IINST 24 ,")).unwrap();
        match verify(&group) {
            Err(FrameError::ChecksumMismatch { received, computed }) => {
                assert_eq!(received, b',');
                assert_eq!(computed, b'-');
            }
            other => panic!("expected mismatch, got {other:?}"),
        }

        let group = decode(&CompletedFrame::from("IINST 23 ,")).unwrap();
        assert!(verify(&group).is_ok());
    }
}
