use bytes::Bytes;

use crate::codec::CompletedFrame;
use crate::error::ParseError;

/// One `LABEL VALUE CHECKSUM` group split out of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedGroup {
    pub label: String,
    pub value: String,
    /// The last byte of the frame as transmitted.
    pub checksum: u8,
    frame: Bytes,
}

impl DecodedGroup {
    /// The full frame bytes the checksum is computed over.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }
}

/// Split a frame into label, value and checksum character.
///
/// The label ends at the first ASCII whitespace and the value at the next
/// one. The checksum is the final byte of the frame regardless of what lies
/// between the value and the end of the line.
pub fn decode(frame: &CompletedFrame) -> Result<DecodedGroup, ParseError> {
    let bytes = frame.as_bytes();

    let label_end = find_separator(bytes).ok_or(ParseError::NoSeparator)?;
    let rest = &bytes[label_end + 1..];
    let value_end = find_separator(rest).ok_or(ParseError::NoSeparator)?;

    let label = std::str::from_utf8(&bytes[..label_end]).map_err(|_| ParseError::InvalidUtf8)?;
    let value = std::str::from_utf8(&rest[..value_end]).map_err(|_| ParseError::InvalidUtf8)?;
    let checksum = bytes[bytes.len() - 1];

    Ok(DecodedGroup {
        label: label.to_owned(),
        value: value.to_owned(),
        checksum,
        frame: frame.clone().into_bytes(),
    })
}

fn find_separator(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(u8::is_ascii_whitespace)
}
