//! Low-level byte reading utilities

use byteorder::{BigEndian, ReadBytesExt};
use encoding_rs::Encoding;

use super::types::error::{StardictError, Result};

/// Read a 4 or 8 byte big-endian number.
///
/// Used for `.idx` offsets, whose width depends on `idxoffsetbits`.
pub fn read_number(reader: &mut &[u8], number_width: usize) -> Result<u64> {
    let value = match number_width {
        8 => reader.read_u64::<BigEndian>(),
        4 => reader.read_u32::<BigEndian>().map(u64::from),
        _ => {
            return Err(StardictError::InvalidFormat(format!(
                "Invalid number width: {}",
                number_width
            )));
        }
    };
    value.map_err(|_| truncated(number_width))
}

/// Read a 4 byte big-endian number (sizes, synonym positions, binary segment lengths).
pub fn read_u32(reader: &mut &[u8]) -> Result<u32> {
    reader.read_u32::<BigEndian>().map_err(|_| truncated(4))
}

fn truncated(width: usize) -> StardictError {
    StardictError::InvalidFormat(format!("Truncated {}-byte number field", width))
}

/// Splits off bytes up to the next `\0` and advances past the terminator.
///
/// Returns `None` when no terminator remains, leaving the slice untouched.
pub fn take_null_terminated<'a>(reader: &mut &'a [u8]) -> Option<&'a [u8]> {
    let end_pos = reader.iter().position(|&byte| byte == 0)?;
    let text = &reader[..end_pos];
    *reader = &reader[end_pos + 1..];
    Some(text)
}

/// Decodes text strictly: malformed sequences are an error rather than U+FFFD.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            StardictError::InvalidFormat(format!("Text is not valid {}", encoding.name()))
        })
}

/// Resolves an encoding label such as `"utf-8"` or `"gbk"`.
pub fn parse_encoding(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}
