//! Definition payload decoding.
//!
//! A payload is an ordered list of typed segments. Its layout is fixed per
//! dictionary and chosen once when the dictionary is opened:
//!
//! - [`PayloadLayout::Sequence`]: `sametypesequence` names the tags, so no tag
//!   bytes are stored. Every segment but the last is `\0`-terminated (text) or
//!   prefixed with a 32-bit big-endian length (binary). The last segment runs
//!   to the end of the payload.
//! - [`PayloadLayout::Tagged`]: each segment starts with its tag byte, followed
//!   by terminated text or length-prefixed binary data.

use encoding_rs::Encoding;
use log::trace;

use crate::stardict::types::error::{StardictError, Result};
use crate::stardict::types::models::{EntryType, Segment, SegmentContent};
use crate::stardict::utils;

/// How payloads of one dictionary are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadLayout {
    Sequence(Vec<EntryType>),
    Tagged,
}

impl PayloadLayout {
    pub fn from_same_type_sequence(sequence: Option<&[EntryType]>) -> Self {
        match sequence {
            Some(types) => PayloadLayout::Sequence(types.to_vec()),
            None => PayloadLayout::Tagged,
        }
    }

    /// Splits `payload` into typed segments.
    pub fn decode(&self, payload: &[u8], encoding: &'static Encoding) -> Result<Vec<Segment>> {
        trace!("Decoding {} byte payload with {:?} layout", payload.len(), self);
        match self {
            PayloadLayout::Sequence(types) => decode_sequence(payload, types, encoding),
            PayloadLayout::Tagged => decode_tagged(payload, encoding),
        }
    }
}

fn decode_sequence(
    payload: &[u8],
    types: &[EntryType],
    encoding: &'static Encoding,
) -> Result<Vec<Segment>> {
    let mut reader = payload;
    let mut segments = Vec::with_capacity(types.len());

    for (i, &entry_type) in types.iter().enumerate() {
        let content = if i + 1 == types.len() {
            read_trailing_segment(&mut reader, entry_type, encoding)?
        } else {
            read_segment(&mut reader, entry_type, encoding)?
        };
        segments.push(Segment {
            entry_type,
            content,
        });
    }
    Ok(segments)
}

fn decode_tagged(payload: &[u8], encoding: &'static Encoding) -> Result<Vec<Segment>> {
    let mut reader = payload;
    let mut segments = Vec::new();

    while let Some((&tag, rest)) = reader.split_first() {
        reader = rest;
        let entry_type = EntryType::try_from(char::from(tag))?;
        let content = read_segment(&mut reader, entry_type, encoding)?;
        segments.push(Segment {
            entry_type,
            content,
        });
    }
    Ok(segments)
}

/// Reads a delimited segment: terminated text or length-prefixed binary.
fn read_segment(
    reader: &mut &[u8],
    entry_type: EntryType,
    encoding: &'static Encoding,
) -> Result<SegmentContent> {
    if entry_type.is_binary() {
        let size = utils::read_u32(reader).map_err(|_| {
            StardictError::InvalidFormat(format!(
                "Missing size of '{}' segment",
                entry_type.tag()
            ))
        })? as usize;
        if reader.len() < size {
            return Err(StardictError::InvalidFormat(format!(
                "'{}' segment declares {} bytes but only {} remain",
                entry_type.tag(),
                size,
                reader.len()
            )));
        }
        let (data, rest) = reader.split_at(size);
        *reader = rest;
        Ok(SegmentContent::Binary(data.to_vec()))
    } else {
        let text = utils::take_null_terminated(reader).ok_or_else(|| {
            StardictError::InvalidFormat(format!(
                "Missing terminator of '{}' segment",
                entry_type.tag()
            ))
        })?;
        Ok(SegmentContent::Text(utils::decode_text(text, encoding)?))
    }
}

/// Reads the last segment of a `sametypesequence` payload, which has no
/// terminator or size prefix.
fn read_trailing_segment(
    reader: &mut &[u8],
    entry_type: EntryType,
    encoding: &'static Encoding,
) -> Result<SegmentContent> {
    let data = std::mem::take(reader);
    if entry_type.is_binary() {
        Ok(SegmentContent::Binary(data.to_vec()))
    } else {
        // Some builders terminate the last text segment anyway.
        let text = data.strip_suffix(b"\0").unwrap_or(data);
        Ok(SegmentContent::Text(utils::decode_text(text, encoding)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;

    fn text(entry_type: EntryType, s: &str) -> Segment {
        Segment {
            entry_type,
            content: SegmentContent::Text(s.to_string()),
        }
    }

    #[test]
    fn sequence_last_segment_runs_to_end() {
        let layout = PayloadLayout::Sequence(vec![EntryType::Phonetic, EntryType::Meaning]);
        let segments = layout.decode(b"ha-lo\0a greeting", UTF_8).unwrap();
        assert_eq!(
            segments,
            vec![
                text(EntryType::Phonetic, "ha-lo"),
                text(EntryType::Meaning, "a greeting"),
            ]
        );
    }

    #[test]
    fn sequence_binary_segment_is_length_prefixed() {
        let layout = PayloadLayout::Sequence(vec![EntryType::Picture, EntryType::Meaning]);
        let mut payload = 3u32.to_be_bytes().to_vec();
        payload.extend_from_slice(&[1, 0, 2]);
        payload.extend_from_slice(b"caption\0");

        let segments = layout.decode(&payload, UTF_8).unwrap();
        assert_eq!(segments[0].content, SegmentContent::Binary(vec![1, 0, 2]));
        assert_eq!(segments[1], text(EntryType::Meaning, "caption"));
    }

    #[test]
    fn sequence_trailing_binary_segment_has_no_size_prefix() {
        let layout = PayloadLayout::Sequence(vec![EntryType::Meaning, EntryType::Picture]);
        let mut payload = b"a photo\0".to_vec();
        payload.extend_from_slice(&[0x89, b'P', b'N', b'G', 0]);

        let segments = layout.decode(&payload, UTF_8).unwrap();
        assert_eq!(segments[0], text(EntryType::Meaning, "a photo"));
        assert_eq!(segments[1].entry_type, EntryType::Picture);
        assert_eq!(
            segments[1].content,
            SegmentContent::Binary(vec![0x89, b'P', b'N', b'G', 0])
        );
    }

    #[test]
    fn tagged_segments_carry_their_own_tags() {
        let mut payload = b"mfirst\0".to_vec();
        payload.push(b'W');
        payload.extend_from_slice(&2u32.to_be_bytes());
        payload.extend_from_slice(&[9, 9]);
        payload.extend_from_slice(b"h<b>x</b>\0");

        let segments = PayloadLayout::Tagged.decode(&payload, UTF_8).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], text(EntryType::Meaning, "first"));
        assert_eq!(segments[1].entry_type, EntryType::Wav);
        assert_eq!(segments[1].content, SegmentContent::Binary(vec![9, 9]));
        assert_eq!(segments[2], text(EntryType::Html, "<b>x</b>"));
    }

    #[test]
    fn malformed_boundaries_are_format_errors() {
        let seq = PayloadLayout::Sequence(vec![EntryType::Phonetic, EntryType::Meaning]);
        assert!(matches!(seq.decode(b"no terminator", UTF_8), Err(StardictError::InvalidFormat(_))));

        let tagged = PayloadLayout::Tagged;
        assert!(matches!(tagged.decode(b"munterminated", UTF_8), Err(StardictError::InvalidFormat(_))));
        assert!(matches!(tagged.decode(b"qtext\0", UTF_8), Err(StardictError::InvalidFormat(_))));

        let mut short = vec![b'P'];
        short.extend_from_slice(&10u32.to_be_bytes());
        short.extend_from_slice(&[1, 2]);
        assert!(matches!(tagged.decode(&short, UTF_8), Err(StardictError::InvalidFormat(_))));

        assert!(matches!(tagged.decode(b"m\xff\0", UTF_8), Err(StardictError::InvalidFormat(_))));
    }
}
