//! Frame payload encodings used inside DEF files.
//!
//! Every frame payload starts right after its 32-byte frame header. All
//! offsets in the row tables below are relative to that payload start.
//!
//! | Id | Row table | Run encoding |
//! |----|-----------|--------------|
//! | 0 | none | `width * height` raw indices |
//! | 1 | `height` × u32 | `(code, len-1)` byte pairs; code `0xFF` = `len` literal bytes follow, else fill `len` pixels with `code` |
//! | 2 | `height` × u16 | one byte: high 3 bits code, low 5 bits `len-1`; code 7 = literal bytes follow, else fill with code |
//! | 3 | `height * width/32` × u16 | as 2, but each offset starts a 32-pixel segment |

use crate::binary::{read_bytes, read_u16_le, read_u32_le, read_u8};
use crate::error::{DecodeError, Result};

use super::MAX_FRAME_PIXELS;

/// Width of one independently addressed segment in encoding 3.
pub const SEGMENT_WIDTH: usize = 32;

/// Literal marker for encoding 1.
const LITERAL_CODE_WIDE: u8 = 0xFF;

/// Literal marker for encodings 2 and 3.
const LITERAL_CODE_PACKED: u8 = 7;

/// Payload encoding of a single DEF frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEncoding {
    /// Uncompressed indices.
    Raw,
    /// Byte-pair runs with u32 row offsets.
    WideRuns,
    /// Packed runs with u16 row offsets.
    PackedRows,
    /// Packed runs with u16 offsets per 32-pixel segment.
    PackedSegments,
}

impl FrameEncoding {
    /// Maps the on-disk encoding id.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidHeader` for ids other than 0–3.
    pub fn from_id(id: u32) -> Result<Self> {
        match id {
            0 => Ok(FrameEncoding::Raw),
            1 => Ok(FrameEncoding::WideRuns),
            2 => Ok(FrameEncoding::PackedRows),
            3 => Ok(FrameEncoding::PackedSegments),
            other => Err(DecodeError::InvalidHeader {
                reason: format!("unknown frame encoding {other}"),
            }),
        }
    }

    /// Returns the on-disk encoding id.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            FrameEncoding::Raw => 0,
            FrameEncoding::WideRuns => 1,
            FrameEncoding::PackedRows => 2,
            FrameEncoding::PackedSegments => 3,
        }
    }
}

/// Decodes a frame payload into `width * height` palette indices.
///
/// # Arguments
///
/// * `encoding` - The frame's payload encoding
/// * `payload` - Bytes from the payload start to the end of the file
/// * `size` - The payload size declared by the frame header
/// * `width`, `height` - The content rectangle size
///
/// # Errors
///
/// - `DecodeError::DimensionMismatch` if a raw payload's size is not `width * height`,
///   or the content exceeds [`MAX_FRAME_PIXELS`]
/// - `DecodeError::MalformedPixelData` if a run overflows its row or segment
/// - `DecodeError::TruncatedInput` if a table or run points past the data
pub fn decode_payload(
    encoding: FrameEncoding,
    payload: &[u8],
    size: usize,
    width: usize,
    height: usize,
) -> Result<Vec<u8>> {
    let pixel_count = width
        .checked_mul(height)
        .filter(|&count| count <= MAX_FRAME_PIXELS)
        .ok_or_else(|| DecodeError::DimensionMismatch {
            reason: format!("frame content {width}x{height} is too large"),
        })?;

    match encoding {
        FrameEncoding::Raw => {
            if size != pixel_count {
                return Err(DecodeError::DimensionMismatch {
                    reason: format!(
                        "raw frame holds {size} bytes, {width}x{height} needs {pixel_count}"
                    ),
                });
            }
            Ok(read_bytes(payload, 0, pixel_count)?.to_vec())
        }
        FrameEncoding::WideRuns => {
            let mut out = Vec::with_capacity(pixel_count);
            for row in 0..height {
                let start = read_u32_le(payload, row * 4)? as usize;
                decode_wide_runs(payload, start, width, &mut out)?;
            }
            Ok(out)
        }
        FrameEncoding::PackedRows => {
            let mut out = Vec::with_capacity(pixel_count);
            for row in 0..height {
                let start = usize::from(read_u16_le(payload, row * 2)?);
                decode_packed_runs(payload, start, width, &mut out)?;
            }
            Ok(out)
        }
        FrameEncoding::PackedSegments => {
            if width % SEGMENT_WIDTH != 0 {
                return Err(DecodeError::DimensionMismatch {
                    reason: format!("segmented frame width {width} is not a multiple of 32"),
                });
            }

            let segments = pixel_count / SEGMENT_WIDTH;
            let mut out = Vec::with_capacity(pixel_count);
            for segment in 0..segments {
                let start = usize::from(read_u16_le(payload, segment * 2)?);
                decode_packed_runs(payload, start, SEGMENT_WIDTH, &mut out)?;
            }
            Ok(out)
        }
    }
}

fn overflow(filled: usize, len: usize, span: usize) -> DecodeError {
    DecodeError::MalformedPixelData {
        reason: format!("run of {len} pixels at {filled} overflows span of {span}"),
    }
}

/// Decodes encoding-1 runs until `span` pixels are produced.
fn decode_wide_runs(data: &[u8], mut pos: usize, span: usize, out: &mut Vec<u8>) -> Result<()> {
    let mut filled = 0;

    while filled < span {
        let code = read_u8(data, pos)?;
        let len = usize::from(read_u8(data, pos + 1)?) + 1;
        pos += 2;

        if filled + len > span {
            return Err(overflow(filled, len, span));
        }

        if code == LITERAL_CODE_WIDE {
            out.extend_from_slice(read_bytes(data, pos, len)?);
            pos += len;
        } else {
            out.resize(out.len() + len, code);
        }
        filled += len;
    }

    Ok(())
}

/// Decodes encoding-2/3 runs until `span` pixels are produced.
fn decode_packed_runs(data: &[u8], mut pos: usize, span: usize, out: &mut Vec<u8>) -> Result<()> {
    let mut filled = 0;

    while filled < span {
        let segment = read_u8(data, pos)?;
        let code = segment >> 5;
        let len = usize::from(segment & 0x1F) + 1;
        pos += 1;

        if filled + len > span {
            return Err(overflow(filled, len, span));
        }

        if code == LITERAL_CODE_PACKED {
            out.extend_from_slice(read_bytes(data, pos, len)?);
            pos += len;
        } else {
            out.resize(out.len() + len, code);
        }
        filled += len;
    }

    Ok(())
}
