//! Integration tests for DEF sprite files built in memory.

mod common;

use common::{build_def, ramp_palette, DefFrame};
use h3_assets::def::{DefFile, DefKind, FrameRect};
use h3_assets::materialize::materialize;
use h3_assets::DecodeError;

fn creature_def() -> Vec<u8> {
    build_def(
        0x42,
        &[
            (
                0,
                vec![
                    DefFrame::filled("move0.pcx", 4, 3, 20),
                    DefFrame::filled("move1.pcx", 4, 3, 21),
                    DefFrame::filled("move2.pcx", 4, 3, 22),
                ],
            ),
            (2, vec![DefFrame::filled("idle0.pcx", 4, 3, 30)]),
        ],
    )
}

#[test]
fn test_parse_blocks_and_frames() {
    let def = DefFile::parse(&creature_def()).unwrap();

    assert_eq!(def.kind, DefKind::Creature);
    assert_eq!((def.width, def.height), (4, 3));
    assert_eq!(def.blocks.len(), 2);
    assert_eq!(def.blocks[0].frames.len(), 3);
    assert_eq!(def.block(2).unwrap().frames[0].file_name, "idle0.pcx");
    assert_eq!(def.frame_count(), 4);

    for frame in def.frames() {
        assert_eq!(frame.pixel_data.len(), (frame.width * frame.height) as usize);
        assert_eq!(
            frame.rect,
            FrameRect {
                x: 0,
                y: 0,
                width: 4,
                height: 3
            }
        );
    }
    assert_eq!(def.frame(3).unwrap().pixel_data, vec![30; 12]);
}

#[test]
fn test_palette_is_shared() {
    let def = DefFile::parse(&creature_def()).unwrap();
    let expected = h3_assets::Palette::parse(&ramp_palette()).unwrap();
    assert_eq!(def.palette, expected);
}

#[test]
fn test_declared_blocks_exceed_data() {
    let mut data = build_def(0x42, &[(0, vec![DefFrame::filled("only.pcx", 2, 2, 9)])]);
    data[12..16].copy_from_slice(&2u32.to_le_bytes());

    assert!(matches!(
        DefFile::parse(&data),
        Err(DecodeError::TruncatedInput { .. })
    ));
}

#[test]
fn test_frame_offset_past_end() {
    let mut data = build_def(0x42, &[(0, vec![DefFrame::filled("a.pcx", 2, 2, 9)])]);
    let offset_field = 16 + 768 + 16 + 13;
    data[offset_field..offset_field + 4].copy_from_slice(&0xFFFF_0000u32.to_le_bytes());

    assert!(matches!(
        DefFile::parse(&data),
        Err(DecodeError::TruncatedInput { .. })
    ));
}

#[test]
fn test_frame_to_image_applies_sprite_keys() {
    let mut frame = DefFrame::filled("keys.pcx", 3, 1, 0);
    frame.indices = vec![0, 4, 200];
    let def = DefFile::parse(&build_def(0x43, &[(0, vec![frame])])).unwrap();

    let pixels = def.frame(0).unwrap().to_pixels(&def.palette).unwrap();
    assert_eq!(pixels.pixels(), &[0x0000_0000, 0x0000_0080, 0xC837_64FF]);

    let image = materialize(&pixels).unwrap();
    assert_eq!(image.dimensions(), (3, 1));
    assert_eq!(image.get_pixel(2, 0).0, [200, 55, 100, 255]);
}

#[test]
fn test_compressed_frame() {
    let mut data = build_def(0x45, &[(0, vec![DefFrame::filled("tile.pcx", 4, 2, 0)])]);

    // Replace the raw payload with two encoding-1 rows
    let header = data.len() - 8 - 32;
    data.truncate(header + 32);
    let mut payload = Vec::new();
    payload.extend_from_slice(&8u32.to_le_bytes());
    payload.extend_from_slice(&10u32.to_le_bytes());
    payload.extend_from_slice(&[0x05, 0x03]);
    payload.extend_from_slice(&[0xFF, 0x03, 1, 2, 3, 4]);
    data[header..header + 4].copy_from_slice(&(payload.len() as u32).to_le_bytes());
    data[header + 4..header + 8].copy_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&payload);

    let def = DefFile::parse(&data).unwrap();
    assert_eq!(def.frame(0).unwrap().pixel_data, vec![5, 5, 5, 5, 1, 2, 3, 4]);
}

/// Header of the only frame in a one-block, one-frame DEF.
const FIRST_FRAME: usize = 784 + 16 + 13 + 4;

fn patch_u32(data: &mut [u8], at: usize, value: u32) {
    data[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn test_huge_canvas_is_rejected() {
    let mut data = build_def(0x43, &[(0, vec![DefFrame::filled("a.pcx", 2, 2, 9)])]);
    patch_u32(&mut data, FIRST_FRAME + 0x08, u32::MAX);
    patch_u32(&mut data, FIRST_FRAME + 0x0C, u32::MAX);

    assert!(matches!(
        DefFile::parse(&data),
        Err(DecodeError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_huge_content_is_rejected() {
    let mut data = build_def(0x43, &[(0, vec![DefFrame::filled("a.pcx", 2, 2, 9)])]);
    patch_u32(&mut data, FIRST_FRAME + 0x10, u32::MAX);
    patch_u32(&mut data, FIRST_FRAME + 0x14, u32::MAX);

    assert!(matches!(
        DefFile::parse(&data),
        Err(DecodeError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_huge_frame_count_is_rejected() {
    let mut data = build_def(0x43, &[(0, vec![DefFrame::filled("a.pcx", 2, 2, 9)])]);
    patch_u32(&mut data, 784 + 4, u32::MAX);

    assert!(matches!(
        DefFile::parse(&data),
        Err(DecodeError::TruncatedInput { .. })
    ));
}

#[test]
fn test_row_offset_past_payload() {
    let mut data = build_def(0x45, &[(0, vec![DefFrame::filled("tile.pcx", 4, 2, 0)])]);

    // Encoding-1 frame whose first row table entry points nowhere
    data.truncate(FIRST_FRAME + 32);
    let mut payload = Vec::new();
    payload.extend_from_slice(&u32::MAX.to_le_bytes());
    payload.extend_from_slice(&8u32.to_le_bytes());
    payload.extend_from_slice(&[0x05, 0x03]);
    patch_u32(&mut data, FIRST_FRAME, payload.len() as u32);
    patch_u32(&mut data, FIRST_FRAME + 0x04, 1);
    data.extend_from_slice(&payload);

    assert!(matches!(
        DefFile::parse(&data),
        Err(DecodeError::TruncatedInput { .. })
    ));
}
