#![cfg(all(feature = "bmp", feature = "png"))]

use enough::Unstoppable;
use rastercodec::png::{
    FILTERS, FilterStrategy, FilterType, PNG_SIGNATURE, PngCompression, PngDecoder, TextProperty,
};
use rastercodec::{Color, DecodeRequest, EncodeRequest, ImageInfo, PixelBuffer, RasterError};

fn checkerboard(w: u32, h: u32) -> PixelBuffer {
    let mut pixels = PixelBuffer::new(w, h).unwrap();
    for y in 0..h {
        for x in 0..w {
            let color = if (x + y) % 2 == 0 {
                Color::rgb(255, 0, 128)
            } else {
                Color::rgb(0, 200, 50)
            };
            pixels.set(x, y, color);
        }
    }
    pixels
}

fn gradient(w: u32, h: u32, alpha: bool) -> PixelBuffer {
    let mut pixels = PixelBuffer::new(w, h).unwrap();
    for y in 0..h {
        for x in 0..w {
            let a = if alpha { (x * 255 / w.max(1)) as u8 } else { 255 };
            pixels.set(x, y, Color::new((x * 9) as u8, (y * 13) as u8, (x + y) as u8, a));
        }
    }
    pixels
}

// ── BMP ──────────────────────────────────────────────────────────────

#[test]
fn bmp_roundtrip_opaque_is_24bit() {
    let pixels = gradient(5, 3, false);
    let encoded = EncodeRequest::bmp().encode(&pixels, Unstoppable).unwrap();
    assert_eq!(&encoded[0..2], b"BM");
    assert_eq!(ImageInfo::from_bytes(&encoded).unwrap().bits_per_pixel, 24);

    let decoded = DecodeRequest::new(&encoded).decode(Unstoppable).unwrap();
    assert_eq!(decoded, pixels);
}

#[test]
fn bmp_roundtrip_alpha_is_32bit() {
    let pixels = gradient(6, 4, true);
    let encoded = EncodeRequest::bmp().encode(&pixels, Unstoppable).unwrap();
    assert_eq!(ImageInfo::from_bytes(&encoded).unwrap().bits_per_pixel, 32);
    let decoded = DecodeRequest::new(&encoded).decode(Unstoppable).unwrap();
    assert_eq!(decoded, pixels);
}

#[test]
fn bmp_every_depth_is_stable_through_canonical() {
    let source = checkerboard(9, 7);
    for bits in [1u16, 4, 8, 16, 24, 32] {
        let raw = EncodeRequest::bmp_with_bit_depth(bits)
            .encode(&source, Unstoppable)
            .unwrap();
        let first = DecodeRequest::new(&raw).decode(Unstoppable).unwrap();
        let again = EncodeRequest::bmp_with_bit_depth(bits)
            .encode(&first, Unstoppable)
            .unwrap();
        let second = DecodeRequest::new(&again).decode(Unstoppable).unwrap();
        assert_eq!(first, second, "{bits} bpp");
        assert_eq!(first.width(), 9);
        assert_eq!(first.height(), 7);
    }
}

#[test]
fn bmp_indexed_depths_are_exact_for_few_colors() {
    let source = checkerboard(13, 5);
    for bits in [1u16, 4, 8] {
        let raw = EncodeRequest::bmp_with_bit_depth(bits)
            .encode(&source, Unstoppable)
            .unwrap();
        let decoded = DecodeRequest::new(&raw).decode(Unstoppable).unwrap();
        assert_eq!(decoded, source, "{bits} bpp");
    }
}

#[test]
fn bmp_rle8_roundtrip() {
    let mut pixels = PixelBuffer::new(40, 6).unwrap();
    for y in 0..6 {
        for x in 0..40 {
            // long runs plus a literal stretch in every row
            let shade = if x < 20 { 10 } else if x < 26 { (x * 7) as u8 } else { 200 };
            pixels.set(x, y, Color::rgb(shade, shade, y as u8));
        }
    }
    let raw = EncodeRequest::bmp_rle8().encode(&pixels, Unstoppable).unwrap();
    let uncompressed = EncodeRequest::bmp_with_bit_depth(8)
        .encode(&pixels, Unstoppable)
        .unwrap();
    assert!(raw.len() < uncompressed.len());

    let decoded = DecodeRequest::new(&raw).decode(Unstoppable).unwrap();
    assert_eq!(decoded, pixels);
}

#[test]
fn bmp_indexed_rejects_too_many_colors() {
    let pixels = gradient(8, 8, false);
    assert!(matches!(
        EncodeRequest::bmp_with_bit_depth(1).encode(&pixels, Unstoppable),
        Err(RasterError::UnsupportedVariant(_))
    ));
}

#[test]
fn bmp_unsupported_depth() {
    let pixels = checkerboard(2, 2);
    assert!(matches!(
        EncodeRequest::bmp_with_bit_depth(2).encode(&pixels, Unstoppable),
        Err(RasterError::UnsupportedVariant(_))
    ));
}

#[test]
fn bmp_44x40_24bit_sizes() {
    let pixels = gradient(44, 40, false);
    let raw = EncodeRequest::bmp_with_bit_depth(24)
        .encode(&pixels, Unstoppable)
        .unwrap();
    // 54 header bytes + 40 rows of 132 bytes
    assert_eq!(raw.len(), 54 + 5280);
    let decoded = DecodeRequest::new(&raw).decode(Unstoppable).unwrap();
    assert_eq!(decoded.pixels().len(), 7040);
}

// ── PNG ──────────────────────────────────────────────────────────────

#[test]
fn png_roundtrip_rgb() {
    let pixels = checkerboard(8, 6);
    let encoded = EncodeRequest::png().encode(&pixels, Unstoppable).unwrap();
    assert_eq!(&encoded[..8], &PNG_SIGNATURE);
    let decoded = DecodeRequest::new(&encoded).decode(Unstoppable).unwrap();
    assert_eq!(decoded, pixels);
}

#[test]
fn png_roundtrip_rgba_every_strategy() {
    let pixels = gradient(17, 11, true);
    let mut strategies = vec![FilterStrategy::Adaptive];
    strategies.extend(FILTERS.map(FilterStrategy::Fixed));
    for strategy in strategies {
        let encoded = EncodeRequest::png()
            .filter(strategy)
            .compression(PngCompression::Fast)
            .encode(&pixels, Unstoppable)
            .unwrap();
        let decoded = DecodeRequest::new(&encoded).decode(Unstoppable).unwrap();
        assert_eq!(decoded, pixels, "{strategy:?}");
    }
}

#[test]
fn png_compression_levels_agree() {
    let pixels = gradient(32, 32, false);
    let stored = EncodeRequest::png()
        .compression(PngCompression::Level(0))
        .filter(FilterStrategy::Fixed(FilterType::None))
        .encode(&pixels, Unstoppable)
        .unwrap();
    let best = EncodeRequest::png()
        .compression(PngCompression::Best)
        .encode(&pixels, Unstoppable)
        .unwrap();
    assert!(best.len() < stored.len());
    assert_eq!(
        DecodeRequest::new(&stored).decode(Unstoppable).unwrap(),
        DecodeRequest::new(&best).decode(Unstoppable).unwrap()
    );
}

#[test]
fn png_text_properties_roundtrip() {
    let pixels = checkerboard(3, 3);
    let encoded = EncodeRequest::png()
        .text("Title", "Checks")
        .text("Comment", "café")
        .encode(&pixels, Unstoppable)
        .unwrap();
    let image = PngDecoder::new(&encoded)
        .decode_image(&Unstoppable)
        .unwrap();
    assert_eq!(
        image.text,
        [
            TextProperty::new("Title", "Checks"),
            TextProperty::new("Comment", "café"),
        ]
    );
    assert_eq!(image.pixels, pixels);
}

#[test]
fn bmp_to_png_to_bmp() {
    let pixels = gradient(10, 10, true);
    let bmp = EncodeRequest::bmp().encode(&pixels, Unstoppable).unwrap();
    let from_bmp = DecodeRequest::new(&bmp).decode(Unstoppable).unwrap();
    let png = EncodeRequest::png().encode(&from_bmp, Unstoppable).unwrap();
    let from_png = DecodeRequest::new(&png).decode(Unstoppable).unwrap();
    assert_eq!(from_png, pixels);
}
