#![cfg(all(feature = "bmp", feature = "png"))]

use std::io::{Cursor, Seek, SeekFrom};

use rastercodec::codec::{self, BmpCodec, PngCodec};
use rastercodec::{Color, ImageCodec, ImageFormat, Limits, PixelBuffer, RasterError};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn sample() -> PixelBuffer {
    let colors: Vec<Color> = (0..12u8)
        .map(|i| Color::new(i * 20, 255 - i * 20, i, if i % 3 == 0 { 128 } else { 255 }))
        .collect();
    PixelBuffer::from_colors(4, 3, &colors).unwrap()
}

#[test]
fn file_name_capabilities() {
    assert!(BmpCodec.can_decode("image.bmp"));
    assert!(BmpCodec.can_decode("IMAGE.BMP"));
    assert!(BmpCodec.can_decode("old/icon.dib"));
    assert!(!BmpCodec.can_decode("image.png"));
    assert!(PngCodec.can_decode("shot.Png"));
    assert!(!PngCodec.can_decode("shot.png.bak"));
    assert!(PngCodec.can_encode("out.png"));
    assert!(BmpCodec.can_encode("out.dib"));
    assert!(!BmpCodec.can_encode("out.jpg"));
}

#[test]
fn header_capabilities() {
    assert!(BmpCodec.can_decode_header(&19778u16.to_le_bytes()));
    assert!(!BmpCodec.can_decode_header(&19777u16.to_le_bytes()));
    assert!(!BmpCodec.can_decode_header(&19779u16.to_le_bytes()));
    assert!(PngCodec.can_decode_header(&PNG_MAGIC));
    for i in 0..PNG_MAGIC.len() {
        let mut bad = PNG_MAGIC;
        bad[i] ^= 1;
        assert!(!PngCodec.can_decode_header(&bad), "byte {i}");
    }
    assert!(!PngCodec.can_decode_header(&PNG_MAGIC[..7]));
    assert!(!BmpCodec.can_decode_header(&PNG_MAGIC));
    assert!(!PngCodec.can_decode_header(b"BM"));
}

#[test]
fn stream_capability_keeps_position() {
    let mut stream = Cursor::new([&b"junk"[..], &PNG_MAGIC[..], &b"tail"[..]].concat());
    stream.seek(SeekFrom::Start(4)).unwrap();
    assert!(PngCodec.can_decode_stream(&mut stream).unwrap());
    assert_eq!(stream.position(), 4);
    assert!(!BmpCodec.can_decode_stream(&mut stream).unwrap());
    assert_eq!(stream.position(), 4);

    // fewer bytes left than the signature
    stream.seek(SeekFrom::End(-2)).unwrap();
    let end = stream.position();
    assert!(!PngCodec.can_decode_stream(&mut stream).unwrap());
    assert_eq!(stream.position(), end);
}

#[test]
fn codec_encode_then_decode() {
    let pixels = sample();
    for entry in codec::codecs() {
        let mut out = Vec::new();
        entry.encode(&mut out, &pixels).unwrap();
        assert!(entry.can_decode_header(&out), "{:?}", entry.format());
        let decoded = entry.decode(&mut out.as_slice()).unwrap();
        assert_eq!(decoded, pixels, "{:?}", entry.format());
    }
}

#[test]
fn codec_decode_applies_limits() {
    let pixels = sample();
    let narrow = Limits {
        max_width: Some(3),
        ..Default::default()
    };
    for entry in codec::codecs() {
        let mut encoded = Vec::new();
        entry.encode(&mut encoded, &pixels).unwrap();
        assert!(
            matches!(
                entry.decode_with_limits(&mut encoded.as_slice(), &narrow),
                Err(RasterError::LimitExceeded(_))
            ),
            "{:?}",
            entry.format()
        );
        assert!(matches!(
            codec::decode_with_limits(&mut encoded.as_slice(), &narrow),
            Err(RasterError::LimitExceeded(_))
        ));
        let wide = Limits {
            max_width: Some(4),
            ..Default::default()
        };
        assert_eq!(entry.decode_with_limits(&mut encoded.as_slice(), &wide).unwrap(), pixels);
    }
}

#[test]
fn dispatcher_selects_by_name_and_signature() {
    assert_eq!(
        codec::decoder_for_file_name("x.BMP").map(|c| c.format()),
        Some(ImageFormat::Bmp)
    );
    assert_eq!(
        codec::encoder_for_file_name("x.png").map(|c| c.format()),
        Some(ImageFormat::Png)
    );
    assert!(codec::encoder_for_file_name("x.tiff").is_none());

    let pixels = sample();
    let mut png = Vec::new();
    PngCodec.encode(&mut png, &pixels).unwrap();
    assert_eq!(
        codec::decoder_for_header(&png).map(|c| c.format()),
        Some(ImageFormat::Png)
    );
    assert_eq!(codec::decode(&mut png.as_slice()).unwrap(), pixels);

    let mut bmp = Vec::new();
    BmpCodec.encode(&mut bmp, &pixels).unwrap();
    assert_eq!(codec::decode(&mut Cursor::new(bmp)).unwrap(), pixels);
}

#[test]
fn wrong_codec_reports_typed_error() {
    let mut png = Vec::new();
    PngCodec.encode(&mut png, &sample()).unwrap();
    assert!(matches!(
        BmpCodec.decode(&mut png.as_slice()),
        Err(RasterError::UnrecognizedFormat)
    ));
    assert!(matches!(
        codec::decode(&mut &b"\x00\x01\x02"[..]),
        Err(RasterError::UnrecognizedFormat)
    ));
}

#[test]
fn failed_write_surfaces_io_error() {
    struct Full;
    impl std::io::Write for Full {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    assert!(matches!(
        BmpCodec.encode(&mut Full, &sample()),
        Err(RasterError::Io(_))
    ));
}
