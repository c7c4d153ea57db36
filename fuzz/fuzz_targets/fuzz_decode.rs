#![no_main]
use libfuzzer_sys::fuzz_target;
use rastercodec::{DecodeRequest, ImageInfo, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 26),
        ..Default::default()
    };

    // Auto-detect decode (BMP, PNG) must never panic
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .decode(enough::Unstoppable);

    // Lenient CRC mode reaches deeper into PNG parsing
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .verify_crc(false)
        .decode(enough::Unstoppable);

    let _ = ImageInfo::from_bytes(data);
});
