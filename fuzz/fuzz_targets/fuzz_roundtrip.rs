#![no_main]
use libfuzzer_sys::fuzz_target;
use rastercodec::*;

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    // If we can decode it, re-encoding and decoding again must produce identical pixels
    let Ok(decoded) = DecodeRequest::new(data)
        .with_limits(&limits)
        .verify_crc(false)
        .decode(enough::Unstoppable)
    else {
        return;
    };

    // Both default encoders are lossless for canonical RGBA8
    for request in [EncodeRequest::bmp(), EncodeRequest::png()] {
        let encoded = request
            .encode(&decoded, enough::Unstoppable)
            .expect("encoding a decoded image failed");
        let Ok(decoded2) = DecodeRequest::new(&encoded).decode(enough::Unstoppable) else {
            panic!("re-encoded {:?} data failed to decode", request.format());
        };
        assert_eq!(decoded, decoded2, "{:?} roundtrip pixel mismatch", request.format());
    }
});
