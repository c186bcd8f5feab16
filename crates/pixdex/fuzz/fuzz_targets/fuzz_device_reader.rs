#![no_main]

use libfuzzer_sys::fuzz_target;
use pixdex::DeviceFrameReader;

fuzz_target!(|data: &[u8]| {
    // The reader should never panic, whatever arrives on the line
    let mut reader = DeviceFrameReader::new(data);
    while let Ok(Some(frame)) = reader.next_frame() {
        assert_eq!(frame.header.defect(), None);
        assert_eq!(frame.payload.len(), frame.header.expected_payload_len());
        let _ = frame.to_rgb_image();
    }
    assert!(reader.skipped_bytes() <= data.len() as u64);
});
