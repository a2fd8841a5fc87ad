#![no_main]
use gdshare::keys::{FILE_KEY, LEVEL_KEY};
use gdshare::{codec, share};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Neither decode path may panic
    let _ = codec::decode_envelope(data, FILE_KEY);
    let _ = codec::decode_envelope(data, LEVEL_KEY);

    // Shared levels that decode must re-encode in the same format
    if let Ok(level) = share::decode(data, None) {
        if let Some(format) = gdshare::ShareFormat::sniff(data) {
            let _ = share::encode(&level, format);
        }
    }
});
