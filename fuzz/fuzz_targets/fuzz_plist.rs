#![no_main]
use gdshare::plist::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(doc) = Document::parse(text) {
        let printed = doc.print(false);
        let reparsed = Document::parse(&printed).unwrap();
        assert_eq!(reparsed.print(false), printed);
    }
});
