#![no_main]

use autoload52_generator::FastScanner;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    for class in FastScanner::find_classes(source) {
        assert!(!class.is_empty());
        assert!(!class.starts_with('\\'), "leading separator in {class:?}");
    }
});
