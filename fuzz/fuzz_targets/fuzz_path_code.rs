#![no_main]

use arbitrary::Arbitrary;
use autoload52_generator::{PathResolver, find_shortest_path, normalize_path};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Layout {
    base: String,
    vendor: String,
    target: String,
}

fuzz_target!(|layout: Layout| {
    let base = normalize_path(&format!("/{}", layout.base));
    let vendor = normalize_path(&format!("/{}", layout.vendor));
    let target = normalize_path(&format!("/{}", layout.target));

    assert_eq!(normalize_path(&target), target);

    if let Ok(relative) = find_shortest_path(&base, &target, true) {
        assert!(!relative.is_empty());
    }

    let output = format!("{vendor}/composer");
    if let Ok(resolver) = PathResolver::from_canonical(&base, &vendor, &output) {
        let _ = resolver.anchors();
        let _ = resolver.path_code(&target);
    }
});
