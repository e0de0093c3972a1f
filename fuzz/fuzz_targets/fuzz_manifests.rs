#![no_main]

use autoload52_core::{InstalledRepository, RootManifest, build_package_map, from_json_slice};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(manifest) = from_json_slice::<RootManifest>(data) {
        let (root, config) = manifest.into_parts();
        let _ = root.normalized_target_dir();
        let _ = config.vendor_dir;
    }

    if let Ok(repository) = InstalledRepository::from_slice(data) {
        // Install paths are computed lexically, so any input must map cleanly.
        let map = build_package_map(Default::default(), &repository, Path::new("/srv/app/vendor"));
        assert!(map.dependencies().len() <= repository.len());
    }
});
