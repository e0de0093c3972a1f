//! Property tests: generated path expressions evaluate back to the path
//! they were built for, wherever the project layout puts the directories.

use autoload52_generator::{
    EvalContext, PathResolver, Variable, find_shortest_path, find_shortest_path_code,
    normalize_path,
};
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    "[a-z]{1,5}"
}

fn dir(min: usize, max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), min..=max).prop_map(|s| format!("/{}", s.join("/")))
}

fn rel(min: usize, max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), min..=max).prop_map(|s| s.join("/"))
}

fn join(root: &str, rest: &str) -> String {
    if rest.is_empty() {
        root.to_string()
    } else {
        format!("{root}/{rest}")
    }
}

/// (base, vendor, output, target)
fn layout() -> impl Strategy<Value = (String, String, String, String)> {
    (dir(1, 3), dir(1, 3), rel(1, 2), rel(0, 3), rel(0, 3), 0..3u8).prop_map(
        |(base, elsewhere, vendor_rel, output_rel, target_rel, shape)| {
            let vendor = match shape {
                0 => join(&base, "vendor"),
                1 => join(&base, &vendor_rel),
                _ => elsewhere.clone(),
            };
            let output_rel = if output_rel.is_empty() {
                "composer".to_string()
            } else {
                output_rel
            };
            let output = join(&vendor, &output_rel);
            let target = match target_rel.len() % 3 {
                0 => join(&vendor, &target_rel),
                1 => join(&base, &target_rel),
                _ => join(&elsewhere, &target_rel),
            };
            (base, vendor, output, target)
        },
    )
}

proptest! {
    #[test]
    fn path_code_round_trips((base, vendor, output, target) in layout()) {
        let resolver = PathResolver::from_canonical(&base, &vendor, &output).unwrap();
        let anchors = resolver.anchors().unwrap();

        let file = format!("{output}/autoload_namespaces_52.php");
        let ctx = EvalContext::new(file.clone());
        let vendor_dir = anchors.vendor_dir.evaluate(&ctx).unwrap();
        prop_assert_eq!(&vendor_dir, &vendor);

        let ctx = ctx.bind(Variable::VendorDir, vendor_dir);
        let base_dir = anchors.base_dir.evaluate(&ctx).unwrap();
        prop_assert_eq!(&base_dir, &base);

        let ctx = ctx.bind(Variable::BaseDir, base_dir);
        let code = resolver.path_code(&target).unwrap();
        prop_assert_eq!(code.evaluate(&ctx).map(|p| normalize_path(&p)), Some(target));
    }

    #[test]
    fn bootstrap_reaches_output_dir((_base, vendor, output, _target) in layout()) {
        let resolver = PathResolver::from_canonical("/", &vendor, &output).unwrap();
        let code = resolver.anchors().unwrap().output_dir_from_vendor;
        let ctx = EvalContext::new(format!("{vendor}/autoload_52.php"));
        prop_assert_eq!(code.evaluate(&ctx), Some(output));
    }

    #[test]
    fn shortest_path_resolves_to_target(from in dir(1, 4), to in dir(1, 4)) {
        let relative = find_shortest_path(&from, &to, true).unwrap();
        let resolved = if relative.starts_with('/') {
            relative
        } else {
            normalize_path(&format!("{from}/{relative}"))
        };
        prop_assert_eq!(resolved, to.clone());

        let code = find_shortest_path_code(&from, &to, true).unwrap();
        let ctx = EvalContext::new(format!("{from}/file.php"));
        prop_assert_eq!(code.evaluate(&ctx).map(|p| normalize_path(&p)), Some(to));
    }

    #[test]
    fn normalize_is_idempotent(path in "(/?[a-z.]{1,3}){0,6}") {
        let once = normalize_path(&path);
        prop_assert_eq!(normalize_path(&once), once.clone());
    }
}
