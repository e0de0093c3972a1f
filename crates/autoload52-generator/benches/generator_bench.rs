//! Benchmarks for class scanning and class map construction.

use autoload52_core::{AutoloadDeclaration, GeneratorConfig, Package, PackageMap};
use autoload52_generator::{AutoloadGenerator, FastScanner, PathResolver};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

fn bench_find_classes(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_classes");

    let pear_file = r"<?php
/**
 * Table gateway base class.
 */
abstract class Zend_Db_Table_Abstract
{
    const NAME = 'name';

    protected $_name = null;

    public function __construct($config = array())
    {
        $this->_setup('class Fake {}');
    }
}
";

    let heredoc_file = r#"<?php
namespace Acme\Templates;

interface Renderer {}

class Page implements Renderer
{
    public function render()
    {
        return <<<HTML
<div class="page">class NotAClass {}</div>
HTML;
    }
}
"#;

    group.throughput(Throughput::Bytes(pear_file.len() as u64));
    group.bench_function("pear_file", |b| {
        b.iter(|| black_box(FastScanner::find_classes(pear_file)))
    });

    group.throughput(Throughput::Bytes(heredoc_file.len() as u64));
    group.bench_function("heredoc_file", |b| {
        b.iter(|| black_box(FastScanner::find_classes(heredoc_file)))
    });

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let lib = dir.path().join("vendor/acme/lib");
    for i in 0..200 {
        let path = lib.join(format!("src/Acme/Module{}/Class{i}.php", i % 10));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("<?php\nclass Acme_Module{}_Class{i} {{}}\n", i % 10)).unwrap();
    }

    let mut autoload = AutoloadDeclaration::default();
    autoload.add_namespace("Acme_", ["src"]);
    let map = PackageMap::new(Package::new("app"))
        .with_dependency(Package::new("acme/lib").with_autoload(autoload), &lib);

    let config = GeneratorConfig::new(dir.path())
        .with_suffix("bench")
        .with_scan_namespace_dirs(true);
    let generator = AutoloadGenerator::new(config);

    c.bench_function("generate_200_classes", |b| {
        b.iter(|| black_box(generator.generate(&map).unwrap()))
    });
}

fn bench_path_code(c: &mut Criterion) {
    let resolver =
        PathResolver::from_canonical("/srv/app", "/srv/app/vendor", "/srv/app/vendor/composer")
            .unwrap();

    c.bench_function("path_code", |b| {
        b.iter(|| {
            black_box(
                resolver
                    .path_code("/srv/app/vendor/acme/lib/src/Acme/Module1/Class1.php")
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_find_classes, bench_generate, bench_path_code);
criterion_main!(benches);
