use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gavel_version::{Version, VersionComparator, VersionRange};

fn bench_compare(c: &mut Criterion) {
    let cases = [
        ("1.2.3", "1.2.4"),
        ("2.4.0-alpha-1", "2.4.0"),
        ("1.0-SNAPSHOT", "1.0"),
        ("1.0.0", "1"),
        ("1.2.3-rc1", "1.2.3-sp1"),
        ("3.0-20090401.120000-3", "3.0-SNAPSHOT"),
    ];

    c.bench_function("compare_versions", |b| {
        b.iter(|| {
            for (a, bver) in cases {
                black_box(VersionComparator::compare(black_box(a), black_box(bver)));
            }
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let versions = [
        "1.2.3",
        "1.0-beta-2",
        "2.0.0.RELEASE",
        "1.0-SNAPSHOT",
        "4.13.2",
        "1.7.36",
        "31.1-jre",
    ];

    c.bench_function("parse_versions", |b| {
        b.iter(|| {
            for version in versions {
                black_box(Version::parse(black_box(version)));
            }
        })
    });
}

fn bench_range_contains(c: &mut Criterion) {
    let range = VersionRange::parse("(,1.0],[1.2,2.0),[3.0,)").unwrap();
    let versions = ["0.9", "1.1", "1.5", "2.0", "3.1-SNAPSHOT"];

    c.bench_function("range_contains", |b| {
        b.iter(|| {
            for version in versions {
                black_box(range.contains_str(black_box(version)));
            }
        })
    });
}

criterion_group!(benches, bench_compare, bench_parse, bench_range_contains);
criterion_main!(benches);
