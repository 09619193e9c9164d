use bumpspec::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use regex::Regex;

const CONFIG: &str = r#"
    parse = '(?P<major>\d+)\.(?P<minor>\d+)((?P<prerel>[a-z]+)(?P<prerelversion>\d+))?'
    serialize = ["{major}.{minor}{prerel}{prerelversion}", "{major}.{minor}"]

    [parts.prerel]
    values = ["dev", "a", "b", "c", "rc", "d"]
    optional_value = "d"
"#;

fn version_inputs() -> Vec<&'static str> {
    vec!["1.0", "1.0dev0", "1.0b1", "2.13rc4", "10.2d0"]
}

fn parse_versions(spec: &VersionSpec, regex: &Regex, inputs: &[&str]) {
    for input in inputs {
        let res = spec.parse_version(input, regex);
        assert!(res.is_ok());
    }
}

fn bump_and_serialize(spec: &VersionSpec, regex: &Regex, formats: &[Template], inputs: &[&str]) {
    let context = Context::new();
    for input in inputs {
        let version = spec.parse_version(input, regex).unwrap();
        for part in ["major", "minor", "prerelversion"] {
            let res = version.bump(part).map(|next| next.serialize(formats, &context));
            assert!(matches!(res, Ok(Ok(_))));
        }
    }
}

fn template_inputs() -> Vec<&'static str> {
    vec![
        "{major}.{minor}.{patch}",
        "{major}.{minor}{prerel}{prerelversion}",
        "v{new_version:>12}-{$BUILD}+{now:%Y%m%d}",
        "{{literal}} {release}.{patch}",
    ]
}

fn parse_templates(inputs: &[&str]) {
    for input in inputs {
        let res = Template::parse(input);
        assert!(res.is_ok());
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let spec = config.version_spec(Clock::fixed(2020, 5, 1).unwrap()).unwrap();
    let regex = config.parse_regex().unwrap();
    let formats = config.serialize_templates().unwrap();

    c.bench_function("parse_versions", |b| {
        b.iter(|| parse_versions(&spec, &regex, black_box(&version_inputs())))
    });
    c.bench_function("bump_and_serialize", |b| {
        b.iter(|| bump_and_serialize(&spec, &regex, &formats, black_box(&version_inputs())))
    });
    c.bench_function("parse_templates", |b| {
        b.iter(|| parse_templates(black_box(&template_inputs())))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
