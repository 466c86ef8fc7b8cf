use chrono::{Duration, Utc};
use domain::entities::parser::{DescriptorError, DescriptorFormat, DescriptorParser};
use domain::entities::requirements::RequirementsManifest;
use domain::entities::{DescriptorValidator, ValidationLevel};
use domain::render::DockerfileGenerator;
use domain::system::store::{LayerKey, LayerMetadata, LayerStore};
use std::fs;

const DJANGO_DESCRIPTOR: &str = r#"
base = "python:3.10-slim"
workdir = "/app"
manifest = "requirements.txt"
expose = 8000
entrypoint = ["python", "manage.py", "runserver", "0.0.0.0:8000"]
system-packages = ["gcc", "musl-dev", "default-libmysqlclient-dev", "pkg-config", "libffi-dev", "make"]

[runtime]
disable-bytecode-cache = true
force-unbuffered-output = true
"#;

#[test]
fn test_discover_parse_validate_render() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("berth.toml"), DJANGO_DESCRIPTOR).unwrap();
    // Lower priority; must not win over berth.toml.
    fs::write(dir.path().join("berth.json"), "{}").unwrap();

    let loaded = DescriptorParser::discover(dir.path()).unwrap();
    assert_eq!(loaded.format, DescriptorFormat::Toml);
    assert_eq!(loaded.path, dir.path().join("berth.toml"));
    let descriptor = loaded.descriptor;
    let validation = DescriptorValidator::validate(&descriptor);
    assert!(validation.valid, "{:?}", validation.issues);
    assert!(!validation.has_warnings());

    let dockerfile = DockerfileGenerator::new(&descriptor).render();
    assert!(dockerfile.starts_with("FROM python:3.10-slim\n"));
    assert!(dockerfile.contains("EXPOSE 8000\n"));
    assert!(dockerfile.ends_with("CMD [\"python\",\"manage.py\",\"runserver\",\"0.0.0.0:8000\"]\n"));
}

#[test]
fn test_no_descriptor_found() {
    let dir = tempfile::tempdir().unwrap();
    assert!(DescriptorParser::locate(dir.path()).is_none());
    assert!(matches!(
        DescriptorParser::discover(dir.path()),
        Err(DescriptorError::NotFound { .. })
    ));
}

#[test]
fn test_validation_collects_every_problem() {
    let yaml = r#"
base: python:latest
workdir: app
expose: 9000
system-packages: [gcc, gcc]
runtime:
  force-unbuffered-output: false
"#;
    let descriptor = DescriptorParser::parse(yaml, DescriptorFormat::Yaml).unwrap();
    let validation = DescriptorValidator::validate(&descriptor);

    let error_fields: Vec<&str> = validation.errors().map(|i| i.field.as_str()).collect();
    assert_eq!(
        error_fields,
        vec!["base", "workdir", "system-packages[1]", "expose"]
    );
    assert!(validation
        .issues
        .iter()
        .any(|i| i.level == ValidationLevel::Warning
            && i.field == "runtime.force-unbuffered-output"));
}

#[test]
fn test_requirements_file_with_options_and_continuations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requirements.txt");
    fs::write(
        &path,
        "--index-url https://pypi.org/simple\n\
         Django>=4.2,<5.0  # web\n\
         mysqlclient==2.2.0 \\\n    ; sys_platform == \"linux\"\n\
         djangorestframework[markdown]\n",
    )
    .unwrap();

    let manifest = RequirementsManifest::load(&path).unwrap();
    let names: Vec<&str> = manifest
        .requirements
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["Django", "mysqlclient", "djangorestframework"]);
    assert_eq!(manifest.options.len(), 1);
    assert_eq!(manifest.requirements[2].extras, vec!["markdown"]);
}

#[test]
fn test_layer_store_lists_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = LayerStore::new(dir.path().join("layers"));
    let descriptor = DescriptorParser::parse(DJANGO_DESCRIPTOR, DescriptorFormat::Toml).unwrap();

    let old = LayerKey::compute(&descriptor.base, &descriptor.system_packages, [b"Django==4.1\n"]);
    let new = LayerKey::compute(&descriptor.base, &descriptor.system_packages, [b"Django==4.2\n"]);

    for (key, age) in [(&old, 2), (&new, 0)] {
        store.prepare(key).unwrap();
        store
            .commit(&LayerMetadata {
                key: key.clone(),
                base: descriptor.base.to_string(),
                requirements: 1,
                created_at: Utc::now() - Duration::hours(age),
            })
            .unwrap();
    }
    // Interrupted install: directory without metadata is not listed.
    fs::create_dir_all(dir.path().join("layers/deadbeef0000-deps/site-packages")).unwrap();

    let listed: Vec<LayerKey> = store.list().unwrap().into_iter().map(|m| m.key).collect();
    assert_eq!(listed, vec![new.clone(), old]);

    assert_eq!(store.prune(Some(&new)).unwrap(), 2);
    assert!(store.is_complete(&new));
}
