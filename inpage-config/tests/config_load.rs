use inpage_config::{LogFormatSetting, SettingsLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn loads_file_and_expands_placeholders() {
    let tmp = TempDir::new().unwrap();
    let file_yaml = r#"
preload_search_window: true
open_devtools_of_search_window: false
assets_dir: "${INPAGE_TEST_ROOT}/assets"
custom_css_path: "${INPAGE_TEST_ROOT}/theme.css"
log:
  emit_stderr: true
"#;
    let p = write_yaml(&tmp, "inpage.yaml", file_yaml);

    temp_env::with_var("INPAGE_TEST_ROOT", Some("/opt/inpage"), || {
        let settings = SettingsLoader::new()
            .with_file(&p)
            .load()
            .expect("load settings");

        assert!(settings.preload_search_window);
        assert!(settings.log.emit_stderr);
        assert_eq!(settings.assets_dir(), PathBuf::from("/opt/inpage/assets"));
        assert_eq!(settings.stylesheet(), PathBuf::from("/opt/inpage/theme.css"));
    });
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "inpage.yaml", "verbose: false\nlog:\n  format: text\n");

    temp_env::with_vars(
        [
            ("INPAGE__VERBOSE", Some("true")),
            ("INPAGE__LOG__FORMAT", Some("json")),
        ],
        || {
            let settings = SettingsLoader::new().with_file(&p).load().unwrap();
            assert!(settings.verbose);
            assert_eq!(settings.log.format, LogFormatSetting::Json);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let settings = SettingsLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("optional file may be missing");

    assert!(!settings.preload_search_window);
    assert!(!settings.verbose);
    assert_eq!(settings.custom_css_path, None);
    assert_eq!(settings.log.format, LogFormatSetting::Text);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let res = SettingsLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(res.is_err());
}

#[test]
#[serial]
fn later_sources_override_earlier_ones() {
    let settings = SettingsLoader::new()
        .with_yaml_str("verbose: true\npreload_search_window: true")
        .with_yaml_str("verbose: false")
        .load()
        .unwrap();
    assert!(!settings.verbose);
    assert!(settings.preload_search_window);
}
