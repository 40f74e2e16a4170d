// tests/config_settings.rs
use newsletter_harvester::config::{
    HarvestSettings, ENV_CONFIG_PATH, ENV_SIMILARITY_THRESHOLD, ENV_SUMMARY_MAX_CHARS,
};

fn clear_env() {
    std::env::remove_var(ENV_CONFIG_PATH);
    std::env::remove_var(ENV_SIMILARITY_THRESHOLD);
    std::env::remove_var(ENV_SUMMARY_MAX_CHARS);
}

#[test]
fn toml_parsing_and_defaults() {
    let s = HarvestSettings::from_toml_str(
        r#"
            similarity_threshold = 0.9
            summary_max_chars = 320
        "#,
    )
    .unwrap();
    assert!((s.similarity_threshold - 0.9).abs() < 1e-6);
    assert_eq!(s.summary_max_chars, 320);
    // Unspecified keys fall back to defaults.
    assert_eq!(s.store_capacity, 2000);
    assert_eq!(s.ingest_interval_secs, 0);
    assert!(s.fixture_mailbox_path.is_none());

    assert!(HarvestSettings::from_toml_str("similarity_threshold = \"nope\"").is_err());
}

#[serial_test::serial]
#[test]
fn env_overrides_win_and_are_clamped() {
    clear_env();
    // Point at a non-existent config so file contents don't interfere.
    std::env::set_var(ENV_CONFIG_PATH, "does/not/exist.toml");

    std::env::set_var(ENV_SIMILARITY_THRESHOLD, "0.70");
    std::env::set_var(ENV_SUMMARY_MAX_CHARS, "240");
    let s = HarvestSettings::load().unwrap();
    assert!((s.similarity_threshold - 0.70).abs() < 1e-6);
    assert_eq!(s.summary_max_chars, 240);

    // Out-of-range thresholds clamp instead of erroring.
    std::env::set_var(ENV_SIMILARITY_THRESHOLD, "7.0");
    let s = HarvestSettings::load().unwrap();
    assert!((s.similarity_threshold - 1.0).abs() < 1e-6);

    // Garbage values are ignored in favor of defaults.
    std::env::set_var(ENV_SIMILARITY_THRESHOLD, "garbage");
    std::env::set_var(ENV_SUMMARY_MAX_CHARS, "also garbage");
    let s = HarvestSettings::load().unwrap();
    assert!((s.similarity_threshold - 0.85).abs() < 1e-6);
    assert_eq!(s.summary_max_chars, 500);

    clear_env();
}

#[serial_test::serial]
#[test]
fn missing_config_file_falls_back_to_defaults() {
    clear_env();
    std::env::set_var(ENV_CONFIG_PATH, "does/not/exist.toml");
    let s = HarvestSettings::load().unwrap();
    assert!((s.similarity_threshold - 0.85).abs() < 1e-6);
    assert_eq!(s.summary_max_chars, 500);
    clear_env();
}
