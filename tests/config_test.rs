//! Integration tests for Settings loading from an explicit settings file.
//!
//! These tests never touch the global settings location: an explicit
//! file replaces it, and a missing explicit file is a configuration error.

use std::fs;

use tempfile::TempDir;

use lambdeploy::application::ApplicationError;
use lambdeploy::config::Settings;

#[test]
fn given_settings_file_when_load_then_file_values_win_over_defaults() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(
        &path,
        r#"
aws_cli = "/usr/local/bin/aws"
profile = "deploy"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.aws_cli, "/usr/local/bin/aws");
    assert_eq!(settings.pip, "pip");
    assert_eq!(settings.profile.as_deref(), Some("deploy"));
}

#[test]
fn given_missing_settings_file_when_load_then_config_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");

    // Act
    let result = Settings::load(Some(&path));

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("absent.toml")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn given_malformed_settings_file_when_load_then_config_error() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "aws_cli = ").unwrap();

    // Act
    let result = Settings::load(Some(&path));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_effective_settings_when_to_toml_then_round_trips() {
    // Arrange
    let settings = Settings {
        pip: "pip3".into(),
        ..Settings::default()
    };

    // Act
    let rendered = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&rendered).unwrap();

    // Assert
    assert_eq!(parsed, settings);
}
