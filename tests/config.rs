#![cfg(feature = "config")]

use ferrous_hive::{Container, ContainerSettings, PoolExpandMethod, PoolSettings};

#[test]
fn test_container_settings_from_json() {
    let settings: ContainerSettings = serde_json::from_str(r#"{ "validating": true }"#).unwrap();
    assert!(settings.validating);
    assert!(settings.warn_on_install_resolve);
    assert!(Container::with_settings(settings).is_validating());
}

#[test]
fn test_pool_settings_from_json() {
    let settings: PoolSettings =
        serde_json::from_str(r#"{ "initial_size": 4, "expand_method": "double" }"#).unwrap();
    assert_eq!(settings.initial_size, 4);
    assert_eq!(settings.max_size, usize::MAX);
    assert_eq!(settings.expand_method, PoolExpandMethod::Double);
}

#[test]
fn test_pool_settings_round_trip() {
    let settings = PoolSettings::fixed(8);
    let json = serde_json::to_string(&settings).unwrap();
    assert!(json.contains("\"disabled\""));
    assert_eq!(serde_json::from_str::<PoolSettings>(&json).unwrap(), settings);
}
