//! Tests for graph configuration defaults, JSON loading and validation

use yeri::config::{ConfigError, GraphConfig};

#[test]
fn test_defaults() {
    let config = GraphConfig::default();
    assert_eq!(config.width, 78);
    assert_eq!(config.height, 24);
    assert_eq!(config.timezone, "UTC");
    assert_eq!(config.y_lines, 5);
    assert!(config.scale_to_zero);
    assert!(config.show_legend);
    assert!(!config.fill);
    assert_eq!(config.title, None);
    assert_eq!(config.max_y, None);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = GraphConfig::from_json(r#"{"width": 100, "timezone": "America/Los_Angeles", "fill": true}"#)
        .expect("config");
    assert_eq!(config.width, 100);
    assert_eq!(config.timezone, "America/Los_Angeles");
    assert!(config.fill);
    assert_eq!(config.height, 24);
    assert_eq!(config.x_axis_label_width, 7);
}

#[test]
fn test_empty_json_is_default() {
    assert_eq!(GraphConfig::from_json("{}").expect("config"), GraphConfig::default());
}

#[test]
fn test_serde_roundtrip() {
    let config = GraphConfig {
        title: Some("requests".to_string()),
        max_y: Some(250.0),
        scale_to_zero: false,
        ..Default::default()
    };
    let json = serde_json::to_string(&config).expect("serialize");
    assert_eq!(GraphConfig::from_json(&json).expect("config"), config);
}

#[test]
fn test_malformed_json() {
    assert!(matches!(GraphConfig::from_json("{width: 3"), Err(ConfigError::Json(_))));
    assert!(matches!(
        GraphConfig::from_json(r#"{"width": "wide"}"#),
        Err(ConfigError::Json(_))
    ));
}

// ============================================
// Validation Tests
// ============================================

#[test]
fn test_zero_size() {
    let config = GraphConfig {
        width: 0,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::ZeroSize { width: 0, height: 24 })));
}

#[test]
fn test_too_narrow_for_labels() {
    let config = GraphConfig {
        width: 7,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::TooSmall {
            dimension: "width",
            size: 7,
            minimum: 8
        })
    ));
}

#[test]
fn test_zero_label_width() {
    let config = GraphConfig {
        x_axis_label_width: 0,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::ZeroLabelWidth)));
}

#[test]
fn test_non_finite_max_y() {
    let config = GraphConfig {
        max_y: Some(f64::INFINITY),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxY(_))));
}

#[test]
fn test_unknown_timezone() {
    let err = GraphConfig::from_json(r#"{"timezone": "Nowhere/Special"}"#).expect_err("bad zone");
    assert!(matches!(err, ConfigError::UnknownTimezone(ref zone) if zone == "Nowhere/Special"));
    assert!(err.to_string().contains("Nowhere/Special"));
}

#[test]
fn test_time_buddy_uses_zone() {
    let config = GraphConfig {
        timezone: "Europe/Berlin".to_string(),
        ..Default::default()
    };
    let buddy = config.time_buddy().expect("zone");
    assert_eq!(buddy.timezone().name(), "Europe/Berlin");
}
