use leadgrid::config::{AppConfig, ConfigManager};
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.4");

    // Display defaults
    assert_eq!(config.display.overscan_rows, 4);
    assert_eq!(config.display.overscan_cols, 2);
    assert_eq!(config.display.default_column_width, 16);
    assert!(config.display.row_numbers);
    assert_eq!(config.display.row_start_index, 1);
    assert_eq!(config.display.table_cell_padding, 1);

    // Performance defaults
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.performance.rename_debounce_ms, 500);
    assert_eq!(config.performance.search_debounce_ms, 300);

    // Theme defaults
    assert_eq!(config.theme.colors.pinned_divider, "cyan");
    assert_eq!(config.theme.colors.row_numbers, "dark_gray");
    assert_eq!(config.theme.colors.selection_bg, "indexed(24)");

    // Search defaults
    assert_eq!(config.search.history_limit, 1000);
    assert!(config.search.enable_history);

    // Debug defaults
    assert!(!config.debug.enabled);
    assert!(config.debug.show_window);
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let template = config_manager.generate_default_config();

    assert!(template.contains("[display]"));
    assert!(template.contains("[performance]"));
    assert!(template.contains("[theme.colors]"));
    assert!(template.contains("[search]"));
    assert!(template.contains("[debug]"));
    assert!(template.contains("rename_debounce_ms = 500"));
    assert!(template.contains("search_debounce_ms = 300"));

    // The shipped template must itself parse and match the defaults
    let parsed: AppConfig = toml::from_str(&template).expect("default template must parse");
    assert!(parsed.validate().is_ok());
    assert_eq!(
        parsed.display.default_column_width,
        AppConfig::default().display.default_column_width
    );
}

#[test]
fn test_write_default_config_refuses_overwrite() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager.write_default_config(false).unwrap();
    assert!(path.exists());

    // Second write without force fails
    assert!(config_manager.write_default_config(false).is_err());
    // With force it succeeds
    assert!(config_manager.write_default_config(true).is_ok());
}

#[test]
fn test_merge_keeps_non_default_values() {
    let mut base = AppConfig::default();
    let mut other = AppConfig::default();
    other.display.overscan_rows = 10;
    other.performance.rename_debounce_ms = 250;
    other.theme.colors.pinned_divider = "#00ff88".to_string();

    base.merge(other);

    assert_eq!(base.display.overscan_rows, 10);
    assert_eq!(base.performance.rename_debounce_ms, 250);
    assert_eq!(base.theme.colors.pinned_divider, "#00ff88");
    // Untouched values stay at defaults
    assert_eq!(base.display.overscan_cols, 2);
    assert_eq!(base.performance.search_debounce_ms, 300);
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.performance.event_poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.display.min_column_width = 90;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.theme.color_mode = "sepia".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.theme.colors.selection_bg = "not-a-color".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.version = "9.9".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_partial_user_config_parses() {
    // A user config with only one section overrides just that section
    let toml_str = r#"
        version = "0.4"

        [performance]
        search_debounce_ms = 150
    "#;
    let parsed: AppConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(parsed.performance.search_debounce_ms, 150);
    assert_eq!(parsed.display.default_column_width, 16);
    assert!(parsed.validate().is_ok());
}
