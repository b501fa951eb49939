use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file or subdirectory
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub search: SearchConfig,
    pub ui: UiConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Extra rows rendered above/below the visible window to avoid flicker
    /// during fast scroll
    pub overscan_rows: usize,
    /// Extra columns rendered left/right of the visible window
    pub overscan_cols: usize,
    /// Width in terminal cells for columns without a stored width
    pub default_column_width: u16,
    pub min_column_width: u16,
    pub max_column_width: u16,
    pub row_numbers: bool,
    pub row_start_index: usize,
    pub table_cell_padding: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
    /// Keystrokes within this window coalesce into one rename action
    pub rename_debounce_ms: u64,
    /// Keystrokes within this window coalesce into one field-search pass
    pub search_debounce_ms: u64,
    /// Two clicks on the same cell within this window open the editor
    pub double_click_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub text_inverse: String,
    pub table_header: String,
    pub table_header_bg: String,
    pub row_numbers: String,
    pub column_separator: String,
    pub pinned_divider: String,
    pub selection_bg: String,
    pub selection_border: String,
    pub editing_outline: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub modal_border_error: String,
    pub confidence_low: String,
    pub confidence_medium: String,
    pub confidence_high: String,
    pub validation_warning: String,
    pub text_col: String,
    pub number_col: String,
    pub temporal_col: String,
    pub bool_col: String,
    pub link_col: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub history_limit: usize,
    pub enable_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UiConfig {
    pub controls: ControlsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub custom_controls: Option<Vec<(String, String)>>,
    pub row_count_width: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub show_window: bool,
    pub show_selection: bool,
}

// Default implementations
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.4".to_string(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            search: SearchConfig::default(),
            ui: UiConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            overscan_rows: 4,
            overscan_cols: 2,
            default_column_width: 16,
            min_column_width: 4,
            max_column_width: 80,
            row_numbers: true,
            row_start_index: 1,
            table_cell_padding: 1,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
            rename_debounce_ms: 500,
            search_debounce_ms: 300,
            double_click_ms: 400,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "black".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            text_inverse: "black".to_string(),
            table_header: "white".to_string(),
            table_header_bg: "indexed(236)".to_string(),
            row_numbers: "dark_gray".to_string(),
            column_separator: "indexed(238)".to_string(),
            pinned_divider: "cyan".to_string(),
            selection_bg: "indexed(24)".to_string(),
            selection_border: "cyan".to_string(),
            editing_outline: "yellow".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
            modal_border_error: "red".to_string(),
            confidence_low: "red".to_string(),
            confidence_medium: "yellow".to_string(),
            confidence_high: "green".to_string(),
            validation_warning: "yellow".to_string(),
            text_col: "white".to_string(),
            number_col: "cyan".to_string(),
            temporal_col: "magenta".to_string(),
            bool_col: "green".to_string(),
            link_col: "blue".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            history_limit: 1000,
            enable_history: true,
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            custom_controls: None,
            row_count_width: 20,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            show_window: true,
            show_selection: true,
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = AppConfig::default();

        // Try to load user config (if exists)
        if let Ok(user_config) = Self::load_user_config(app_name) {
            config.merge(user_config);
        }

        config.validate()?;

        Ok(config)
    }

    /// Load user configuration from ~/.config/leadgrid/config.toml
    fn load_user_config(app_name: &str) -> Result<AppConfig> {
        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.search.merge(other.search);
        self.ui.merge(other.ui);
        self.debug.merge(other.debug);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.4") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.4.x",
                self.version
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.display.default_column_width == 0 {
            return Err(eyre!("default_column_width must be greater than 0"));
        }

        if self.display.min_column_width > self.display.max_column_width {
            return Err(eyre!(
                "min_column_width ({}) must not exceed max_column_width ({})",
                self.display.min_column_width,
                self.display.max_column_width
            ));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        // Validate all colors can be parsed
        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.overscan_rows != default.overscan_rows {
            self.overscan_rows = other.overscan_rows;
        }
        if other.overscan_cols != default.overscan_cols {
            self.overscan_cols = other.overscan_cols;
        }
        if other.default_column_width != default.default_column_width {
            self.default_column_width = other.default_column_width;
        }
        if other.min_column_width != default.min_column_width {
            self.min_column_width = other.min_column_width;
        }
        if other.max_column_width != default.max_column_width {
            self.max_column_width = other.max_column_width;
        }
        if other.row_numbers != default.row_numbers {
            self.row_numbers = other.row_numbers;
        }
        if other.row_start_index != default.row_start_index {
            self.row_start_index = other.row_start_index;
        }
        if other.table_cell_padding != default.table_cell_padding {
            self.table_cell_padding = other.table_cell_padding;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
        if other.rename_debounce_ms != default.rename_debounce_ms {
            self.rename_debounce_ms = other.rename_debounce_ms;
        }
        if other.search_debounce_ms != default.search_debounce_ms {
            self.search_debounce_ms = other.search_debounce_ms;
        }
        if other.double_click_ms != default.double_click_ms {
            self.double_click_ms = other.double_click_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    /// Name/value pairs, used for validation and theme construction.
    fn entries(&self) -> [(&'static str, &String); 31] {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("success", &self.success),
            ("error", &self.error),
            ("warning", &self.warning),
            ("dimmed", &self.dimmed),
            ("background", &self.background),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
            ("text_inverse", &self.text_inverse),
            ("table_header", &self.table_header),
            ("table_header_bg", &self.table_header_bg),
            ("row_numbers", &self.row_numbers),
            ("column_separator", &self.column_separator),
            ("pinned_divider", &self.pinned_divider),
            ("selection_bg", &self.selection_bg),
            ("selection_border", &self.selection_border),
            ("editing_outline", &self.editing_outline),
            ("modal_border", &self.modal_border),
            ("modal_border_active", &self.modal_border_active),
            ("modal_border_error", &self.modal_border_error),
            ("confidence_low", &self.confidence_low),
            ("confidence_medium", &self.confidence_medium),
            ("confidence_high", &self.confidence_high),
            ("validation_warning", &self.validation_warning),
            ("text_col", &self.text_col),
            ("number_col", &self.number_col),
            ("temporal_col", &self.temporal_col),
            ("bool_col", &self.bool_col),
            ("link_col", &self.link_col),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let mut merged = HashMap::new();
        for ((name, theirs), (_, defaults)) in other.entries().iter().zip(default.entries()) {
            if *theirs != defaults {
                merged.insert(*name, (*theirs).clone());
            }
        }
        for (name, value) in merged {
            match name {
                "primary" => self.primary = value,
                "secondary" => self.secondary = value,
                "success" => self.success = value,
                "error" => self.error = value,
                "warning" => self.warning = value,
                "dimmed" => self.dimmed = value,
                "background" => self.background = value,
                "controls_bg" => self.controls_bg = value,
                "text_primary" => self.text_primary = value,
                "text_secondary" => self.text_secondary = value,
                "text_inverse" => self.text_inverse = value,
                "table_header" => self.table_header = value,
                "table_header_bg" => self.table_header_bg = value,
                "row_numbers" => self.row_numbers = value,
                "column_separator" => self.column_separator = value,
                "pinned_divider" => self.pinned_divider = value,
                "selection_bg" => self.selection_bg = value,
                "selection_border" => self.selection_border = value,
                "editing_outline" => self.editing_outline = value,
                "modal_border" => self.modal_border = value,
                "modal_border_active" => self.modal_border_active = value,
                "modal_border_error" => self.modal_border_error = value,
                "confidence_low" => self.confidence_low = value,
                "confidence_medium" => self.confidence_medium = value,
                "confidence_high" => self.confidence_high = value,
                "validation_warning" => self.validation_warning = value,
                "text_col" => self.text_col = value,
                "number_col" => self.number_col = value,
                "temporal_col" => self.temporal_col = value,
                "bool_col" => self.bool_col = value,
                "link_col" => self.link_col = value,
                _ => {}
            }
        }
    }
}

impl SearchConfig {
    pub fn merge(&mut self, other: Self) {
        let default = SearchConfig::default();
        if other.history_limit != default.history_limit {
            self.history_limit = other.history_limit;
        }
        if other.enable_history != default.enable_history {
            self.enable_history = other.enable_history;
        }
    }
}

impl UiConfig {
    pub fn merge(&mut self, other: Self) {
        self.controls.merge(other.controls);
    }
}

impl ControlsConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ControlsConfig::default();
        if other.custom_controls.is_some() {
            self.custom_controls = other.custom_controls;
        }
        if other.row_count_width != default.row_count_width {
            self.row_count_width = other.row_count_width;
        }
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.enabled != default.enabled {
            self.enabled = other.enabled;
        }
        if other.show_window != default.show_window {
            self.show_window = other.show_window;
        }
        if other.show_selection != default.show_selection {
            self.show_selection = other.show_selection;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parse a color string (hex or named) and convert to appropriate terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        // Hex format: "#ff0000" or "#FF0000" (6-character hex)
        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        // Indexed colors: "indexed(236)" for explicit 256-color palette
        if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        // Named colors (case-insensitive)
        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            // Basic ANSI colors
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            // Bright variants (256-color palette)
            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            // Gray aliases
            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            // Special modifiers (pass through as Reset - handled specially in rendering)
            "reset" | "reversed" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Convert RGB values to appropriate terminal color based on capabilities
    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest 256-color palette index
/// Uses standard xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    // Check if it's a gray shade (r ≈ g ≈ b)
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // Map to grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16; // Black
        } else if gray > 247 {
            return 231; // White
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // Map to 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    // Simple threshold-based conversion
    let r_bright = r > 128;
    let g_bright = g > 128;
    let b_bright = b > 128;

    // Check for grayscale
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    // Map to primary/secondary colors
    match (r_bright, g_bright, b_bright) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let mut colors = HashMap::new();

        for (name, value) in config.colors.entries() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }

        Ok(Self { colors })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Get a color by name, returns None if not found
    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
