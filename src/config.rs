//! Gallery configuration module.
//!
//! Handles loading and validating the optional `config.toml` in the gallery
//! root. Stock defaults are serialized to a TOML table, the user file is
//! merged over it key by key, and the result is deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! reserved_dirs = ["resources", ".git"]  # Top-level dirs that are not sections
//! notebook_extension = "ipynb"           # Files converted in each section
//! manifest_file = "gallery.json"         # Written to the gallery root
//!
//! [build]
//! keep_going = true         # Continue past failing notebooks
//!
//! [thumbnails]
//! extensions = ["png", "jpg"]
//!
//! [html]
//! mathjax = true            # Load MathJax in generated pages
//!
//! [meta]
//! # tool_version = "0.4.0"  # Skip the version command entirely
//! version_command = ["python", "-c", "import sunpy; print(sunpy.__version__)"]
//!
//! [colors.light]
//! background = "#ffffff"
//! text = "#111111"
//! text_muted = "#666666"    # Prompts
//! border = "#e0e0e0"
//! link = "#333333"
//! link_hover = "#000000"
//!
//! [colors.dark]
//! background = "#0a0a0a"
//! text = "#eeeeee"
//! text_muted = "#999999"
//! border = "#333333"
//! link = "#cccccc"
//! link_hover = "#ffffff"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the gallery root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Top-level directories that must exist and are never sections.
    pub reserved_dirs: Vec<String>,
    /// Extension (without the dot) of the notebooks converted in each section.
    pub notebook_extension: String,
    /// File name of the JSON manifest written to the gallery root.
    pub manifest_file: String,
    /// Failure handling.
    pub build: BuildConfig,
    /// Thumbnail selection.
    pub thumbnails: ThumbnailsConfig,
    /// Generated page settings.
    pub html: HtmlConfig,
    /// Manifest metadata.
    pub meta: MetaConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            reserved_dirs: vec!["resources".to_string(), ".git".to_string()],
            notebook_extension: "ipynb".to_string(),
            manifest_file: "gallery.json".to_string(),
            build: BuildConfig::default(),
            thumbnails: ThumbnailsConfig::default(),
            html: HtmlConfig::default(),
            meta: MetaConfig::default(),
            colors: ColorConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in &self.reserved_dirs {
            if dir.is_empty() || dir.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "reserved_dirs entries must be plain directory names, got {dir:?}"
                )));
            }
        }
        if self.notebook_extension.is_empty() || self.notebook_extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "notebook_extension must be non-empty and given without a leading dot".into(),
            ));
        }
        // Pages and thumbnails are written beside the notebook with its
        // extension swapped, which must not land on the notebook itself.
        let ext = &self.notebook_extension;
        if ext.eq_ignore_ascii_case("html")
            || self
                .thumbnails
                .extensions
                .iter()
                .any(|t| t.eq_ignore_ascii_case(ext))
        {
            return Err(ConfigError::Validation(format!(
                "notebook_extension {ext:?} collides with a generated html or thumbnail file"
            )));
        }
        if self.manifest_file.is_empty() {
            return Err(ConfigError::Validation(
                "manifest_file must not be empty".into(),
            ));
        }
        if self.thumbnails.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "thumbnails.extensions must not be empty".into(),
            ));
        }
        if self.meta.tool_version.is_none() && self.meta.version_command.is_empty() {
            return Err(ConfigError::Validation(
                "meta.version_command must not be empty when meta.tool_version is unset".into(),
            ));
        }
        Ok(())
    }
}

/// Failure handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Keep converting after a notebook fails. The manifest is still only
    /// written when every notebook succeeds.
    pub keep_going: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { keep_going: true }
    }
}

/// Thumbnail selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Resource extensions eligible as thumbnails (case-insensitive).
    pub extensions: Vec<String>,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["png".to_string(), "jpg".to_string()],
        }
    }
}

/// Generated page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HtmlConfig {
    /// Include the MathJax loader for `$…$` math in markdown cells.
    pub mathjax: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self { mathjax: true }
    }
}

/// Manifest metadata settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetaConfig {
    /// Fixed tool version recorded in the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    /// Command whose trimmed stdout is the tool version.
    pub version_command: Vec<String>,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            tool_version: None,
            version_command: vec![
                "python".to_string(),
                "-c".to_string(),
                "import sunpy; print(sunpy.__version__)".to_string(),
            ],
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Secondary text color (cell prompts).
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#000000".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#ffffff".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from the gallery root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(root)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# nbgallery Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Top-level directories that must exist in the gallery root and are never
# treated as sections.
reserved_dirs = ["resources", ".git"]

# Extension (without the dot) of the notebooks converted in each section.
notebook_extension = "ipynb"

# Manifest written to the gallery root after a successful build.
manifest_file = "gallery.json"

# ---------------------------------------------------------------------------
# Failure handling
# ---------------------------------------------------------------------------
[build]
# Keep converting the remaining notebooks after one fails. The manifest is
# only written when every notebook succeeds either way.
keep_going = true

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Output image types eligible as a thumbnail. The last eligible image output
# in the notebook is copied verbatim next to it.
extensions = ["png", "jpg"]

# ---------------------------------------------------------------------------
# Generated pages
# ---------------------------------------------------------------------------
[html]
# Load MathJax so $...$ math in markdown cells is typeset.
mathjax = true

# ---------------------------------------------------------------------------
# Manifest metadata
# ---------------------------------------------------------------------------
[meta]
# Fixed version string for meta.sunpy in the manifest. When set, the
# version command below is not run.
# tool_version = "0.4.0"

# Command whose trimmed stdout is recorded as the tool version.
version_command = ["python", "-c", "import sunpy; print(sunpy.__version__)"]

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Cell prompts
border = "#e0e0e0"
link = "#333333"
link_hover = "#000000"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#ffffff"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-link: {light_link};
    --color-link-hover: {light_link_hover};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-link: {dark_link};
        --color-link-hover: {dark_link_hover};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_link = colors.light.link,
        light_link_hover = colors.light.link_hover,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_link = colors.dark.link,
        dark_link_hover = colors.dark.link_hover,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_reserves_resources_and_git() {
        let config = GalleryConfig::default();
        assert_eq!(config.reserved_dirs, vec!["resources", ".git"]);
        assert_eq!(config.notebook_extension, "ipynb");
        assert_eq!(config.manifest_file, "gallery.json");
    }

    #[test]
    fn default_config_thumbnail_extensions() {
        let config = GalleryConfig::default();
        assert_eq!(config.thumbnails.extensions, vec!["png", "jpg"]);
        assert!(config.build.keep_going);
        assert!(config.html.mathjax);
    }

    #[test]
    fn default_config_validates() {
        GalleryConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[colors.light]
background = "#fafafa"
"##;
        let config: GalleryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.colors.light.background, "#fafafa");
        // Default values preserved
        assert_eq!(config.colors.light.text, "#111111");
        assert_eq!(config.reserved_dirs, vec!["resources", ".git"]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result: Result<GalleryConfig, _> = toml::from_str("reserved = []");
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: GalleryConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = GalleryConfig::default();
        assert_eq!(config.reserved_dirs, defaults.reserved_dirs);
        assert_eq!(config.meta.version_command, defaults.meta.version_command);
        assert_eq!(config.colors.dark.link, defaults.colors.dark.link);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn extension_with_leading_dot_is_invalid() {
        let config = GalleryConfig {
            notebook_extension: ".ipynb".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn html_notebook_extension_is_invalid() {
        let config = GalleryConfig {
            notebook_extension: "HTML".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn notebook_extension_matching_thumbnail_is_invalid() {
        let config = GalleryConfig {
            notebook_extension: "png".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_rejects_html_notebook_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "notebook_extension = \"html\"\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn reserved_dir_with_separator_is_invalid() {
        let config = GalleryConfig {
            reserved_dirs: vec!["a/b".to_string()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_thumbnail_extensions_is_invalid() {
        let mut config = GalleryConfig::default();
        config.thumbnails.extensions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_version_command_needs_tool_version() {
        let mut config = GalleryConfig::default();
        config.meta.version_command.clear();
        assert!(config.validate().is_err());

        config.meta.tool_version = Some("1.0".to_string());
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // merge_toml / load_config
    // =========================================================================

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn merge_replaces_arrays_entirely() {
        let base: toml::Value = toml::from_str(r#"v = ["a", "b"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"v = ["c"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["v"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.manifest_file, "gallery.json");
        assert_eq!(config.colors.dark.background, "#0a0a0a");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r##"
reserved_dirs = ["assets", ".git"]

[build]
keep_going = false

[meta]
tool_version = "0.5.1"
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.reserved_dirs, vec!["assets", ".git"]);
        assert!(!config.build.keep_going);
        assert_eq!(config.meta.tool_version.as_deref(), Some("0.5.1"));
        // Unspecified values should be defaults
        assert_eq!(config.thumbnails.extensions, vec!["png", "jpg"]);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_runs_validation() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "manifest_file = \"\"").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // CSS generation
    // =========================================================================

    #[test]
    fn generate_css_uses_config_colors() {
        let mut colors = ColorConfig::default();
        colors.light.background = "#f0f0f0".to_string();
        colors.dark.background = "#1a1a1a".to_string();

        let css = generate_color_css(&colors);
        assert!(css.contains("--color-bg: #f0f0f0"));
        assert!(css.contains("--color-bg: #1a1a1a"));
        assert!(css.contains("@media (prefers-color-scheme: dark)"));
    }
}
