//! Export configuration.
//!
//! A single [`ExportConfig`] value is resolved once at startup (defaults,
//! optionally overridden by a TOML file and CLI flags) and then passed
//! explicitly to every component that needs it.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options controlling a library export.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Library identifier ("0" for the local user library).
    pub library_id: String,

    /// Library type: "user" or "group".
    pub library_type: String,

    /// Directory holding imported attachment files (`<storage>/<key>/<file>`).
    pub storage_dir: PathBuf,

    /// Directory for downloaded images and generated screenshots.
    pub cache_dir: PathBuf,

    /// Output document path.
    pub output: PathBuf,

    /// Base URL of the local HTTP API.
    pub api_base_url: String,

    /// Whether to add the metadata line under each item title.
    pub embed_metadata: bool,

    /// Maximum image width in inches (page image-width limit).
    pub max_image_width: f32,

    /// Width cap in inches for images embedded inside notes.
    pub inline_image_cap: f32,

    /// Add, parse and download images.
    pub enable_images: bool,

    /// Add HTML snapshots (rendered to screenshots).
    pub enable_webpages: bool,

    /// Download remote images referenced from note bodies.
    pub download_note_images: bool,

    /// Deepest heading level used for item titles.
    pub max_heading_depth: u8,

    /// Timeout for remote downloads, in seconds.
    pub download_timeout_secs: u64,

    /// Screenshot command for HTML snapshots.
    pub snapshot_command: String,

    /// Output styling.
    pub styling: Styling,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache_root = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            library_id: "0".to_string(),
            library_type: "user".to_string(),
            storage_dir: home.join("Zotero").join("storage"),
            cache_dir: cache_root.join("unzotero"),
            output: PathBuf::from("zotero_library_export.docx"),
            api_base_url: "http://localhost:23119/api".to_string(),
            embed_metadata: true,
            max_image_width: 6.0,
            inline_image_cap: 3.0,
            enable_images: true,
            enable_webpages: true,
            download_note_images: false,
            max_heading_depth: 3,
            download_timeout_secs: 10,
            snapshot_command: "wkhtmltoimage".to_string(),
            styling: Styling::default(),
        }
    }
}

impl ExportConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ExportConfig = toml::from_str(text)?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Location of the per-user configuration file
    /// (`<config dir>/unzotero/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("unzotero").join("config.toml"))
    }

    /// Loads `path` if given, else the per-user file if it exists, else the
    /// defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path().filter(|p| p.is_file()) {
            Some(path) => {
                log::debug!("using configuration {}", path.display());
                Self::load(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Sets the attachment storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Sets the media cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the output document path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    /// Enables or disables image handling.
    pub fn with_images(mut self, enabled: bool) -> Self {
        self.enable_images = enabled;
        self
    }

    /// Enables or disables HTML snapshots.
    pub fn with_webpages(mut self, enabled: bool) -> Self {
        self.enable_webpages = enabled;
        self
    }

    /// Enables downloading of remote images found in notes.
    pub fn with_note_image_downloads(mut self, enabled: bool) -> Self {
        self.download_note_images = enabled;
        self
    }

    /// Disables the metadata line under item titles.
    pub fn without_metadata(mut self) -> Self {
        self.embed_metadata = false;
        self
    }

    /// Sets the maximum image width in inches.
    pub fn with_max_image_width(mut self, inches: f32) -> Self {
        self.max_image_width = inches;
        self
    }

    /// Sets the deepest heading level for item titles (clamped to 1-6).
    pub fn with_max_heading_depth(mut self, level: u8) -> Self {
        self.max_heading_depth = level.clamp(1, 6);
        self
    }

    /// Width used for images embedded in note bodies.
    pub fn inline_image_width(&self) -> f32 {
        self.inline_image_cap.min(self.max_image_width)
    }

    /// Checks the setup conditions that must hold before any document work.
    pub fn validate(&self) -> Result<()> {
        if !self.storage_dir.is_dir() {
            return Err(Error::MissingStorage(self.storage_dir.clone()));
        }
        if self.max_image_width <= 0.0 || self.inline_image_cap <= 0.0 {
            return Err(Error::Config("image widths must be positive".into()));
        }
        if !matches!(self.library_type.as_str(), "user" | "group") {
            return Err(Error::Config(format!(
                "library_type must be 'user' or 'group', got '{}'",
                self.library_type
            )));
        }
        Ok(())
    }
}

/// Fonts, sizes and colours for the output document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Styling {
    /// Main font for normal text.
    pub font_name: String,
    /// Normal text size in points.
    pub normal_text_size: f32,
    /// Note heading formats, h1 through h6.
    pub headings: [HeadingFormat; 6],
    /// Divider (horizontal rule) thickness in points.
    pub divider_size: f32,
    /// Code block font.
    pub code_font_name: String,
    /// Code block font size in points.
    pub code_font_size: f32,
    /// Code block background colour (RGB hex).
    pub code_background: String,
    /// Text colour (RGB hex).
    pub text_color: String,
    /// Hyperlink colour (RGB hex).
    pub hyperlink_color: String,
    /// Small/metadata text size in points.
    pub small_text_size: f32,
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            font_name: "Calibri".to_string(),
            normal_text_size: 11.0,
            headings: [
                HeadingFormat::new(16.0, true, false),
                HeadingFormat::new(14.0, true, false),
                HeadingFormat::new(12.0, true, false),
                HeadingFormat::new(11.0, true, false),
                HeadingFormat::new(10.0, true, true),
                HeadingFormat::new(10.0, false, true),
            ],
            divider_size: 2.0,
            code_font_name: "Courier New".to_string(),
            code_font_size: 10.0,
            code_background: "F0F0F0".to_string(),
            text_color: "000000".to_string(),
            hyperlink_color: "0563C1".to_string(),
            small_text_size: 8.0,
        }
    }
}

impl Styling {
    /// Returns the format for a heading level; levels outside 1-6 are clamped.
    pub fn heading(&self, level: u8) -> &HeadingFormat {
        let index = level.clamp(1, 6) as usize - 1;
        &self.headings[index]
    }
}

/// Size and weight of one heading level.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HeadingFormat {
    /// Font size in points.
    pub size: f32,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl HeadingFormat {
    pub const fn new(size: f32, bold: bool, italic: bool) -> Self {
        Self { size, bold, italic }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_heading_table() {
        let styling = Styling::default();
        assert!(styling.heading(1).bold);
        assert!(styling.heading(1).size > styling.heading(4).size);
        // h5 is bold and italic, h6 italic only
        assert!(styling.heading(5).bold && styling.heading(5).italic);
        assert!(!styling.heading(6).bold && styling.heading(6).italic);
        assert!(styling.heading(6).size <= styling.heading(5).size);
        // Out of range levels clamp
        assert_eq!(styling.heading(0), styling.heading(1));
        assert_eq!(styling.heading(9), styling.heading(6));
    }

    #[test]
    fn test_inline_image_width_is_capped() {
        let config = ExportConfig::default();
        assert_eq!(config.inline_image_width(), 3.0);

        let narrow = ExportConfig::default().with_max_image_width(2.0);
        assert_eq!(narrow.inline_image_width(), 2.0);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ExportConfig::from_toml_str(
            r#"
            enable_images = false
            max_image_width = 5.5

            [styling]
            font_name = "Arial"
            "#,
        )
        .unwrap();

        assert!(!config.enable_images);
        assert_eq!(config.max_image_width, 5.5);
        assert_eq!(config.styling.font_name, "Arial");
        // Untouched keys keep their defaults
        assert!(config.enable_webpages);
        assert_eq!(config.styling.small_text_size, 8.0);
    }

    #[test]
    fn test_from_toml_invalid() {
        let result = ExportConfig::from_toml_str("enable_images = \"yes\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_missing_storage() {
        let config = ExportConfig::default().with_storage_dir("/definitely/not/here");
        assert!(matches!(config.validate(), Err(Error::MissingStorage(_))));
    }

    #[test]
    fn test_validate_ok() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::default().with_storage_dir(dir.path());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "library_id = \"7\"\n").unwrap();
        assert_eq!(ExportConfig::resolve(Some(&path)).unwrap().library_id, "7");
        assert!(matches!(
            ExportConfig::resolve(Some(&dir.path().join("missing.toml"))),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_max_heading_depth_clamped() {
        assert_eq!(ExportConfig::new().with_max_heading_depth(0).max_heading_depth, 1);
        assert_eq!(ExportConfig::new().with_max_heading_depth(9).max_heading_depth, 6);
    }
}
