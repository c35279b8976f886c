/// Runtime configuration for the viewer
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/pin-viewer/config.json
/// - macOS: ~/Library/Application Support/pin-viewer/config.json
/// - Windows: %APPDATA%\pin-viewer\config.json
///
/// Every field has a default, so a partial file (or no file at all) is fine.
/// Environment variables override the file for quick testing against
/// another server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ViewerError;

/// Largest page the archive server accepts
pub const MAX_BATCH_SIZE: usize = 100;
/// Smallest allowed `max_image_edge`; roughly one column
const MIN_IMAGE_EDGE: u32 = 256;

/// Geometry knobs for the masonry grid
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Narrowest a column may get before the grid drops a column
    pub min_column_width: f32,
    /// Horizontal gap between columns and vertical gap between cards
    pub gap: f32,
    /// Height/width ratio assumed for an image that has not decoded yet
    pub estimate_ratio: f32,
    /// Height reserved for the info strip in an estimated card
    pub info_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_column_width: 236.0,
            gap: 16.0,
            estimate_ratio: 1.3,
            info_height: 50.0,
        }
    }
}

/// All viewer settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Base address of the archive server
    pub server_url: String,
    /// Pins requested per page (1..=100)
    pub batch_size: usize,
    pub request_timeout_secs: u64,
    /// Also remove the stored image file when deleting a pin
    pub delete_image_files: bool,
    pub layout: LayoutConfig,
    /// Quiet period before a resize triggers a relayout
    pub resize_debounce_ms: u64,
    /// Delay between consecutive cards of a batch fading in
    pub stagger_ms: u64,
    pub fade_ms: u64,
    /// Distance (px) from the bottom at which the sentinel counts as visible
    pub sentinel_margin: f32,
    /// How close to the loaded tail the viewer starts fetching ahead
    pub prefetch_distance: usize,
    /// Longest edge (px) a decoded image is kept at in memory
    pub max_image_edge: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".to_string(),
            batch_size: 50,
            request_timeout_secs: 30,
            delete_image_files: true,
            layout: LayoutConfig::default(),
            resize_debounce_ms: 150,
            stagger_ms: 30,
            fade_ms: 250,
            sentinel_margin: 400.0,
            prefetch_distance: 3,
            max_image_edge: 1600,
        }
    }
}

impl AppConfig {
    /// Load the config file, apply environment overrides and sanitize.
    ///
    /// Never fails: a broken file is reported and replaced by defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("📁 Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("⚠️  Ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.sanitize();
        config
    }

    /// Where the config file lives, if the platform has a config directory
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("pin-viewer");
        path.push("config.json");
        Some(path)
    }

    fn from_file(path: &PathBuf) -> Result<Self, ViewerError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ViewerError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String, ViewerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Override fields from `PIN_VIEWER_SERVER` and `PIN_VIEWER_BATCH_SIZE`
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server) = lookup("PIN_VIEWER_SERVER") {
            self.server_url = server;
        }
        if let Some(raw) = lookup("PIN_VIEWER_BATCH_SIZE") {
            match raw.parse() {
                Ok(size) => self.batch_size = size,
                Err(_) => log::warn!("⚠️  PIN_VIEWER_BATCH_SIZE={} is not a number", raw),
            }
        }
    }

    /// Clamp values into ranges the engine and server accept
    fn sanitize(&mut self) {
        self.batch_size = self.batch_size.clamp(1, MAX_BATCH_SIZE);
        self.layout.min_column_width = self.layout.min_column_width.max(1.0);
        self.layout.gap = self.layout.gap.max(0.0);
        if self.layout.estimate_ratio.is_nan() || self.layout.estimate_ratio <= 0.0 {
            self.layout.estimate_ratio = LayoutConfig::default().estimate_ratio;
        }
        self.layout.info_height = self.layout.info_height.max(0.0);
        self.max_image_edge = self.max_image_edge.max(MIN_IMAGE_EDGE);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}
