//! Folio configuration system
//!
//! Centralized settings for the fixed-layout reader, loaded from `folio.toml`
//! with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised while reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure for Folio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FolioConfig {
    /// Spread pairing and viewport fitting
    pub layout: LayoutConfig,
    /// Background prerendering and the spread cache
    pub preload: PreloadConfig,
    /// Annotation overlay settings
    pub overlay: OverlayConfig,
}

/// Layout engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// `fit-page`, `fit-width`, or a fixed numeric scale such as `1.5`
    pub zoom: String,
    /// User scale factor as a percentage (100 = no extra scaling)
    pub scale_factor: f32,
    /// Pagination mode override (`none`, `auto`, `landscape`, `portrait`, `both`).
    /// `None` defers to the book's rendition properties.
    pub spread: Option<String>,
    /// Viewport height/width ratio above which a single page is shown
    pub portrait_threshold: f32,
    /// Open unhinted books on a recto, leaving the first leading page blank
    pub first_page_blank: bool,
}

/// Prefetch cache and preload scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Maximum number of rendered spreads kept in memory
    pub max_cached_spreads: usize,
    /// Spreads to render ahead of (and behind) the current one
    pub prerendered_spreads: usize,
    /// Upper bound on background renders in flight
    pub max_concurrent_preloads: usize,
}

/// Overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Slack in CSS pixels around annotation rects when hit-testing
    pub hit_tolerance: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            zoom: "fit-page".to_string(),
            scale_factor: 100.0,
            spread: None,
            // Unfolded devices are slightly taller than wide and still get two pages.
            portrait_threshold: 1.2,
            first_page_blank: false,
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_cached_spreads: 2,
            prerendered_spreads: 1,
            max_concurrent_preloads: 1,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self { hit_tolerance: 5.0 }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

impl FolioConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `folio.toml` in the current directory,
    /// or return defaults if the file doesn't exist or is invalid.
    pub fn load_or_default() -> Self {
        match Self::load_from_file("folio.toml") {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default configuration");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        // Layout settings
        if let Ok(zoom) = std::env::var("FOLIO_ZOOM") {
            self.layout.zoom = zoom;
        }
        if let Some(factor) = env_parse::<f32>("FOLIO_SCALE_FACTOR") {
            self.layout.scale_factor = factor;
        }
        if let Ok(spread) = std::env::var("FOLIO_SPREAD") {
            self.layout.spread = Some(spread);
        }
        if let Some(threshold) = env_parse::<f32>("FOLIO_PORTRAIT_THRESHOLD") {
            self.layout.portrait_threshold = threshold;
        }
        if let Ok(val) = std::env::var("FOLIO_FIRST_PAGE_BLANK") {
            self.layout.first_page_blank = env_flag(&val);
        }

        // Preload settings
        if let Some(max) = env_parse::<usize>("FOLIO_MAX_CACHED_SPREADS") {
            self.preload.max_cached_spreads = max;
        }
        if let Some(count) = env_parse::<usize>("FOLIO_PRERENDERED_SPREADS") {
            self.preload.prerendered_spreads = count;
        }
        if let Some(max) = env_parse::<usize>("FOLIO_MAX_CONCURRENT_PRELOADS") {
            self.preload.max_concurrent_preloads = max;
        }

        // Overlay settings
        if let Some(tolerance) = env_parse::<f32>("FOLIO_HIT_TOLERANCE") {
            self.overlay.hit_tolerance = tolerance;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from folio.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}
