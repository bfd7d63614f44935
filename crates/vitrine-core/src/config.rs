use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Discrete section navigation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Structural marker shared by every full-viewport section
    #[serde(default = "default_section_marker")]
    pub section_marker: String,
    /// Minimum viewport width (logical pixels) for wheel snapping
    #[serde(default = "default_min_viewport_width")]
    pub min_viewport_width: f64,
    /// Delay before the wheel listener is installed
    #[serde(default = "default_mount_delay")]
    pub mount_delay_ms: u64,
    /// Time the scroll lock is held after a jump
    #[serde(default = "default_settle")]
    pub settle_ms: u64,
    /// Install/remove the listener when the viewport crosses the width threshold
    #[serde(default = "default_true")]
    pub reevaluate_on_resize: bool,
    /// Release the lock on the host's scroll-end signal when one is provided
    #[serde(default)]
    pub release_on_scroll_end: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            section_marker: default_section_marker(),
            min_viewport_width: default_min_viewport_width(),
            mount_delay_ms: default_mount_delay(),
            settle_ms: default_settle(),
            reevaluate_on_resize: default_true(),
            release_on_scroll_end: false,
        }
    }
}

impl NavigatorConfig {
    pub fn mount_delay(&self) -> Duration {
        Duration::from_millis(self.mount_delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Pinned reveal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Wait before re-measuring a reveal panel that reported zero height
    #[serde(default = "default_remeasure_delay")]
    pub remeasure_delay_ms: u64,
    /// Destroy and rebuild the binding whenever layout is invalidated
    #[serde(default = "default_true")]
    pub rebuild_on_invalidate: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            remeasure_delay_ms: default_remeasure_delay(),
            rebuild_on_invalidate: default_true(),
        }
    }
}

impl RevealConfig {
    pub fn remeasure_delay(&self) -> Duration {
        Duration::from_millis(self.remeasure_delay_ms)
    }
}

/// Easing curve for smooth scroll animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EasingType {
    None,
    Linear,
    #[default]
    Cubic,
    Quintic,
    #[serde(alias = "ease-out")]
    EaseOut,
}

/// Smooth scroll-into-view animation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_true")]
    pub smooth_enabled: bool,
    #[serde(default = "default_animation_duration")]
    pub animation_duration_ms: u64,
    #[serde(default)]
    pub easing: EasingType,
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth_enabled: default_true(),
            animation_duration_ms: default_animation_duration(),
            easing: EasingType::default(),
            animation_fps: default_animation_fps(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_section_marker() -> String {
    "section".to_string()
}

fn default_min_viewport_width() -> f64 {
    768.0
}

fn default_mount_delay() -> u64 {
    500
}

fn default_settle() -> u64 {
    800
}

fn default_remeasure_delay() -> u64 {
    150
}

fn default_animation_duration() -> u64 {
    600
}

fn default_animation_fps() -> u32 {
    60
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, defaults when it does not exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            debug!(path = %path.display(), "Loading configuration");
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), "Configuration saved");

        Ok(())
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/vitrine/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("vitrine")
            .join("config.toml")
    }
}
