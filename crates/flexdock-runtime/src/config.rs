//! Shell configuration loaded from TOML or JSON.
//!
//! ```toml
//! # flexdock.toml
//! [persistence]
//! namespace = "acme"
//! debounce_ms = 500
//!
//! [drop]
//! edge_fraction = 0.2
//!
//! [motion]
//! reduced_motion = true
//!
//! [zones.left]
//! width = 320.0
//! ```
//!
//! Every field has a default, so a partial file only overrides what it names
//! and `ShellConfig::default()` is a working configuration.

use std::path::Path;
use std::time::Duration;

use flexdock_layout::{
    DEFAULT_DRAG_THRESHOLD_PX, DragSession, DragSessionError, DropThresholds, DropZoneResolver,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::migration::KeySpace;
use crate::zones::{MotionPolicy, Zone, ZoneState};

/// Top-level shell configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub persistence: PersistenceConfig,
    pub drop: DropThresholds,
    pub drag: DragConfig,
    pub motion: MotionConfig,
    pub zones: ZonesConfig,
}

impl ShellConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Problems with the configured values. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(namespace) = &self.persistence.namespace
            && (namespace.trim().is_empty() || namespace.contains(':'))
        {
            errors.push(format!(
                "persistence.namespace must be non-blank and must not contain ':', got {namespace:?}"
            ));
        }
        if self.persistence.debounce_ms > MAX_DEBOUNCE_MS {
            errors.push(format!(
                "persistence.debounce_ms must be <= {MAX_DEBOUNCE_MS}, got {}",
                self.persistence.debounce_ms
            ));
        }

        errors.extend(self.drop.validate());

        if !(self.drag.threshold_px.is_finite() && self.drag.threshold_px >= 0.0) {
            errors.push(format!(
                "drag.threshold_px must be >= 0, got {}",
                self.drag.threshold_px
            ));
        }

        if self.motion.toggle_duration_ms > MAX_TOGGLE_DURATION_MS {
            errors.push(format!(
                "motion.toggle_duration_ms must be <= {MAX_TOGGLE_DURATION_MS}, got {}",
                self.motion.toggle_duration_ms
            ));
        }

        for zone in Zone::DOCKS {
            if let Some(defaults) = self.zones.get(zone)
                && !(defaults.width.is_finite() && defaults.width > 0.0)
            {
                errors.push(format!("zones.{zone}.width must be > 0, got {}", defaults.width));
            }
        }

        errors
    }

    #[must_use]
    pub fn key_space(&self) -> KeySpace {
        KeySpace::new(self.persistence.namespace.clone())
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.persistence.debounce_ms)
    }

    #[must_use]
    pub const fn motion_policy(&self) -> MotionPolicy {
        MotionPolicy {
            reduced_motion: self.motion.reduced_motion,
            duration: Duration::from_millis(self.motion.toggle_duration_ms),
        }
    }

    /// Initial state of a dock zone before anything is loaded.
    #[must_use]
    pub fn zone_state(&self, zone: Zone) -> Option<ZoneState> {
        self.zones
            .get(zone)
            .map(|defaults| ZoneState::new(defaults.visible, defaults.width))
    }

    pub fn drag_session(&self) -> Result<DragSession, DragSessionError> {
        DragSession::new(DropZoneResolver::new(self.drop), self.drag.threshold_px)
    }
}

const MAX_DEBOUNCE_MS: u64 = 60_000;
const MAX_TOGGLE_DURATION_MS: u64 = 10_000;

/// Storage keys and write cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Prefix for every storage key. Default: none.
    pub namespace: Option<String>,
    /// Trailing debounce for writes. Default: 300.
    pub debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pointer travel before a press becomes a drag. Default: 4.
    pub threshold_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Collapse toggle transitions to zero duration.
    pub reduced_motion: bool,
    /// Default: 200.
    pub toggle_duration_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            toggle_duration_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneDefaults {
    #[serde(default = "default_zone_width")]
    pub width: f64,
    #[serde(default)]
    pub visible: bool,
}

fn default_zone_width() -> f64 {
    280.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonesConfig {
    pub left: ZoneDefaults,
    pub right: ZoneDefaults,
    pub bottom: ZoneDefaults,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            left: ZoneDefaults {
                width: 280.0,
                visible: true,
            },
            right: ZoneDefaults {
                width: 280.0,
                visible: false,
            },
            bottom: ZoneDefaults {
                width: 200.0,
                visible: false,
            },
        }
    }
}

impl ZonesConfig {
    /// Defaults for a dock zone; `None` for the center.
    #[must_use]
    pub const fn get(&self, zone: Zone) -> Option<&ZoneDefaults> {
        match zone {
            Zone::Left => Some(&self.left),
            Zone::Right => Some(&self.right),
            Zone::Bottom => Some(&self.bottom),
            Zone::Center => None,
        }
    }
}
