//! Dock zones and their visibility state.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use flexdock_core::keybinding::DockShortcut;
use serde::{Deserialize, Serialize};

/// One of the four persisted regions of the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Left,
    Right,
    Bottom,
    Center,
}

impl Zone {
    pub const ALL: [Self; 4] = [Self::Left, Self::Right, Self::Bottom, Self::Center];

    /// Zones that can be shown and hidden.
    pub const DOCKS: [Self; 3] = [Self::Left, Self::Right, Self::Bottom];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Center => "center",
        }
    }

    #[must_use]
    pub const fn is_dock(self) -> bool {
        !matches!(self, Self::Center)
    }

    #[must_use]
    pub const fn from_shortcut(shortcut: DockShortcut) -> Self {
        match shortcut {
            DockShortcut::ToggleLeft => Self::Left,
            DockShortcut::ToggleRight => Self::Right,
            DockShortcut::ToggleBottom => Self::Bottom,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for [`Zone::from_str`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownZone(pub String);

impl fmt::Display for UnknownZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown zone {:?}", self.0)
    }
}

impl std::error::Error for UnknownZone {}

impl FromStr for Zone {
    type Err = UnknownZone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "bottom" => Ok(Self::Bottom),
            "center" => Ok(Self::Center),
            other => Err(UnknownZone(other.to_owned())),
        }
    }
}

/// Visibility and size of a dock zone.
///
/// Hiding keeps the width so showing again restores it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    pub visible: bool,
    /// Pixel width (height for the bottom zone).
    pub width: f64,
}

impl ZoneState {
    #[must_use]
    pub const fn new(visible: bool, width: f64) -> Self {
        Self { visible, width }
    }

    /// Flip visibility.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Set the width; non-finite or non-positive values are ignored.
    pub fn set_width(&mut self, width: f64) -> bool {
        if width.is_finite() && width > 0.0 && width != self.width {
            self.width = width;
            return true;
        }
        false
    }
}

/// What the renderer should animate after a toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneTransition {
    pub zone: Zone,
    pub visible: bool,
    pub width: f64,
    /// Zero under the reduced-motion preference.
    pub duration: Duration,
}

/// Animation preference for toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionPolicy {
    pub reduced_motion: bool,
    pub duration: Duration,
}

impl MotionPolicy {
    #[must_use]
    pub const fn transition_duration(&self) -> Duration {
        if self.reduced_motion {
            Duration::ZERO
        } else {
            self.duration
        }
    }

    #[must_use]
    pub fn transition(&self, zone: Zone, state: ZoneState) -> ZoneTransition {
        ZoneTransition {
            zone,
            visible: state.visible,
            width: state.width,
            duration: self.transition_duration(),
        }
    }
}
