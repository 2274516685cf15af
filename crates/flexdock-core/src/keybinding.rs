#![forbid(unsafe_code)]

//! Dock shortcut mapping.
//!
//! Maps raw [`KeyEvent`]s to high-level [`DockShortcut`]s. "Command" means
//! Ctrl on Linux/Windows and Cmd (Super) on macOS; either is accepted so the
//! host does not have to know the platform.
//!
//! | Keys                  | Shortcut        |
//! |-----------------------|-----------------|
//! | Command+B             | `ToggleLeft`    |
//! | Command+Shift+B       | `ToggleRight`   |
//! | Command+J             | `ToggleBottom`  |
//!
//! # Example
//!
//! ```
//! use flexdock_core::event::{KeyCode, KeyEvent, Modifiers};
//! use flexdock_core::keybinding::{DockShortcut, ShortcutMapper};
//!
//! let mapper = ShortcutMapper::default();
//! let event = KeyEvent::new(KeyCode::Char('b')).with_modifiers(Modifiers::CTRL);
//! assert_eq!(mapper.map(&event), Some(DockShortcut::ToggleLeft));
//! ```

use crate::event::{KeyEvent, KeyEventKind, Modifiers};

/// High-level dock commands produced by the shortcut mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DockShortcut {
    ToggleLeft,
    ToggleRight,
    ToggleBottom,
}

/// Shortcut mapper configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutConfig {
    /// Master switch; when false every event maps to `None`.
    pub enabled: bool,
    /// Treat key-repeat events as presses.
    pub accept_repeat: bool,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            accept_repeat: false,
        }
    }
}

/// Maps key events to dock shortcuts.
#[derive(Debug, Clone, Default)]
pub struct ShortcutMapper {
    config: ShortcutConfig,
}

impl ShortcutMapper {
    /// Create a mapper with explicit configuration.
    #[must_use]
    pub const fn new(config: ShortcutConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> ShortcutConfig {
        self.config
    }

    /// Map a key event to a dock shortcut.
    ///
    /// Returns `None` for events that are not dock shortcuts; the caller
    /// should forward those to the focused panel.
    #[must_use]
    pub fn map(&self, event: &KeyEvent) -> Option<DockShortcut> {
        if !self.config.enabled {
            return None;
        }
        match event.kind {
            KeyEventKind::Press => {}
            KeyEventKind::Repeat if self.config.accept_repeat => {}
            _ => return None,
        }
        if !event.command() || event.alt() {
            return None;
        }

        // Shift+B arrives as 'B' on most hosts; the shift flag decides.
        let shift = event.modifiers.contains(Modifiers::SHIFT);
        if event.is_char_ignore_case('b') {
            return Some(if shift {
                DockShortcut::ToggleRight
            } else {
                DockShortcut::ToggleLeft
            });
        }
        if event.is_char_ignore_case('j') && !shift {
            return Some(DockShortcut::ToggleBottom);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::KeyCode;

    fn key(c: char, modifiers: Modifiers) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c)).with_modifiers(modifiers)
    }

    #[test]
    fn ctrl_b_toggles_left() {
        let mapper = ShortcutMapper::default();
        assert_eq!(
            mapper.map(&key('b', Modifiers::CTRL)),
            Some(DockShortcut::ToggleLeft)
        );
    }

    #[test]
    fn cmd_shift_b_toggles_right() {
        let mapper = ShortcutMapper::default();
        assert_eq!(
            mapper.map(&key('B', Modifiers::SUPER | Modifiers::SHIFT)),
            Some(DockShortcut::ToggleRight)
        );
    }

    #[test]
    fn ctrl_j_toggles_bottom() {
        let mapper = ShortcutMapper::default();
        assert_eq!(
            mapper.map(&key('j', Modifiers::CTRL)),
            Some(DockShortcut::ToggleBottom)
        );
        assert_eq!(mapper.map(&key('j', Modifiers::CTRL | Modifiers::SHIFT)), None);
    }

    #[test]
    fn plain_keys_pass_through() {
        let mapper = ShortcutMapper::default();
        assert_eq!(mapper.map(&key('b', Modifiers::NONE)), None);
        assert_eq!(mapper.map(&key('b', Modifiers::CTRL | Modifiers::ALT)), None);
        assert_eq!(mapper.map(&key('x', Modifiers::CTRL)), None);
    }

    #[test]
    fn release_and_repeat_are_ignored_by_default() {
        let mapper = ShortcutMapper::default();
        let release = key('b', Modifiers::CTRL).with_kind(KeyEventKind::Release);
        let repeat = key('b', Modifiers::CTRL).with_kind(KeyEventKind::Repeat);
        assert_eq!(mapper.map(&release), None);
        assert_eq!(mapper.map(&repeat), None);

        let lenient = ShortcutMapper::new(ShortcutConfig {
            accept_repeat: true,
            ..ShortcutConfig::default()
        });
        assert_eq!(lenient.map(&repeat), Some(DockShortcut::ToggleLeft));
    }

    #[test]
    fn disabled_mapper_maps_nothing() {
        let mapper = ShortcutMapper::new(ShortcutConfig {
            enabled: false,
            ..ShortcutConfig::default()
        });
        assert_eq!(mapper.map(&key('b', Modifiers::CTRL)), None);
    }
}
