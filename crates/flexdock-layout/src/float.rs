//! Floating windows and their z-order.
//!
//! Floating windows render in an overlay that is a sibling of the docked
//! grid. Each window owns an independent [`RowNode`] tree, so a floated
//! tab-set can hold several tabs and further splits.

use flexdock_core::geometry::Rect;
use serde::{Deserialize, Serialize};

use crate::action::ActionRejection;
use crate::node::{NodeId, RowNode, tagged_row};

/// Last docked location of a floated tab-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockAnchor {
    /// Id of the row the tab-set was removed from.
    pub parent: NodeId,
    /// Position among that row's children.
    pub index: usize,
    pub weight: f64,
}

/// One overlapping window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingWindow {
    #[serde(default, skip_serializing_if = "NodeId::is_unassigned")]
    pub id: NodeId,
    pub rect: Rect,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub maximized: bool,
    #[serde(default)]
    pub z_index: u64,
    #[serde(with = "tagged_row")]
    pub layout: RowNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dock_anchor: Option<DockAnchor>,
}

impl FloatingWindow {
    #[must_use]
    pub fn new(id: impl Into<NodeId>, rect: Rect, layout: RowNode) -> Self {
        Self {
            id: id.into(),
            rect,
            minimized: false,
            maximized: false,
            z_index: 0,
            layout,
            dock_anchor: None,
        }
    }

    /// Neither minimized nor maximized.
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        !self.minimized && !self.maximized
    }
}

/// Ordered floating windows plus a monotonic z counter.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatManager {
    windows: Vec<FloatingWindow>,
    next_z: u64,
}

impl Default for FloatManager {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
            next_z: 1,
        }
    }
}

impl FloatManager {
    /// Adopt loaded windows; the counter resumes above the highest z.
    #[must_use]
    pub fn from_windows(windows: Vec<FloatingWindow>) -> Self {
        let next_z = windows
            .iter()
            .map(|window| window.z_index)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        Self { windows, next_z }
    }

    #[must_use]
    pub fn windows(&self) -> &[FloatingWindow] {
        &self.windows
    }

    pub(crate) fn windows_mut(&mut self) -> &mut Vec<FloatingWindow> {
        &mut self.windows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FloatingWindow> {
        self.windows.iter().find(|window| window.id.as_str() == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut FloatingWindow, ActionRejection> {
        self.windows
            .iter_mut()
            .find(|window| window.id.as_str() == id)
            .ok_or_else(|| ActionRejection::MissingNode { id: NodeId::from(id) })
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.windows.iter().position(|window| window.id.as_str() == id)
    }

    /// The z-index the next raised window receives.
    #[must_use]
    pub const fn next_z(&self) -> u64 {
        self.next_z
    }

    /// The window painted last.
    #[must_use]
    pub fn top(&self) -> Option<&FloatingWindow> {
        self.windows.iter().max_by_key(|window| window.z_index)
    }

    /// Windows sorted by z-index, bottom first.
    #[must_use]
    pub fn in_paint_order(&self) -> Vec<&FloatingWindow> {
        let mut ordered: Vec<&FloatingWindow> = self.windows.iter().collect();
        ordered.sort_by_key(|window| window.z_index);
        ordered
    }

    /// Add a window on top of every other.
    pub fn push(&mut self, mut window: FloatingWindow) {
        window.z_index = self.take_z();
        self.windows.push(window);
    }

    pub fn remove(&mut self, id: &str) -> Option<FloatingWindow> {
        let index = self.position(id)?;
        Some(self.windows.remove(index))
    }

    /// Raise a window to `max + 1`.
    ///
    /// A window already strictly above every other is left alone.
    pub fn bring_to_front(&mut self, id: &str) -> Result<(), ActionRejection> {
        let current = self.get_mut(id)?.z_index;
        let strictly_on_top = self
            .windows
            .iter()
            .filter(|window| window.id.as_str() != id)
            .all(|window| window.z_index < current);
        if strictly_on_top {
            return Err(ActionRejection::NoNetChange);
        }
        let z = self.take_z();
        self.get_mut(id)?.z_index = z;
        Ok(())
    }

    pub fn minimize(&mut self, id: &str) -> Result<(), ActionRejection> {
        let window = self.get_mut(id)?;
        if window.minimized {
            return Err(ActionRejection::NoNetChange);
        }
        window.minimized = true;
        window.maximized = false;
        Ok(())
    }

    pub fn maximize(&mut self, id: &str) -> Result<(), ActionRejection> {
        let window = self.get_mut(id)?;
        if window.maximized {
            return Err(ActionRejection::NoNetChange);
        }
        window.maximized = true;
        window.minimized = false;
        Ok(())
    }

    /// Clear both minimized and maximized.
    pub fn restore(&mut self, id: &str) -> Result<(), ActionRejection> {
        let window = self.get_mut(id)?;
        if window.is_normal() {
            return Err(ActionRejection::NoNetChange);
        }
        window.minimized = false;
        window.maximized = false;
        Ok(())
    }

    /// Move or resize a window.
    pub fn set_rect(&mut self, id: &str, rect: Rect) -> Result<(), ActionRejection> {
        if !rect.is_valid_window() {
            return Err(ActionRejection::InvalidRect { id: NodeId::from(id) });
        }
        let window = self.get_mut(id)?;
        if window.rect == rect {
            return Err(ActionRejection::NoNetChange);
        }
        window.rect = rect;
        Ok(())
    }

    fn take_z(&mut self) -> u64 {
        let z = self.next_z;
        self.next_z = self.next_z.saturating_add(1);
        z
    }
}
