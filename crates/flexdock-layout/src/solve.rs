//! Pixel layout of a model.
//!
//! Borders are carved from the area edges first (top and bottom span the full
//! width), the main tree fills what is left, and floating windows are laid
//! out independently in their own rects.

use flexdock_core::geometry::Rect;
use rustc_hash::FxHashMap;

use crate::model::LayoutModel;
use crate::node::{BorderLocation, LayoutNode, NodeId, Orientation, RowNode, TabLocation, TabSetNode};

/// Draggable gap between two row children.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    pub row: NodeId,
    /// Gap follows the child at this index.
    pub index: usize,
    pub orientation: Orientation,
    pub rect: Rect,
}

/// Result of [`LayoutModel::solve_layout`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedLayout {
    pub area: Rect,
    /// Area left for the main tree after borders.
    pub main: Rect,
    rects: FxHashMap<NodeId, Rect>,
    tab_strips: FxHashMap<NodeId, Rect>,
    borders: Vec<(BorderLocation, Rect)>,
    splitters: Vec<Splitter>,
    /// Visible windows, bottom first.
    windows: Vec<(NodeId, Rect)>,
}

impl SolvedLayout {
    /// Rect of a row, tab-set or window.
    #[must_use]
    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.rects.get(id).copied()
    }

    #[must_use]
    pub fn tab_strip(&self, id: &str) -> Option<Rect> {
        self.tab_strips.get(id).copied()
    }

    #[must_use]
    pub fn border(&self, location: BorderLocation) -> Option<Rect> {
        self.borders
            .iter()
            .find(|(candidate, _)| *candidate == location)
            .map(|(_, rect)| *rect)
    }

    #[must_use]
    pub fn splitters(&self) -> &[Splitter] {
        &self.splitters
    }

    #[must_use]
    pub fn windows(&self) -> &[(NodeId, Rect)] {
        &self.windows
    }
}

impl LayoutModel {
    /// Compute pixel rectangles for everything visible in `area`.
    #[must_use]
    pub fn solve_layout(&self, area: Rect) -> SolvedLayout {
        let mut solved = SolvedLayout {
            area,
            ..SolvedLayout::default()
        };

        let mut remaining = area;
        for location in [
            BorderLocation::Top,
            BorderLocation::Bottom,
            BorderLocation::Left,
            BorderLocation::Right,
        ] {
            let thickness = self.border_thickness(location, &remaining);
            if thickness <= 0.0 {
                continue;
            }
            let (border, rest) = carve(remaining, location, thickness);
            solved.borders.push((location, border));
            remaining = rest;
        }
        solved.main = remaining;

        match self.maximized_tabset() {
            Some(tabset) => self.place_tabset(tabset, remaining, &mut solved),
            None => self.place_row(&self.root, remaining, &mut solved),
        }

        for window in self.floating.in_paint_order() {
            if window.minimized {
                continue;
            }
            let rect = if window.maximized { area } else { window.rect };
            solved.rects.insert(window.id.clone(), rect);
            solved.windows.push((window.id.clone(), rect));
            self.place_row(&window.layout, rect, &mut solved);
        }
        solved
    }

    fn border_thickness(&self, location: BorderLocation, available: &Rect) -> f64 {
        let border = self.borders.get(location);
        if border.children.is_empty() {
            return 0.0;
        }
        let mut thickness = self.attributes.border_bar_size;
        if !border.is_collapsed() {
            thickness += border.size;
        }
        let limit = if location.spans_width() {
            available.height
        } else {
            available.width
        };
        thickness.clamp(0.0, limit.max(0.0))
    }

    fn place_row(&self, row: &RowNode, rect: Rect, solved: &mut SolvedLayout) {
        solved.rects.insert(row.id.clone(), rect);
        let count = row.children.len();
        if count == 0 {
            return;
        }
        let horizontal = row.orientation == Orientation::Horizontal;
        let extent = if horizontal { rect.width } else { rect.height };
        let gap = self.attributes.splitter_size;
        let gaps = gap * (count - 1) as f64;
        let available = (extent - gaps).max(0.0);
        let total = row.total_weight();

        let mut offset = if horizontal { rect.x } else { rect.y };
        for (index, child) in row.children.iter().enumerate() {
            let share = if total > 0.0 {
                available * child.weight() / total
            } else {
                available / count as f64
            };
            let child_rect = if horizontal {
                Rect::new(offset, rect.y, share, rect.height)
            } else {
                Rect::new(rect.x, offset, rect.width, share)
            };
            match child {
                LayoutNode::Row(nested) => self.place_row(nested, child_rect, solved),
                LayoutNode::TabSet(tabset) => self.place_tabset(tabset, child_rect, solved),
            }
            offset += share;
            if index + 1 < count {
                let splitter = if horizontal {
                    Rect::new(offset, rect.y, gap, rect.height)
                } else {
                    Rect::new(rect.x, offset, rect.width, gap)
                };
                solved.splitters.push(Splitter {
                    row: row.id.clone(),
                    index,
                    orientation: row.orientation,
                    rect: splitter,
                });
                offset += gap;
            }
        }
    }

    fn place_tabset(&self, tabset: &TabSetNode, rect: Rect, solved: &mut SolvedLayout) {
        solved.rects.insert(tabset.id.clone(), rect);
        if !self.tabset_enable_tab_strip(tabset) {
            return;
        }
        let height = self.attributes.tab_strip_height.min(rect.height);
        let strip = match tabset.tab_location.unwrap_or_default() {
            TabLocation::Top => Rect::new(rect.x, rect.y, rect.width, height),
            TabLocation::Bottom => Rect::new(rect.x, rect.bottom() - height, rect.width, height),
        };
        solved.tab_strips.insert(tabset.id.clone(), strip);
    }
}

/// Split `thickness` off the `location` side of `rect`.
fn carve(rect: Rect, location: BorderLocation, thickness: f64) -> (Rect, Rect) {
    match location {
        BorderLocation::Top => (
            Rect::new(rect.x, rect.y, rect.width, thickness),
            Rect::new(rect.x, rect.y + thickness, rect.width, rect.height - thickness),
        ),
        BorderLocation::Bottom => (
            Rect::new(rect.x, rect.bottom() - thickness, rect.width, thickness),
            Rect::new(rect.x, rect.y, rect.width, rect.height - thickness),
        ),
        BorderLocation::Left => (
            Rect::new(rect.x, rect.y, thickness, rect.height),
            Rect::new(rect.x + thickness, rect.y, rect.width - thickness, rect.height),
        ),
        BorderLocation::Right => (
            Rect::new(rect.right() - thickness, rect.y, thickness, rect.height),
            Rect::new(rect.x, rect.y, rect.width - thickness, rect.height),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use serde_json::json;

    fn model() -> LayoutModel {
        LayoutModel::from_value(json!({
            "global": {"splitterSize": 10, "borderBarSize": 20, "tabStripHeight": 25},
            "layout": {"type": "row", "id": "root", "children": [
                {"type": "tabset", "id": "a", "weight": 1, "children": [{"id": "t1", "name": "One"}]},
                {"type": "tabset", "id": "b", "weight": 3, "children": [{"id": "t2", "name": "Two"}]}
            ]},
            "borders": [
                {"location": "bottom", "selected": 0, "size": 100,
                 "children": [{"id": "log", "name": "Log"}]},
                {"location": "left", "children": [{"id": "files", "name": "Files"}]}
            ]
        }))
        .expect("model")
    }

    #[test]
    fn borders_are_carved_before_the_main_tree() {
        let solved = model().solve_layout(Rect::new(0.0, 0.0, 1000.0, 600.0));
        assert_eq!(solved.border(BorderLocation::Bottom), Some(Rect::new(0.0, 480.0, 1000.0, 120.0)));
        assert_eq!(solved.border(BorderLocation::Left), Some(Rect::new(0.0, 0.0, 20.0, 480.0)));
        assert_eq!(solved.border(BorderLocation::Top), None);
        assert_eq!(solved.main, Rect::new(20.0, 0.0, 980.0, 480.0));
    }

    #[test]
    fn weights_split_space_after_splitters() {
        let solved = model().solve_layout(Rect::new(0.0, 0.0, 1000.0, 600.0));
        // 980 wide minus one 10px splitter, split 1:3.
        assert_eq!(solved.rect("a"), Some(Rect::new(20.0, 0.0, 242.5, 480.0)));
        assert_eq!(solved.rect("b"), Some(Rect::new(272.5, 0.0, 727.5, 480.0)));
        assert_eq!(solved.splitters().len(), 1);
        assert_eq!(solved.splitters()[0].rect, Rect::new(262.5, 0.0, 10.0, 480.0));
        assert_eq!(solved.tab_strip("b"), Some(Rect::new(272.5, 0.0, 727.5, 25.0)));
    }

    #[test]
    fn maximized_tabset_fills_main_area() {
        let maximized = model()
            .apply(Action::MaximizeToggle { tabset_id: "b".into() })
            .expect("maximize");
        let solved = maximized.solve_layout(Rect::new(0.0, 0.0, 1000.0, 600.0));
        assert_eq!(solved.rect("b"), Some(solved.main));
        assert_eq!(solved.rect("a"), None);
    }

    #[test]
    fn floating_windows_use_their_own_rect() {
        let floated = model()
            .apply(Action::FloatTabset {
                tabset_id: "a".into(),
                rect: Rect::new(50.0, 60.0, 300.0, 200.0),
            })
            .expect("float");
        let solved = floated.solve_layout(Rect::new(0.0, 0.0, 1000.0, 600.0));
        let (window_id, rect) = solved.windows()[0].clone();
        assert_eq!(rect, Rect::new(50.0, 60.0, 300.0, 200.0));
        assert_eq!(solved.rect("a"), Some(rect));

        let maximized = floated
            .apply(Action::MaximizeWindow { window_id })
            .expect("maximize window");
        let solved = maximized.solve_layout(Rect::new(0.0, 0.0, 1000.0, 600.0));
        assert_eq!(solved.windows()[0].1, Rect::new(0.0, 0.0, 1000.0, 600.0));
    }
}
