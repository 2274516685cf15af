//! Drop-zone classification.
//!
//! [`DropZoneResolver`] maps a pointer over a candidate target to a discrete
//! [`DropOutcome`] (target, location, insertion index) or to nothing, and
//! turns an outcome into the [`Action`] the dispatcher applies on release.
//!
//! Geometry is supplied by the caller: the target's bounding rect, its tab
//! strip and its tab buttons, all in the same coordinate space as the pointer.

use flexdock_core::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::action::{Action, END_INDEX, NodeDefinition};
use crate::model::{LayoutModel, NodeAddress, TabParent};
use crate::node::{BorderLocation, DockLocation, NodeId, TabNode};

/// Payload string an external drag source must carry.
pub const EXTERNAL_DRAG_SENTINEL: &str = "application/x-flexdock-tab";

/// Default fraction of a target's width/height used for each edge band.
pub const DEFAULT_EDGE_FRACTION: f64 = 0.25;

/// Default distance from the layout's outer edge that triggers edge docking.
pub const DEFAULT_LAYOUT_EDGE_PX: f64 = 10.0;

/// Tunable classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropThresholds {
    /// Edge band size as a fraction of the target size, per side.
    pub edge_fraction: f64,
    /// Edge band of the whole layout in pixels.
    pub layout_edge_px: f64,
}

impl Default for DropThresholds {
    fn default() -> Self {
        Self {
            edge_fraction: DEFAULT_EDGE_FRACTION,
            layout_edge_px: DEFAULT_LAYOUT_EDGE_PX,
        }
    }
}

impl DropThresholds {
    /// Problems with the configured values, empty when usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.edge_fraction.is_finite() && self.edge_fraction > 0.0 && self.edge_fraction < 0.5) {
            errors.push(format!(
                "drop.edge_fraction must be in (0, 0.5), got {}",
                self.edge_fraction
            ));
        }
        if !(self.layout_edge_px.is_finite() && self.layout_edge_px >= 0.0) {
            errors.push(format!(
                "drop.layout_edge_px must be a non-negative number, got {}",
                self.layout_edge_px
            ));
        }
        errors
    }
}

/// Allowed drag effects, as advertised by the drag transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragEffect {
    None,
    Copy,
    Move,
    Link,
    CopyMove,
    CopyLink,
    LinkMove,
    All,
}

impl DragEffect {
    /// Permits both copy and move.
    #[must_use]
    pub const fn allows_copy_move(self) -> bool {
        matches!(self, Self::CopyMove | Self::All)
    }
}

/// A drag that started outside the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDrag {
    pub payload: String,
    pub effect: DragEffect,
    /// Tab synthesized on drop.
    pub definition: TabNode,
}

impl ExternalDrag {
    /// External drag carrying the sentinel and `copyMove`.
    #[must_use]
    pub fn new(definition: TabNode) -> Self {
        Self {
            payload: EXTERNAL_DRAG_SENTINEL.to_owned(),
            effect: DragEffect::CopyMove,
            definition,
        }
    }

    #[must_use]
    pub fn is_recognized(&self) -> bool {
        self.payload == EXTERNAL_DRAG_SENTINEL && self.effect.allows_copy_move()
    }
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    Tab(NodeId),
    Tabset(NodeId),
    External(ExternalDrag),
}

/// A candidate drop target with its on-screen geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    TabSet {
        id: NodeId,
        rect: Rect,
        tab_strip: Option<Rect>,
        tab_buttons: Vec<Rect>,
    },
    Border {
        location: BorderLocation,
        rect: Rect,
        tab_buttons: Vec<Rect>,
    },
    /// The whole main layout, for outer-edge docking.
    Layout { rect: Rect },
}

impl DropTarget {
    #[must_use]
    pub const fn rect(&self) -> Rect {
        match self {
            Self::TabSet { rect, .. } | Self::Border { rect, .. } | Self::Layout { rect } => *rect,
        }
    }
}

/// A resolved drop decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOutcome {
    pub target: NodeId,
    pub location: DockLocation,
    /// Insertion index for center drops; `-1` appends.
    pub index: i64,
    /// Area to highlight while hovering.
    pub indicator: Rect,
}

/// Pointer-to-drop classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DropZoneResolver {
    thresholds: DropThresholds,
}

impl DropZoneResolver {
    #[must_use]
    pub const fn new(thresholds: DropThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub const fn thresholds(&self) -> DropThresholds {
        self.thresholds
    }

    /// Classify `pointer` over `target` for `source`.
    ///
    /// Returns `None` when there is no valid drop: locked or unrecognized
    /// source, pointer outside the target, drop disabled, self-drops and
    /// reorders that would not move anything.
    #[must_use]
    pub fn resolve(
        &self,
        model: &LayoutModel,
        source: &DragSource,
        target: &DropTarget,
        pointer: Point,
    ) -> Option<DropOutcome> {
        if !source_is_draggable(model, source) || !target.rect().contains(pointer) {
            return None;
        }
        match target {
            DropTarget::TabSet {
                id,
                rect,
                tab_strip,
                tab_buttons,
            } => self.resolve_tabset(model, source, id, *rect, tab_strip.as_ref(), tab_buttons, pointer),
            DropTarget::Border {
                location,
                rect,
                tab_buttons,
            } => resolve_border(model, source, *location, *rect, tab_buttons, pointer),
            DropTarget::Layout { rect } => self.resolve_layout(model, source, *rect, pointer),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_tabset(
        &self,
        model: &LayoutModel,
        source: &DragSource,
        id: &NodeId,
        rect: Rect,
        tab_strip: Option<&Rect>,
        tab_buttons: &[Rect],
        pointer: Point,
    ) -> Option<DropOutcome> {
        let tabset = model.find_tabset(id.as_str())?;
        if !model.tabset_enable_drop(tabset) {
            return None;
        }
        if let DragSource::Tabset(source_id) = source
            && source_id == id
        {
            return None;
        }

        let own_position = match source {
            DragSource::Tab(tab_id) => tabset.position_of(tab_id.as_str()),
            _ => None,
        };

        if let Some(strip) = tab_strip
            && strip.contains(pointer)
        {
            let index = insertion_index(tab_buttons, pointer, true);
            if let Some(from) = own_position
                && is_same_position(from, index, tabset.children.len())
            {
                return None;
            }
            return Some(DropOutcome {
                target: id.clone(),
                location: DockLocation::Center,
                index,
                indicator: *strip,
            });
        }

        if let Some(edge) = nearest_edge(rect, pointer, self.thresholds.edge_fraction)
            && model.tabset_enable_divide(tabset)
        {
            if own_position.is_some() && tabset.children.len() == 1 {
                return None;
            }
            return Some(DropOutcome {
                target: id.clone(),
                location: edge,
                index: END_INDEX,
                indicator: half_of(rect, edge),
            });
        }

        let index = insertion_index(tab_buttons, pointer, true);
        if let Some(from) = own_position
            && is_same_position(from, index, tabset.children.len())
        {
            return None;
        }
        Some(DropOutcome {
            target: id.clone(),
            location: DockLocation::Center,
            index,
            indicator: rect,
        })
    }

    fn resolve_layout(
        &self,
        model: &LayoutModel,
        source: &DragSource,
        rect: Rect,
        pointer: Point,
    ) -> Option<DropOutcome> {
        if !model.attributes().enable_edge_dock || is_sole_main_content(model, source) {
            return None;
        }
        let band = self.thresholds.layout_edge_px;
        let distances = [
            (DockLocation::Left, pointer.x - rect.x),
            (DockLocation::Right, rect.right() - pointer.x),
            (DockLocation::Top, pointer.y - rect.y),
            (DockLocation::Bottom, rect.bottom() - pointer.y),
        ];
        let (edge, _) = distances
            .into_iter()
            .filter(|(_, distance)| *distance <= band)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        Some(DropOutcome {
            target: model.root().id.clone(),
            location: edge,
            index: END_INDEX,
            indicator: slice_of(rect, edge, 0.25),
        })
    }

    /// Action to dispatch when the pointer is released over `outcome`.
    #[must_use]
    pub fn to_action(source: &DragSource, outcome: &DropOutcome) -> Action {
        match source {
            DragSource::Tab(tab_id) => Action::MoveTab {
                tab_id: tab_id.clone(),
                to_node: outcome.target.clone(),
                location: outcome.location,
                index: outcome.index,
            },
            DragSource::Tabset(tabset_id) => Action::MoveTabset {
                tabset_id: tabset_id.clone(),
                to_node: outcome.target.clone(),
                location: outcome.location,
                index: outcome.index,
            },
            DragSource::External(drag) => Action::AddNode {
                definition: NodeDefinition::Tab(drag.definition.clone()),
                to_node: outcome.target.clone(),
                location: outcome.location,
                index: outcome.index,
                select: Some(true),
            },
        }
    }
}

fn source_is_draggable(model: &LayoutModel, source: &DragSource) -> bool {
    match source {
        DragSource::Tab(id) => model
            .find_tab(id.as_str())
            .is_some_and(|tab| model.tab_enable_drag(tab)),
        DragSource::Tabset(id) => model
            .find_tabset(id.as_str())
            .is_some_and(|tabset| model.tabset_enable_drag(tabset)),
        DragSource::External(drag) => drag.is_recognized(),
    }
}

fn resolve_border(
    model: &LayoutModel,
    source: &DragSource,
    location: BorderLocation,
    rect: Rect,
    tab_buttons: &[Rect],
    pointer: Point,
) -> Option<DropOutcome> {
    let border = model.borders().get(location);
    if !model.border_enable_drop(border) {
        return None;
    }
    let index = if border.is_collapsed() {
        END_INDEX
    } else {
        insertion_index(tab_buttons, pointer, location.spans_width())
    };
    if let DragSource::Tab(tab_id) = source
        && let Some(NodeAddress::Tab {
            parent: TabParent::Border(owner),
            index: from,
        }) = model.address(tab_id.as_str())
        && *owner == location
        && is_same_position(*from, index, border.children.len())
    {
        return None;
    }
    Some(DropOutcome {
        target: location.node_id(),
        location: DockLocation::Center,
        index,
        indicator: rect,
    })
}

/// The source already fills the whole main layout on its own.
fn is_sole_main_content(model: &LayoutModel, source: &DragSource) -> bool {
    let tabsets = model.root().tabsets();
    let [only] = tabsets.as_slice() else {
        return false;
    };
    match source {
        DragSource::Tab(tab_id) => only.children.len() == 1 && only.position_of(tab_id.as_str()).is_some(),
        DragSource::Tabset(tabset_id) => only.id == *tabset_id,
        DragSource::External(_) => false,
    }
}

/// Number of button midpoints before the pointer, or `-1` without buttons.
fn insertion_index(buttons: &[Rect], pointer: Point, horizontal: bool) -> i64 {
    if buttons.is_empty() {
        return END_INDEX;
    }
    let before = buttons
        .iter()
        .filter(|button| {
            if horizontal {
                button.mid_x() < pointer.x
            } else {
                button.center().y < pointer.y
            }
        })
        .count();
    i64::try_from(before).unwrap_or(END_INDEX)
}

/// A reorder to `index` that leaves a tab at `from` where it is.
fn is_same_position(from: usize, index: i64, len: usize) -> bool {
    let destination = usize::try_from(index).ok().filter(|&i| i <= len).unwrap_or(len);
    destination == from || destination == from + 1
}

/// Side whose band contains the pointer, closest relative to its band size.
fn nearest_edge(rect: Rect, pointer: Point, fraction: f64) -> Option<DockLocation> {
    let (fx, fy) = rect.relative(pointer)?;
    DockLocation::EDGES
        .into_iter()
        .map(|edge| {
            let depth = match edge {
                DockLocation::Left => fx,
                DockLocation::Right => 1.0 - fx,
                DockLocation::Top => fy,
                DockLocation::Bottom => 1.0 - fy,
                DockLocation::Center => f64::INFINITY,
            };
            (edge, depth)
        })
        .filter(|(_, depth)| *depth < fraction)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(edge, _)| edge)
}

fn half_of(rect: Rect, edge: DockLocation) -> Rect {
    slice_of(rect, edge, 0.5)
}

fn slice_of(rect: Rect, edge: DockLocation, share: f64) -> Rect {
    let width = rect.width * share;
    let height = rect.height * share;
    match edge {
        DockLocation::Left => Rect::new(rect.x, rect.y, width, rect.height),
        DockLocation::Right => Rect::new(rect.right() - width, rect.y, width, rect.height),
        DockLocation::Top => Rect::new(rect.x, rect.y, rect.width, height),
        DockLocation::Bottom => Rect::new(rect.x, rect.bottom() - height, rect.width, height),
        DockLocation::Center => rect,
    }
}
