//! The closed set of layout mutations.
//!
//! Every action serializes as a plain tagged record
//! (`{"type": "moveTab", "tabId": ..., ...}`) so it can be logged, intercepted
//! and replayed.

use std::fmt;

use flexdock_core::geometry::Rect;
use serde::{Deserialize, Serialize};

use crate::attributes::{ModelAttributesPatch, NodeAttributesPatch};
use crate::model::ModelError;
use crate::node::{BorderLocation, DockLocation, NodeId, Orientation, TabNode, TabSetNode};

/// Insertion index meaning "append".
pub const END_INDEX: i64 = -1;

fn end_index() -> i64 {
    END_INDEX
}

/// Definition carried by `addNode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeDefinition {
    Tab(TabNode),
    TabSet(TabSetNode),
}

/// A single permitted layout mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Insert a new tab or tab-set at a target.
    AddNode {
        definition: NodeDefinition,
        to_node: NodeId,
        location: DockLocation,
        #[serde(default = "end_index")]
        index: i64,
        /// Select the new tab; defaults to true for tab-sets and false for
        /// borders.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        select: Option<bool>,
    },
    DeleteTab {
        tab_id: NodeId,
    },
    DeleteTabset {
        tabset_id: NodeId,
    },
    MoveTab {
        tab_id: NodeId,
        to_node: NodeId,
        location: DockLocation,
        #[serde(default = "end_index")]
        index: i64,
    },
    MoveTabset {
        tabset_id: NodeId,
        to_node: NodeId,
        location: DockLocation,
        #[serde(default = "end_index")]
        index: i64,
    },
    /// Overwrite the weights of a row's children.
    AdjustWeights {
        row_id: NodeId,
        weights: Vec<f64>,
        orientation: Orientation,
    },
    FloatTabset {
        tabset_id: NodeId,
        rect: Rect,
    },
    DockFloatingWindow {
        window_id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<NodeId>,
    },
    UpdateModelAttributes {
        attributes: ModelAttributesPatch,
    },
    /// Select a tab; on a border, re-selecting the open tab collapses it.
    SelectTab {
        tab_id: NodeId,
    },
    RenameTab {
        tab_id: NodeId,
        name: String,
    },
    SetActiveTabset {
        #[serde(default)]
        tabset_id: Option<NodeId>,
    },
    MaximizeToggle {
        tabset_id: NodeId,
    },
    AdjustBorderSize {
        location: BorderLocation,
        size: f64,
    },
    UpdateNodeAttributes {
        node_id: NodeId,
        attributes: NodeAttributesPatch,
    },
    BringToFront {
        window_id: NodeId,
    },
    MinimizeWindow {
        window_id: NodeId,
    },
    MaximizeWindow {
        window_id: NodeId,
    },
    RestoreWindow {
        window_id: NodeId,
    },
    MoveWindow {
        window_id: NodeId,
        rect: Rect,
    },
}

impl Action {
    /// Action family.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::AddNode { .. } => ActionKind::AddNode,
            Self::DeleteTab { .. } => ActionKind::DeleteTab,
            Self::DeleteTabset { .. } => ActionKind::DeleteTabset,
            Self::MoveTab { .. } => ActionKind::MoveTab,
            Self::MoveTabset { .. } => ActionKind::MoveTabset,
            Self::AdjustWeights { .. } => ActionKind::AdjustWeights,
            Self::FloatTabset { .. } => ActionKind::FloatTabset,
            Self::DockFloatingWindow { .. } => ActionKind::DockFloatingWindow,
            Self::UpdateModelAttributes { .. } => ActionKind::UpdateModelAttributes,
            Self::SelectTab { .. } => ActionKind::SelectTab,
            Self::RenameTab { .. } => ActionKind::RenameTab,
            Self::SetActiveTabset { .. } => ActionKind::SetActiveTabset,
            Self::MaximizeToggle { .. } => ActionKind::MaximizeToggle,
            Self::AdjustBorderSize { .. } => ActionKind::AdjustBorderSize,
            Self::UpdateNodeAttributes { .. } => ActionKind::UpdateNodeAttributes,
            Self::BringToFront { .. } => ActionKind::BringToFront,
            Self::MinimizeWindow { .. } => ActionKind::MinimizeWindow,
            Self::MaximizeWindow { .. } => ActionKind::MaximizeWindow,
            Self::RestoreWindow { .. } => ActionKind::RestoreWindow,
            Self::MoveWindow { .. } => ActionKind::MoveWindow,
        }
    }

    pub fn move_tab(tab_id: impl Into<NodeId>, to_node: impl Into<NodeId>, location: DockLocation, index: i64) -> Self {
        Self::MoveTab {
            tab_id: tab_id.into(),
            to_node: to_node.into(),
            location,
            index,
        }
    }

    pub fn add_tab(tab: TabNode, to_node: impl Into<NodeId>, location: DockLocation, index: i64) -> Self {
        Self::AddNode {
            definition: NodeDefinition::Tab(tab),
            to_node: to_node.into(),
            location,
            index,
            select: None,
        }
    }

    pub fn delete_tab(tab_id: impl Into<NodeId>) -> Self {
        Self::DeleteTab { tab_id: tab_id.into() }
    }

    pub fn select_tab(tab_id: impl Into<NodeId>) -> Self {
        Self::SelectTab { tab_id: tab_id.into() }
    }
}

/// Stable action discriminator used in logs and the dispatch journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    AddNode,
    DeleteTab,
    DeleteTabset,
    MoveTab,
    MoveTabset,
    AdjustWeights,
    FloatTabset,
    DockFloatingWindow,
    UpdateModelAttributes,
    SelectTab,
    RenameTab,
    SetActiveTabset,
    MaximizeToggle,
    AdjustBorderSize,
    UpdateNodeAttributes,
    BringToFront,
    MinimizeWindow,
    MaximizeWindow,
    RestoreWindow,
    MoveWindow,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddNode => "addNode",
            Self::DeleteTab => "deleteTab",
            Self::DeleteTabset => "deleteTabset",
            Self::MoveTab => "moveTab",
            Self::MoveTabset => "moveTabset",
            Self::AdjustWeights => "adjustWeights",
            Self::FloatTabset => "floatTabset",
            Self::DockFloatingWindow => "dockFloatingWindow",
            Self::UpdateModelAttributes => "updateModelAttributes",
            Self::SelectTab => "selectTab",
            Self::RenameTab => "renameTab",
            Self::SetActiveTabset => "setActiveTabset",
            Self::MaximizeToggle => "maximizeToggle",
            Self::AdjustBorderSize => "adjustBorderSize",
            Self::UpdateNodeAttributes => "updateNodeAttributes",
            Self::BringToFront => "bringToFront",
            Self::MinimizeWindow => "minimizeWindow",
            Self::MaximizeWindow => "maximizeWindow",
            Self::RestoreWindow => "restoreWindow",
            Self::MoveWindow => "moveWindow",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an action left the model unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRejection {
    MissingNode {
        id: NodeId,
    },
    WrongNodeKind {
        id: NodeId,
        expected: &'static str,
    },
    DuplicateId {
        id: NodeId,
    },
    DragDisabled {
        id: NodeId,
    },
    DropDisabled {
        id: NodeId,
    },
    DivideDisabled {
        id: NodeId,
    },
    RenameDisabled {
        id: NodeId,
    },
    EdgeDockDisabled,
    /// Location not valid for the target (an edge on a border, ...).
    InvalidLocation {
        id: NodeId,
        location: DockLocation,
    },
    SelfDrop {
        id: NodeId,
    },
    /// The main tree would lose its last tab-set.
    LastMainTabset {
        id: NodeId,
    },
    WeightCountMismatch {
        row: NodeId,
        expected: usize,
        actual: usize,
    },
    InvalidWeight {
        row: NodeId,
        index: usize,
        weight: f64,
    },
    OrientationMismatch {
        row: NodeId,
        expected: Orientation,
        actual: Orientation,
    },
    InvalidRect {
        id: NodeId,
    },
    InvalidAttribute {
        name: &'static str,
    },
    NoNetChange,
    Validation(ModelError),
}

impl fmt::Display for ActionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingNode { id } => write!(f, "node {id} not found"),
            Self::WrongNodeKind { id, expected } => write!(f, "node {id} is not a {expected}"),
            Self::DuplicateId { id } => write!(f, "id {id} already exists in the model"),
            Self::DragDisabled { id } => write!(f, "dragging is disabled for {id}"),
            Self::DropDisabled { id } => write!(f, "dropping is disabled for {id}"),
            Self::DivideDisabled { id } => write!(f, "splitting is disabled for {id}"),
            Self::RenameDisabled { id } => write!(f, "renaming is disabled for {id}"),
            Self::EdgeDockDisabled => write!(f, "edge docking is disabled"),
            Self::InvalidLocation { id, location } => {
                write!(f, "location {location} is not valid for {id}")
            }
            Self::SelfDrop { id } => write!(f, "{id} cannot be dropped onto itself"),
            Self::LastMainTabset { id } => {
                write!(f, "{id} is the last tab-set of the main layout")
            }
            Self::WeightCountMismatch {
                row,
                expected,
                actual,
            } => write!(f, "row {row} has {expected} children but got {actual} weights"),
            Self::InvalidWeight { row, index, weight } => {
                write!(f, "row {row} weight {index} is invalid ({weight})")
            }
            Self::OrientationMismatch {
                row,
                expected,
                actual,
            } => write!(f, "row {row} is {expected:?}, not {actual:?}"),
            Self::InvalidRect { id } => write!(f, "rect for {id} must be finite with positive size"),
            Self::InvalidAttribute { name } => write!(f, "attribute {name} is out of range"),
            Self::NoNetChange => write!(f, "action would not change the model"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ActionRejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Validation(err) = self {
            return Some(err);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_use_camel_case_tags() {
        let action = Action::move_tab("a", "ts1", DockLocation::Right, END_INDEX);
        let value = serde_json::to_value(&action).expect("serialize action");
        assert_eq!(
            value,
            json!({
                "type": "moveTab",
                "tabId": "a",
                "toNode": "ts1",
                "location": "right",
                "index": -1
            })
        );
    }

    #[test]
    fn add_node_parses_tab_definition() {
        let action: Action = serde_json::from_value(json!({
            "type": "addNode",
            "definition": {"type": "tab", "name": "Notes", "component": "notes"},
            "toNode": "ts0",
            "location": "center"
        }))
        .expect("parse addNode");
        let Action::AddNode {
            definition: NodeDefinition::Tab(tab),
            index,
            ..
        } = action
        else {
            unreachable!("expected addNode with tab");
        };
        assert_eq!(tab.name, "Notes");
        assert!(tab.id.is_unassigned());
        assert_eq!(index, END_INDEX);
    }

    #[test]
    fn kind_matches_wire_tag() {
        let action = Action::AdjustBorderSize {
            location: BorderLocation::Left,
            size: 250.0,
        };
        let value = serde_json::to_value(&action).expect("serialize");
        assert_eq!(value["type"], json!(action.kind().as_str()));
    }

    #[test]
    fn rejection_messages_name_the_node() {
        let rejection = ActionRejection::DragDisabled { id: NodeId::from("locked") };
        assert_eq!(rejection.to_string(), "dragging is disabled for locked");
    }
}
