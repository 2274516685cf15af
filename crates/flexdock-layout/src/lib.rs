#![forbid(unsafe_code)]

//! Docking layout engine.
//!
//! - [`LayoutModel`]: the tree of rows, tab-sets and tabs plus borders,
//!   floating windows and global attributes, kept in canonical form.
//! - [`ActionDispatcher`]: the only way to change a model; applies one
//!   [`Action`] at a time on a clone and validates before committing.
//! - [`DropZoneResolver`]: turns pointer geometry into a [`DropOutcome`].
//! - [`DragSession`]: the drag lifecycle around the resolver.
//! - [`FloatManager`]: floating windows and their z-order.
//!
//! ```
//! use std::sync::Arc;
//! use flexdock_layout::{Action, ActionDispatcher, DockLocation, LayoutModel};
//!
//! let model = Arc::new(LayoutModel::from_json(r#"{
//!     "layout": {"type": "row", "children": [
//!         {"type": "tabset", "id": "main", "children": [{"id": "a", "name": "A"}]},
//!         {"type": "tabset", "id": "side", "children": [{"id": "b", "name": "B"}]}
//!     ]}
//! }"#).unwrap());
//!
//! let mut dispatcher = ActionDispatcher::new();
//! let outcome = dispatcher.dispatch(&model, Action::move_tab("b", "main", DockLocation::Center, -1));
//! assert!(outcome.status.is_applied());
//! assert_eq!(outcome.model.main_tabset_count(), 1);
//! ```

pub mod action;
pub mod attributes;
pub mod dispatch;
pub mod drag;
pub mod drop;
pub mod float;
pub mod model;
pub mod node;
mod ops;
pub mod solve;

pub use flexdock_core::geometry::{Point, Rect};

pub use action::{Action, ActionKind, ActionRejection, END_INDEX, NodeDefinition};
pub use attributes::{ModelAttributes, ModelAttributesPatch, NodeAttributesPatch};
pub use dispatch::{
    ActionDispatcher, ActionInterceptor, DispatchOutcome, DispatchRecord, DispatchRecordStatus,
    DispatchStatus,
};
pub use drag::{
    CancelReason, DEFAULT_DRAG_THRESHOLD_PX, DragNoopReason, DragPhase, DragSession,
    DragSessionError, DragSignal, DragTransition,
};
pub use drop::{
    DragEffect, DragSource, DropOutcome, DropTarget, DropThresholds, DropZoneResolver,
    EXTERNAL_DRAG_SENTINEL, ExternalDrag,
};
pub use float::{DockAnchor, FloatManager, FloatingWindow};
pub use model::{
    BorderSet, LayoutModel, ModelError, ModelSnapshot, NodeAddress, NodeRef, Scope, TabParent,
};
pub use node::{
    BorderLocation, BorderNode, DockLocation, LayoutNode, NodeId, Orientation, RowNode,
    TabLocation, TabNode, TabSetNode,
};
pub use solve::{SolvedLayout, Splitter};
