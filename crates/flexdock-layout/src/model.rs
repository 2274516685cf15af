//! The authoritative layout model.
//!
//! A [`LayoutModel`] owns the main tree, the four borders, the floating
//! windows and the global attributes. It answers structural queries and
//! enforces the canonical form; it is mutated only by the dispatcher, which
//! always works on a clone.
//!
//! # Canonical form
//!
//! - Nested rows alternate orientation; the main root follows
//!   `rootOrientationVertical`.
//! - Non-root rows have at least two children; a root with a single row child
//!   is hoisted.
//! - Tab-set selections are valid indices (or `None` when empty); empty
//!   tab-sets that may be deleted are pruned, except the last one of the main
//!   tree.
//! - Every node has a unique id; paths are positional and recomputed by
//!   [`LayoutModel::set_paths`].

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::ModelAttributes;
use crate::float::{FloatManager, FloatingWindow};
use crate::node::{
    BorderLocation, BorderNode, LayoutNode, NodeId, Orientation, RowNode, TabNode, TabSetNode,
    tagged_row,
};

/// Which tree a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Main,
    /// Index into the floating window list.
    Floating(usize),
}

/// Owner of a tab list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabParent {
    TabSet { scope: Scope, path: Vec<usize> },
    Border(BorderLocation),
}

/// Position of a node, rebuilt by [`LayoutModel::set_paths`].
///
/// `path` holds child indices from the scope's root row; the root itself has
/// an empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAddress {
    Row { scope: Scope, path: Vec<usize> },
    TabSet { scope: Scope, path: Vec<usize> },
    Tab { parent: TabParent, index: usize },
    Border(BorderLocation),
    Window(usize),
}

/// Borrowed view of any node.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Row(&'a RowNode),
    TabSet(&'a TabSetNode),
    Tab(&'a TabNode),
    Border(&'a BorderNode),
    Window(&'a FloatingWindow),
}

impl NodeRef<'_> {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Self::Row(row) => row.id.clone(),
            Self::TabSet(tabset) => tabset.id.clone(),
            Self::Tab(tab) => tab.id.clone(),
            Self::Border(border) => border.id(),
            Self::Window(window) => window.id.clone(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Row(row) => row.path(),
            Self::TabSet(tabset) => tabset.path(),
            Self::Tab(tab) => tab.path(),
            Self::Border(border) => border.path(),
            Self::Window(window) => window.layout.path(),
        }
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Row(_) => "row",
            Self::TabSet(_) => "tabset",
            Self::Tab(_) => "tab",
            Self::Border(_) => "border",
            Self::Window(_) => "window",
        }
    }
}

/// The four border docks.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSet {
    top: BorderNode,
    bottom: BorderNode,
    left: BorderNode,
    right: BorderNode,
}

impl Default for BorderSet {
    fn default() -> Self {
        Self {
            top: BorderNode::new(BorderLocation::Top),
            bottom: BorderNode::new(BorderLocation::Bottom),
            left: BorderNode::new(BorderLocation::Left),
            right: BorderNode::new(BorderLocation::Right),
        }
    }
}

impl BorderSet {
    #[must_use]
    pub const fn top(&self) -> &BorderNode {
        &self.top
    }

    #[must_use]
    pub const fn bottom(&self) -> &BorderNode {
        &self.bottom
    }

    #[must_use]
    pub const fn left(&self) -> &BorderNode {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &BorderNode {
        &self.right
    }

    #[must_use]
    pub const fn get(&self, location: BorderLocation) -> &BorderNode {
        match location {
            BorderLocation::Top => &self.top,
            BorderLocation::Bottom => &self.bottom,
            BorderLocation::Left => &self.left,
            BorderLocation::Right => &self.right,
        }
    }

    pub(crate) fn get_mut(&mut self, location: BorderLocation) -> &mut BorderNode {
        match location {
            BorderLocation::Top => &mut self.top,
            BorderLocation::Bottom => &mut self.bottom,
            BorderLocation::Left => &mut self.left,
            BorderLocation::Right => &mut self.right,
        }
    }

    /// Borders in `top, bottom, left, right` order.
    pub fn iter(&self) -> impl Iterator<Item = &BorderNode> {
        [&self.top, &self.bottom, &self.left, &self.right].into_iter()
    }
}

/// Serialized form of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSnapshot {
    #[serde(default)]
    pub global: ModelAttributes,
    #[serde(with = "tagged_row")]
    pub layout: RowNode,
    #[serde(default)]
    pub borders: Vec<BorderNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating: Vec<FloatingWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tabset: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximized_tabset: Option<NodeId>,
}

/// Model construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Parse {
        message: String,
    },
    DuplicateId {
        id: NodeId,
    },
    UnassignedId {
        path: String,
    },
    DuplicateBorder {
        location: BorderLocation,
    },
    EmptyLayout,
    RootOrientationMismatch {
        expected: Orientation,
        actual: Orientation,
    },
    InvalidWeight {
        id: NodeId,
        weight: f64,
    },
    OrientationConflict {
        row: NodeId,
    },
    DegenerateRow {
        row: NodeId,
    },
    InvalidSelection {
        node: NodeId,
        selected: usize,
        len: usize,
    },
    MissingSelection {
        tabset: NodeId,
    },
    StaleEmptyTabset {
        tabset: NodeId,
    },
    InvalidBorderSize {
        location: BorderLocation,
        size: f64,
    },
    InvalidWindowRect {
        window: NodeId,
    },
    EmptyWindow {
        window: NodeId,
    },
    DanglingReference {
        id: NodeId,
    },
    InvalidAttribute {
        name: &'static str,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { message } => write!(f, "invalid layout definition: {message}"),
            Self::DuplicateId { id } => write!(f, "duplicate node id {id}"),
            Self::UnassignedId { path } => write!(f, "node at {path:?} has no id"),
            Self::DuplicateBorder { location } => write!(f, "border {location} defined twice"),
            Self::EmptyLayout => write!(f, "main layout has no tab-sets"),
            Self::RootOrientationMismatch { expected, actual } => {
                write!(f, "root row is {actual:?} but attributes require {expected:?}")
            }
            Self::InvalidWeight { id, weight } => {
                write!(f, "node {id} has invalid weight {weight}")
            }
            Self::OrientationConflict { row } => {
                write!(f, "row {row} has the same orientation as its parent")
            }
            Self::DegenerateRow { row } => write!(f, "row {row} is not in canonical form"),
            Self::InvalidSelection {
                node,
                selected,
                len,
            } => write!(f, "node {node} selects {selected} but has {len} tabs"),
            Self::MissingSelection { tabset } => {
                write!(f, "tab-set {tabset} has tabs but no selection")
            }
            Self::StaleEmptyTabset { tabset } => {
                write!(f, "empty tab-set {tabset} should have been removed")
            }
            Self::InvalidBorderSize { location, size } => {
                write!(f, "border {location} has invalid size {size}")
            }
            Self::InvalidWindowRect { window } => {
                write!(f, "floating window {window} has an invalid rect")
            }
            Self::EmptyWindow { window } => write!(f, "floating window {window} has no tab-sets"),
            Self::DanglingReference { id } => write!(f, "reference to missing tab-set {id}"),
            Self::InvalidAttribute { name } => write!(f, "attribute {name} is out of range"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// The layout tree plus global configuration.
#[derive(Debug, Clone)]
pub struct LayoutModel {
    pub(crate) attributes: ModelAttributes,
    pub(crate) root: RowNode,
    pub(crate) borders: BorderSet,
    pub(crate) floating: FloatManager,
    pub(crate) active_tabset: Option<NodeId>,
    pub(crate) maximized_tabset: Option<NodeId>,
    index: FxHashMap<NodeId, NodeAddress>,
    id_counter: u64,
}

/// Structural equality; the address index and id counter are derived state.
impl PartialEq for LayoutModel {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.root == other.root
            && self.borders == other.borders
            && self.floating.windows() == other.floating.windows()
            && self.active_tabset == other.active_tabset
            && self.maximized_tabset == other.maximized_tabset
    }
}

impl Default for LayoutModel {
    /// One empty placeholder tab-set and four empty borders.
    fn default() -> Self {
        let attributes = ModelAttributes::default();
        let mut model = Self::from_parts(
            RowNode::new(NodeId::default(), attributes.root_orientation()),
            attributes,
            BorderSet::default(),
            FloatManager::default(),
        );
        model.tidy();
        model
    }
}

impl LayoutModel {
    fn from_parts(
        root: RowNode,
        attributes: ModelAttributes,
        borders: BorderSet,
        floating: FloatManager,
    ) -> Self {
        Self {
            attributes,
            root,
            borders,
            floating,
            active_tabset: None,
            maximized_tabset: None,
            index: FxHashMap::default(),
            id_counter: 0,
        }
    }

    /// Build a model from its serialized form.
    ///
    /// Orientations are derived, missing ids are generated, the tree is
    /// brought into canonical form and validated, and paths are set.
    pub fn from_snapshot(snapshot: ModelSnapshot) -> Result<Self, ModelError> {
        let mut borders = BorderSet::default();
        let mut seen = FxHashSet::default();
        for border in snapshot.borders {
            if !seen.insert(border.location) {
                return Err(ModelError::DuplicateBorder {
                    location: border.location,
                });
            }
            let location = border.location;
            *borders.get_mut(location) = border;
        }

        let mut model = Self::from_parts(
            snapshot.layout,
            snapshot.global,
            borders,
            FloatManager::from_windows(snapshot.floating),
        );
        model.active_tabset = snapshot.active_tabset;
        model.maximized_tabset = snapshot.maximized_tabset;

        model.root.orientation = model.attributes.root_orientation();
        model.root.enforce_alternation();
        for window in model.floating.windows_mut() {
            window.layout.enforce_alternation();
        }

        model.tidy();
        model.validate()?;
        Ok(model)
    }

    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        let snapshot: ModelSnapshot = serde_json::from_value(value)?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let snapshot: ModelSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot)
    }

    #[must_use]
    pub fn to_snapshot(&self) -> ModelSnapshot {
        ModelSnapshot {
            global: self.attributes.clone(),
            layout: self.root.clone(),
            borders: self.borders.iter().cloned().collect(),
            floating: self.floating.windows().to_vec(),
            active_tabset: self.active_tabset.clone(),
            maximized_tabset: self.maximized_tabset.clone(),
        }
    }

    pub fn to_value(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self.to_snapshot())?)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    // -- Accessors ---------------------------------------------------------

    #[must_use]
    pub fn root(&self) -> &RowNode {
        &self.root
    }

    #[must_use]
    pub fn attributes(&self) -> &ModelAttributes {
        &self.attributes
    }

    #[must_use]
    pub fn borders(&self) -> &BorderSet {
        &self.borders
    }

    #[must_use]
    pub fn floating(&self) -> &FloatManager {
        &self.floating
    }

    /// The tab-set most recently interacted with.
    #[must_use]
    pub fn active_tabset(&self) -> Option<&TabSetNode> {
        self.active_tabset
            .as_ref()
            .and_then(|id| self.find_tabset(id.as_str()))
    }

    #[must_use]
    pub fn maximized_tabset(&self) -> Option<&TabSetNode> {
        self.maximized_tabset
            .as_ref()
            .and_then(|id| self.find_tabset(id.as_str()))
    }

    // -- Flag resolution ---------------------------------------------------

    #[must_use]
    pub fn tab_enable_drag(&self, tab: &TabNode) -> bool {
        tab.enable_drag.unwrap_or(self.attributes.tab_enable_drag)
    }

    #[must_use]
    pub fn tab_enable_close(&self, tab: &TabNode) -> bool {
        tab.enable_close.unwrap_or(self.attributes.tab_enable_close)
    }

    #[must_use]
    pub fn tab_enable_rename(&self, tab: &TabNode) -> bool {
        tab.enable_rename.unwrap_or(self.attributes.tab_enable_rename)
    }

    #[must_use]
    pub fn tabset_enable_drag(&self, tabset: &TabSetNode) -> bool {
        tabset.enable_drag.unwrap_or(self.attributes.tab_set_enable_drag)
    }

    #[must_use]
    pub fn tabset_enable_drop(&self, tabset: &TabSetNode) -> bool {
        tabset.enable_drop.unwrap_or(self.attributes.tab_set_enable_drop)
    }

    #[must_use]
    pub fn tabset_enable_divide(&self, tabset: &TabSetNode) -> bool {
        tabset
            .enable_divide
            .unwrap_or(self.attributes.tab_set_enable_divide)
    }

    #[must_use]
    pub fn tabset_enable_close(&self, tabset: &TabSetNode) -> bool {
        tabset.enable_close.unwrap_or(self.attributes.tab_set_enable_close)
    }

    #[must_use]
    pub fn tabset_enable_tab_strip(&self, tabset: &TabSetNode) -> bool {
        tabset
            .enable_tab_strip
            .unwrap_or(self.attributes.tab_set_enable_tab_strip)
    }

    #[must_use]
    pub fn tabset_enable_delete_when_empty(&self, tabset: &TabSetNode) -> bool {
        resolve_delete_when_empty(&self.attributes, tabset)
    }

    #[must_use]
    pub fn border_enable_drop(&self, border: &BorderNode) -> bool {
        border.enable_drop.unwrap_or(self.attributes.border_enable_drop)
    }

    #[must_use]
    pub fn border_auto_hide(&self, border: &BorderNode) -> bool {
        border.auto_hide.unwrap_or(self.attributes.border_auto_hide)
    }

    // -- Queries -----------------------------------------------------------

    #[must_use]
    pub fn address(&self, id: &str) -> Option<&NodeAddress> {
        self.index.get(id)
    }

    /// Look up any node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.resolve(self.index.get(id)?)
    }

    fn resolve(&self, address: &NodeAddress) -> Option<NodeRef<'_>> {
        match address {
            NodeAddress::Row { scope, path } => {
                row_at(self.scope_root(*scope)?, path).map(NodeRef::Row)
            }
            NodeAddress::TabSet { scope, path } => {
                tabset_at(self.scope_root(*scope)?, path).map(NodeRef::TabSet)
            }
            NodeAddress::Tab { parent, index } => {
                self.tab_list(parent)?.get(*index).map(NodeRef::Tab)
            }
            NodeAddress::Border(location) => Some(NodeRef::Border(self.borders.get(*location))),
            NodeAddress::Window(index) => self.floating.windows().get(*index).map(NodeRef::Window),
        }
    }

    #[must_use]
    pub fn find_tab(&self, id: &str) -> Option<&TabNode> {
        match self.node(id)? {
            NodeRef::Tab(tab) => Some(tab),
            _ => None,
        }
    }

    #[must_use]
    pub fn find_tabset(&self, id: &str) -> Option<&TabSetNode> {
        match self.node(id)? {
            NodeRef::TabSet(tabset) => Some(tabset),
            _ => None,
        }
    }

    #[must_use]
    pub fn find_row(&self, id: &str) -> Option<&RowNode> {
        match self.node(id)? {
            NodeRef::Row(row) => Some(row),
            _ => None,
        }
    }

    #[must_use]
    pub fn find_border(&self, id: &str) -> Option<&BorderNode> {
        match self.node(id)? {
            NodeRef::Border(border) => Some(border),
            _ => None,
        }
    }

    #[must_use]
    pub fn path_of(&self, id: &str) -> Option<&str> {
        match self.node(id)? {
            NodeRef::Row(row) => Some(row.path()),
            NodeRef::TabSet(tabset) => Some(tabset.path()),
            NodeRef::Tab(tab) => Some(tab.path()),
            NodeRef::Border(border) => Some(border.path()),
            NodeRef::Window(window) => Some(window.layout.path()),
        }
    }

    /// Look up a node by its positional path.
    #[must_use]
    pub fn node_by_path(&self, path: &str) -> Option<NodeRef<'_>> {
        self.index
            .values()
            .filter_map(|address| self.resolve(address))
            .filter(|node| !matches!(node, NodeRef::Window(_)))
            .find(|node| node.path() == path)
    }

    /// Containing node: row for rows and tab-sets, tab-set or border for
    /// tabs, window for a floating root row.
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<NodeRef<'_>> {
        match self.index.get(id)? {
            NodeAddress::Row { scope, path } | NodeAddress::TabSet { scope, path } => {
                match path.split_last() {
                    Some((_, parent)) => row_at(self.scope_root(*scope)?, parent).map(NodeRef::Row),
                    None => match scope {
                        Scope::Main => None,
                        Scope::Floating(index) => {
                            self.floating.windows().get(*index).map(NodeRef::Window)
                        }
                    },
                }
            }
            NodeAddress::Tab { parent, .. } => match parent {
                TabParent::TabSet { scope, path } => {
                    tabset_at(self.scope_root(*scope)?, path).map(NodeRef::TabSet)
                }
                TabParent::Border(location) => Some(NodeRef::Border(self.borders.get(*location))),
            },
            NodeAddress::Border(_) | NodeAddress::Window(_) => None,
        }
    }

    /// Main-tree tab-sets followed by floating ones, in document order.
    #[must_use]
    pub fn tabsets(&self) -> Vec<&TabSetNode> {
        let mut out = self.root.tabsets();
        for window in self.floating.windows() {
            out.extend(window.layout.tabsets());
        }
        out
    }

    #[must_use]
    pub fn main_tabset_count(&self) -> usize {
        self.root.tabset_count()
    }

    /// Every tab: main tree, borders, then floating windows.
    #[must_use]
    pub fn tabs(&self) -> Vec<&TabNode> {
        let mut out: Vec<&TabNode> = self
            .root
            .tabsets()
            .into_iter()
            .flat_map(|tabset| tabset.children.iter())
            .collect();
        for border in self.borders.iter() {
            out.extend(border.children.iter());
        }
        for window in self.floating.windows() {
            out.extend(
                window
                    .layout
                    .tabsets()
                    .into_iter()
                    .flat_map(|tabset| tabset.children.iter()),
            );
        }
        out
    }

    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.tabs().len()
    }

    /// Scope holding a tab-set or row, if it is in a tree.
    #[must_use]
    pub fn scope_of(&self, id: &str) -> Option<Scope> {
        match self.index.get(id)? {
            NodeAddress::Row { scope, .. } | NodeAddress::TabSet { scope, .. } => Some(*scope),
            NodeAddress::Tab {
                parent: TabParent::TabSet { scope, .. },
                ..
            } => Some(*scope),
            _ => None,
        }
    }

    // -- Internal navigation -----------------------------------------------

    pub(crate) fn scope_root(&self, scope: Scope) -> Option<&RowNode> {
        match scope {
            Scope::Main => Some(&self.root),
            Scope::Floating(index) => self.floating.windows().get(index).map(|window| &window.layout),
        }
    }

    pub(crate) fn scope_root_mut(&mut self, scope: Scope) -> Option<&mut RowNode> {
        match scope {
            Scope::Main => Some(&mut self.root),
            Scope::Floating(index) => self
                .floating
                .windows_mut()
                .get_mut(index)
                .map(|window| &mut window.layout),
        }
    }

    pub(crate) fn tab_list(&self, parent: &TabParent) -> Option<&Vec<TabNode>> {
        match parent {
            TabParent::TabSet { scope, path } => {
                tabset_at(self.scope_root(*scope)?, path).map(|tabset| &tabset.children)
            }
            TabParent::Border(location) => Some(&self.borders.get(*location).children),
        }
    }

    /// Tab list and selection slot of a tab owner.
    pub(crate) fn tab_list_mut(
        &mut self,
        parent: &TabParent,
    ) -> Option<(&mut Vec<TabNode>, &mut Option<usize>)> {
        match parent {
            TabParent::TabSet { scope, path } => {
                let tabset = tabset_at_mut(self.scope_root_mut(*scope)?, path)?;
                Some((&mut tabset.children, &mut tabset.selected))
            }
            TabParent::Border(location) => {
                let border = self.borders.get_mut(*location);
                Some((&mut border.children, &mut border.selected))
            }
        }
    }

    pub(crate) fn tabset_mut(&mut self, id: &str) -> Option<&mut TabSetNode> {
        let Some(NodeAddress::TabSet { scope, path }) = self.index.get(id).cloned() else {
            return None;
        };
        tabset_at_mut(self.scope_root_mut(scope)?, &path)
    }

    pub(crate) fn row_mut(&mut self, id: &str) -> Option<&mut RowNode> {
        let Some(NodeAddress::Row { scope, path }) = self.index.get(id).cloned() else {
            return None;
        };
        row_at_mut(self.scope_root_mut(scope)?, &path)
    }

    pub(crate) fn tab_mut(&mut self, id: &str) -> Option<&mut TabNode> {
        let Some(NodeAddress::Tab { parent, index }) = self.index.get(id).cloned() else {
            return None;
        };
        self.tab_list_mut(&parent)?.0.get_mut(index)
    }

    // -- Paths and ids -----------------------------------------------------

    /// Recompute every positional path and the id index.
    ///
    /// The root row gets `prefix`; children append `/r{i}` or `/ts{i}`, tabs
    /// `/tb{i}`. Borders live under `{prefix}/border/<location>` and
    /// floating roots at `{prefix}/float/{n}`.
    pub fn set_paths(&mut self, prefix: &str) {
        let mut index = FxHashMap::default();
        let mut position = Vec::new();
        index_row(
            &mut self.root,
            prefix.to_owned(),
            Scope::Main,
            &mut position,
            &mut index,
        );

        for location in BorderLocation::ALL {
            let border = self.borders.get_mut(location);
            let border_path = format!("{prefix}/border/{location}");
            for (i, tab) in border.children.iter_mut().enumerate() {
                tab.set_path(format!("{border_path}/tb{i}"));
                index.insert(
                    tab.id.clone(),
                    NodeAddress::Tab {
                        parent: TabParent::Border(location),
                        index: i,
                    },
                );
            }
            border.set_path(border_path);
            index.insert(location.node_id(), NodeAddress::Border(location));
        }

        for (n, window) in self.floating.windows_mut().iter_mut().enumerate() {
            index.insert(window.id.clone(), NodeAddress::Window(n));
            index_row(
                &mut window.layout,
                format!("{prefix}/float/{n}"),
                Scope::Floating(n),
                &mut position,
                &mut index,
            );
        }

        self.index = index;
    }

    /// Next `#<n>` id not present in the index or in `reserved`.
    pub(crate) fn generate_id(&mut self, reserved: &FxHashSet<NodeId>) -> NodeId {
        loop {
            self.id_counter += 1;
            let candidate = NodeId::generated(self.id_counter);
            if !self.index.contains_key(candidate.as_str()) && !reserved.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Give every unassigned node a fresh `#<n>` id.
    fn assign_missing_ids(&mut self) {
        let mut taken: FxHashSet<NodeId> = FxHashSet::default();
        walk_ids(self, &mut |id| {
            if !id.is_unassigned() {
                taken.insert(id.clone());
            }
        });

        let mut counter = self.id_counter;
        walk_ids(self, &mut |id| {
            if id.is_unassigned() {
                loop {
                    counter += 1;
                    let candidate = NodeId::generated(counter);
                    if taken.insert(candidate.clone()) {
                        *id = candidate;
                        break;
                    }
                }
            }
        });
        self.id_counter = counter;
    }

    // -- Canonical form ----------------------------------------------------

    /// Bring the model into canonical form, then re-assign ids and paths.
    pub(crate) fn tidy(&mut self) {
        let attributes = self.attributes.clone();

        for tabset in self.root.tabsets_mut() {
            fix_tabset_selection(tabset);
        }
        for window in self.floating.windows_mut() {
            for tabset in window.layout.tabsets_mut() {
                fix_tabset_selection(tabset);
            }
        }
        for location in BorderLocation::ALL {
            let border = self.borders.get_mut(location);
            if border.selected.is_some_and(|index| index >= border.children.len()) {
                border.selected = None;
            }
        }

        // Keep one placeholder when every main tab-set is an empty deletable one.
        let main = self.root.tabsets();
        let prunable: Vec<&TabSetNode> = main
            .iter()
            .copied()
            .filter(|tabset| is_prunable(&attributes, tabset))
            .collect();
        let keep = if !main.is_empty() && prunable.len() == main.len() {
            prunable.first().map(|tabset| tabset.id.clone())
        } else {
            None
        };
        prune_empty_tabsets(&mut self.root, &attributes, keep.as_ref());
        for window in self.floating.windows_mut() {
            prune_empty_tabsets(&mut window.layout, &attributes, None);
        }

        normalize_row(&mut self.root);
        hoist_root(&mut self.root);
        self.attributes.root_orientation_vertical = self.root.orientation == Orientation::Vertical;
        if self.root.children.is_empty() {
            self.root
                .children
                .push(LayoutNode::TabSet(TabSetNode::new(NodeId::default())));
        }

        for window in self.floating.windows_mut() {
            normalize_row(&mut window.layout);
            hoist_root(&mut window.layout);
        }
        self.floating
            .windows_mut()
            .retain(|window| window.layout.tabset_count() > 0);

        self.assign_missing_ids();
        self.set_paths("");

        if self
            .active_tabset
            .as_ref()
            .is_some_and(|id| self.find_tabset(id.as_str()).is_none())
        {
            self.active_tabset = None;
        }
        if self
            .maximized_tabset
            .as_ref()
            .is_some_and(|id| self.scope_of(id.as_str()) != Some(Scope::Main) || self.find_tabset(id.as_str()).is_none())
        {
            self.maximized_tabset = None;
        }
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(name) = self.attributes.invalid_sizes().first().copied() {
            return Err(ModelError::InvalidAttribute { name });
        }

        let mut seen = FxHashSet::default();
        for id in self.all_ids() {
            if id.is_unassigned() {
                return Err(ModelError::UnassignedId {
                    path: String::new(),
                });
            }
            if !seen.insert(id.clone()) {
                return Err(ModelError::DuplicateId { id });
            }
        }

        let expected = self.attributes.root_orientation();
        if self.root.orientation != expected {
            return Err(ModelError::RootOrientationMismatch {
                expected,
                actual: self.root.orientation,
            });
        }
        let main_tabsets = self.root.tabset_count();
        if main_tabsets == 0 {
            return Err(ModelError::EmptyLayout);
        }
        validate_row(&self.root, true)?;
        for tabset in self.root.tabsets() {
            validate_tabset(&self.attributes, tabset, main_tabsets == 1)?;
        }

        for border in self.borders.iter() {
            if let Some(selected) = border.selected
                && selected >= border.children.len()
            {
                return Err(ModelError::InvalidSelection {
                    node: border.id(),
                    selected,
                    len: border.children.len(),
                });
            }
            if !(border.size.is_finite() && border.size >= 0.0) {
                return Err(ModelError::InvalidBorderSize {
                    location: border.location,
                    size: border.size,
                });
            }
        }

        for window in self.floating.windows() {
            if !window.rect.is_valid_window() {
                return Err(ModelError::InvalidWindowRect {
                    window: window.id.clone(),
                });
            }
            if window.layout.tabset_count() == 0 {
                return Err(ModelError::EmptyWindow {
                    window: window.id.clone(),
                });
            }
            validate_row(&window.layout, true)?;
            for tabset in window.layout.tabsets() {
                validate_tabset(&self.attributes, tabset, false)?;
            }
        }

        if let Some(id) = &self.active_tabset
            && self.find_tabset(id.as_str()).is_none()
        {
            return Err(ModelError::DanglingReference { id: id.clone() });
        }
        if let Some(id) = &self.maximized_tabset
            && self.scope_of(id.as_str()) != Some(Scope::Main)
        {
            return Err(ModelError::DanglingReference { id: id.clone() });
        }
        Ok(())
    }

    fn all_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        collect_row_ids(&self.root, &mut ids);
        for border in self.borders.iter() {
            ids.push(border.id());
            ids.extend(border.children.iter().map(|tab| tab.id.clone()));
        }
        for window in self.floating.windows() {
            ids.push(window.id.clone());
            collect_row_ids(&window.layout, &mut ids);
        }
        ids
    }
}

pub(crate) fn resolve_delete_when_empty(attributes: &ModelAttributes, tabset: &TabSetNode) -> bool {
    tabset
        .enable_delete_when_empty
        .unwrap_or(attributes.tab_set_enable_delete_when_empty)
}

fn is_prunable(attributes: &ModelAttributes, tabset: &TabSetNode) -> bool {
    tabset.children.is_empty() && resolve_delete_when_empty(attributes, tabset)
}

fn fix_tabset_selection(tabset: &mut TabSetNode) {
    let len = tabset.children.len();
    tabset.selected = match tabset.selected {
        _ if len == 0 => None,
        None => Some(0),
        Some(index) => Some(index.min(len - 1)),
    };
}

fn prune_empty_tabsets(row: &mut RowNode, attributes: &ModelAttributes, keep: Option<&NodeId>) {
    row.children.retain_mut(|child| match child {
        LayoutNode::Row(nested) => {
            prune_empty_tabsets(nested, attributes, keep);
            true
        }
        LayoutNode::TabSet(tabset) => {
            !is_prunable(attributes, tabset) || keep.is_some_and(|id| *id == tabset.id)
        }
    });
}

/// Drop empty rows, collapse single-child rows and flatten same-orientation
/// nesting. Weights of flattened children are scaled to the parent's share.
fn normalize_row(row: &mut RowNode) {
    let children = std::mem::take(&mut row.children);
    for child in children {
        match child {
            LayoutNode::TabSet(tabset) => row.children.push(LayoutNode::TabSet(tabset)),
            LayoutNode::Row(mut nested) => {
                normalize_row(&mut nested);
                if nested.children.len() == 1 {
                    if let Some(mut only) = nested.children.pop() {
                        only.set_weight(nested.weight);
                        push_flattened(row, only);
                    }
                } else if !nested.children.is_empty() {
                    push_flattened(row, LayoutNode::Row(nested));
                }
            }
        }
    }
}

fn push_flattened(row: &mut RowNode, child: LayoutNode) {
    match child {
        LayoutNode::Row(nested) if nested.orientation == row.orientation => {
            let total = nested.total_weight();
            let share = nested.weight;
            for mut grandchild in nested.children {
                if total > 0.0 {
                    grandchild.set_weight(grandchild.weight() / total * share);
                }
                row.children.push(grandchild);
            }
        }
        other => row.children.push(other),
    }
}

/// Replace a root whose only child is a row by that row's children.
fn hoist_root(root: &mut RowNode) {
    while root.children.len() == 1 {
        let Some(LayoutNode::Row(_)) = root.children.first() else {
            break;
        };
        let Some(LayoutNode::Row(only)) = root.children.pop() else {
            break;
        };
        root.orientation = only.orientation;
        root.children = only.children;
    }
}

fn validate_row(row: &RowNode, is_root: bool) -> Result<(), ModelError> {
    if is_root {
        if let [LayoutNode::Row(_)] = row.children.as_slice() {
            return Err(ModelError::DegenerateRow { row: row.id.clone() });
        }
    } else if row.children.len() < 2 {
        return Err(ModelError::DegenerateRow { row: row.id.clone() });
    }
    for child in &row.children {
        let weight = child.weight();
        if !(weight.is_finite() && weight > 0.0) {
            return Err(ModelError::InvalidWeight {
                id: child.id().clone(),
                weight,
            });
        }
        if let LayoutNode::Row(nested) = child {
            if nested.orientation == row.orientation {
                return Err(ModelError::OrientationConflict {
                    row: nested.id.clone(),
                });
            }
            validate_row(nested, false)?;
        }
    }
    Ok(())
}

fn validate_tabset(
    attributes: &ModelAttributes,
    tabset: &TabSetNode,
    may_stay_empty: bool,
) -> Result<(), ModelError> {
    let len = tabset.children.len();
    match tabset.selected {
        Some(selected) if selected >= len => Err(ModelError::InvalidSelection {
            node: tabset.id.clone(),
            selected,
            len,
        }),
        None if len > 0 => Err(ModelError::MissingSelection {
            tabset: tabset.id.clone(),
        }),
        _ if is_prunable(attributes, tabset) && !may_stay_empty => {
            Err(ModelError::StaleEmptyTabset {
                tabset: tabset.id.clone(),
            })
        }
        _ => Ok(()),
    }
}

fn index_row(
    row: &mut RowNode,
    path: String,
    scope: Scope,
    position: &mut Vec<usize>,
    index: &mut FxHashMap<NodeId, NodeAddress>,
) {
    index.insert(
        row.id.clone(),
        NodeAddress::Row {
            scope,
            path: position.clone(),
        },
    );
    for (i, child) in row.children.iter_mut().enumerate() {
        position.push(i);
        match child {
            LayoutNode::Row(nested) => {
                index_row(nested, format!("{path}/r{i}"), scope, position, index);
            }
            LayoutNode::TabSet(tabset) => {
                let tabset_path = format!("{path}/ts{i}");
                index.insert(
                    tabset.id.clone(),
                    NodeAddress::TabSet {
                        scope,
                        path: position.clone(),
                    },
                );
                for (j, tab) in tabset.children.iter_mut().enumerate() {
                    tab.set_path(format!("{tabset_path}/tb{j}"));
                    index.insert(
                        tab.id.clone(),
                        NodeAddress::Tab {
                            parent: TabParent::TabSet {
                                scope,
                                path: position.clone(),
                            },
                            index: j,
                        },
                    );
                }
                tabset.set_path(tabset_path);
            }
        }
        position.pop();
    }
    row.set_path(path);
}

fn collect_row_ids(row: &RowNode, ids: &mut Vec<NodeId>) {
    ids.push(row.id.clone());
    for child in &row.children {
        match child {
            LayoutNode::Row(nested) => collect_row_ids(nested, ids),
            LayoutNode::TabSet(tabset) => {
                ids.push(tabset.id.clone());
                ids.extend(tabset.children.iter().map(|tab| tab.id.clone()));
            }
        }
    }
}

/// Visit every assignable id (borders have fixed ids and are skipped).
fn walk_ids(model: &mut LayoutModel, visit: &mut dyn FnMut(&mut NodeId)) {
    walk_row_ids(&mut model.root, visit);
    for location in BorderLocation::ALL {
        for tab in &mut model.borders.get_mut(location).children {
            visit(&mut tab.id);
        }
    }
    for window in model.floating.windows_mut() {
        visit(&mut window.id);
        walk_row_ids(&mut window.layout, visit);
    }
}

fn walk_row_ids(row: &mut RowNode, visit: &mut dyn FnMut(&mut NodeId)) {
    visit(&mut row.id);
    for child in &mut row.children {
        match child {
            LayoutNode::Row(nested) => walk_row_ids(nested, visit),
            LayoutNode::TabSet(tabset) => {
                visit(&mut tabset.id);
                for tab in &mut tabset.children {
                    visit(&mut tab.id);
                }
            }
        }
    }
}

pub(crate) fn row_at<'a>(root: &'a RowNode, path: &[usize]) -> Option<&'a RowNode> {
    let mut row = root;
    for &i in path {
        row = row.children.get(i)?.as_row()?;
    }
    Some(row)
}

pub(crate) fn row_at_mut<'a>(root: &'a mut RowNode, path: &[usize]) -> Option<&'a mut RowNode> {
    let mut row = root;
    for &i in path {
        row = match row.children.get_mut(i)? {
            LayoutNode::Row(nested) => nested,
            LayoutNode::TabSet(_) => return None,
        };
    }
    Some(row)
}

pub(crate) fn tabset_at<'a>(root: &'a RowNode, path: &[usize]) -> Option<&'a TabSetNode> {
    let (last, parent) = path.split_last()?;
    row_at(root, parent)?.children.get(*last)?.as_tabset()
}

pub(crate) fn tabset_at_mut<'a>(root: &'a mut RowNode, path: &[usize]) -> Option<&'a mut TabSetNode> {
    let (last, parent) = path.split_last()?;
    match row_at_mut(root, parent)?.children.get_mut(*last)? {
        LayoutNode::TabSet(tabset) => Some(tabset),
        LayoutNode::Row(_) => None,
    }
}
