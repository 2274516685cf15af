//! Action application.
//!
//! [`LayoutModel::apply`] runs an action against a clone, brings the clone
//! into canonical form and validates it. The original model is never touched,
//! so a rejected action leaves nothing behind.

use rustc_hash::FxHashSet;

use flexdock_core::geometry::Rect;

use crate::action::{Action, ActionRejection, NodeDefinition};
use crate::attributes::{ModelAttributesPatch, NodeAttributesPatch};
use crate::float::{DockAnchor, FloatingWindow};
use crate::model::{LayoutModel, NodeAddress, Scope, TabParent, row_at, row_at_mut, tabset_at};
use crate::node::{
    BorderLocation, DEFAULT_WEIGHT, DockLocation, LayoutNode, NodeId, Orientation, RowNode,
    TabNode, TabSetNode,
};

/// What is being dropped onto a target.
enum Payload {
    /// Loose tabs; `selected` indexes into `tabs`.
    Tabs {
        tabs: Vec<TabNode>,
        selected: Option<usize>,
        expand_border: bool,
    },
    /// A tab-set or row subtree.
    Node(LayoutNode),
}

impl Payload {
    fn into_tabs(self) -> (Vec<TabNode>, Option<usize>, bool) {
        match self {
            Self::Tabs {
                tabs,
                selected,
                expand_border,
            } => (tabs, selected, expand_border),
            Self::Node(LayoutNode::TabSet(tabset)) => (tabset.children, tabset.selected, false),
            Self::Node(LayoutNode::Row(row)) => {
                let mut tabs = Vec::new();
                let mut selected = None;
                for tabset in row.tabsets() {
                    if selected.is_none()
                        && let Some(index) = tabset.selected
                    {
                        selected = Some(tabs.len() + index);
                    }
                    tabs.extend(tabset.children.iter().cloned());
                }
                (tabs, selected, false)
            }
        }
    }
}

fn missing(id: &NodeId) -> ActionRejection {
    ActionRejection::MissingNode { id: id.clone() }
}

fn wrong_kind(id: &NodeId, expected: &'static str) -> ActionRejection {
    ActionRejection::WrongNodeKind {
        id: id.clone(),
        expected,
    }
}

/// `-1` and out-of-range indices append.
fn clamp_index(index: i64, len: usize) -> usize {
    usize::try_from(index)
        .ok()
        .filter(|&i| i <= len)
        .unwrap_or(len)
}

impl LayoutModel {
    /// Apply one action, returning the next model.
    ///
    /// The action runs on a clone; on success the clone is tidied and
    /// validated. An action that leaves the model structurally equal is
    /// rejected with [`ActionRejection::NoNetChange`].
    pub fn apply(&self, action: Action) -> Result<Self, ActionRejection> {
        let mut next = self.clone();
        next.apply_inner(action)?;
        next.tidy();
        next.validate().map_err(ActionRejection::Validation)?;
        if next == *self {
            return Err(ActionRejection::NoNetChange);
        }
        Ok(next)
    }

    fn apply_inner(&mut self, action: Action) -> Result<(), ActionRejection> {
        match action {
            Action::AddNode {
                definition,
                to_node,
                location,
                index,
                select,
            } => self.add_node(definition, &to_node, location, index, select),
            Action::DeleteTab { tab_id } => self.delete_tab(&tab_id),
            Action::DeleteTabset { tabset_id } => self.delete_tabset(&tabset_id),
            Action::MoveTab {
                tab_id,
                to_node,
                location,
                index,
            } => self.move_tab(&tab_id, &to_node, location, index),
            Action::MoveTabset {
                tabset_id,
                to_node,
                location,
                index,
            } => self.move_tabset(&tabset_id, &to_node, location, index),
            Action::AdjustWeights {
                row_id,
                weights,
                orientation,
            } => self.adjust_weights(&row_id, &weights, orientation),
            Action::FloatTabset { tabset_id, rect } => self.float_tabset(&tabset_id, rect),
            Action::DockFloatingWindow { window_id, target } => {
                self.dock_floating_window(&window_id, target.as_ref())
            }
            Action::UpdateModelAttributes { attributes } => {
                self.update_model_attributes(&attributes)
            }
            Action::SelectTab { tab_id } => self.select_tab(&tab_id),
            Action::RenameTab { tab_id, name } => self.rename_tab(&tab_id, name),
            Action::SetActiveTabset { tabset_id } => self.set_active_tabset(tabset_id),
            Action::MaximizeToggle { tabset_id } => self.maximize_toggle(&tabset_id),
            Action::AdjustBorderSize { location, size } => self.adjust_border_size(location, size),
            Action::UpdateNodeAttributes {
                node_id,
                attributes,
            } => self.update_node_attributes(&node_id, &attributes),
            Action::BringToFront { window_id } => self.floating.bring_to_front(window_id.as_str()),
            Action::MinimizeWindow { window_id } => self.floating.minimize(window_id.as_str()),
            Action::MaximizeWindow { window_id } => self.floating.maximize(window_id.as_str()),
            Action::RestoreWindow { window_id } => self.floating.restore(window_id.as_str()),
            Action::MoveWindow { window_id, rect } => {
                self.floating.set_rect(window_id.as_str(), rect)
            }
        }
    }

    // -- Insertion ---------------------------------------------------------

    fn add_node(
        &mut self,
        mut definition: NodeDefinition,
        to_node: &NodeId,
        location: DockLocation,
        index: i64,
        select: Option<bool>,
    ) -> Result<(), ActionRejection> {
        let mut reserved = FxHashSet::default();
        {
            let mut explicit: Vec<&NodeId> = Vec::new();
            match &definition {
                NodeDefinition::Tab(tab) => explicit.push(&tab.id),
                NodeDefinition::TabSet(tabset) => {
                    explicit.push(&tabset.id);
                    explicit.extend(tabset.children.iter().map(|tab| &tab.id));
                }
            }
            for id in explicit.into_iter().filter(|id| !id.is_unassigned()) {
                if self.address(id.as_str()).is_some() || !reserved.insert(id.clone()) {
                    return Err(ActionRejection::DuplicateId { id: id.clone() });
                }
            }
        }

        match &mut definition {
            NodeDefinition::Tab(tab) => {
                if tab.id.is_unassigned() {
                    tab.id = self.generate_id(&reserved);
                }
            }
            NodeDefinition::TabSet(tabset) => {
                if tabset.id.is_unassigned() {
                    tabset.id = self.generate_id(&reserved);
                }
                for tab in &mut tabset.children {
                    if tab.id.is_unassigned() {
                        tab.id = self.generate_id(&reserved);
                    }
                }
            }
        }

        let payload = match definition {
            NodeDefinition::Tab(tab) => {
                let onto_border = matches!(self.address(to_node.as_str()), Some(NodeAddress::Border(_)));
                let selected = select.unwrap_or(!onto_border).then_some(0);
                Payload::Tabs {
                    tabs: vec![tab],
                    selected,
                    expand_border: select == Some(true),
                }
            }
            NodeDefinition::TabSet(tabset) => Payload::Node(LayoutNode::TabSet(tabset)),
        };
        self.drop_payload(payload, to_node, location, index)
    }

    /// Place a payload at `target`/`location`. Tab-set and border targets
    /// honour their drop flags; tab-set edges also need divide.
    fn drop_payload(
        &mut self,
        payload: Payload,
        target: &NodeId,
        location: DockLocation,
        index: i64,
    ) -> Result<(), ActionRejection> {
        let address = self
            .address(target.as_str())
            .cloned()
            .ok_or_else(|| missing(target))?;
        match address {
            NodeAddress::TabSet { scope, path } => {
                let tabset = self
                    .scope_root(scope)
                    .and_then(|root| tabset_at(root, &path))
                    .ok_or_else(|| missing(target))?;
                if !self.tabset_enable_drop(tabset) {
                    return Err(ActionRejection::DropDisabled { id: target.clone() });
                }
                if location == DockLocation::Center {
                    let (tabs, selected, _) = payload.into_tabs();
                    let parent = TabParent::TabSet { scope, path };
                    if self.insert_tabs(&parent, tabs, selected, index)? {
                        self.active_tabset = Some(target.clone());
                    }
                    return Ok(());
                }
                if !self.tabset_enable_divide(tabset) {
                    return Err(ActionRejection::DivideDisabled { id: target.clone() });
                }
                let node = self.payload_node(payload);
                self.insert_at_edge(scope, &path, node, location)
            }
            NodeAddress::Row { scope, path } => {
                let node = self.payload_node(payload);
                if location == DockLocation::Center {
                    return self.append_to_row(scope, &path, node, target);
                }
                if scope == Scope::Main && path.is_empty() && !self.attributes.enable_edge_dock {
                    return Err(ActionRejection::EdgeDockDisabled);
                }
                self.insert_at_edge(scope, &path, node, location)
            }
            NodeAddress::Border(border_location) => {
                if location != DockLocation::Center {
                    return Err(ActionRejection::InvalidLocation {
                        id: target.clone(),
                        location,
                    });
                }
                let border = self.borders.get(border_location);
                if !self.border_enable_drop(border) {
                    return Err(ActionRejection::DropDisabled { id: target.clone() });
                }
                let expanded = !border.is_collapsed();
                let (tabs, selected, expand_border) = payload.into_tabs();
                let selected = selected.filter(|_| expanded || expand_border);
                self.insert_tabs(&TabParent::Border(border_location), tabs, selected, index)?;
                Ok(())
            }
            NodeAddress::Tab { .. } | NodeAddress::Window(_) => {
                Err(wrong_kind(target, "tab-set, row or border"))
            }
        }
    }

    /// Splice tabs into a tab list; returns true if one of them was selected.
    fn insert_tabs(
        &mut self,
        parent: &TabParent,
        tabs: Vec<TabNode>,
        selected: Option<usize>,
        index: i64,
    ) -> Result<bool, ActionRejection> {
        let Some((list, slot)) = self.tab_list_mut(parent) else {
            return Err(ActionRejection::NoNetChange);
        };
        let at = clamp_index(index, list.len());
        let count = tabs.len();
        list.splice(at..at, tabs);
        if let Some(current) = *slot
            && current >= at
        {
            *slot = Some(current + count);
        }
        if let Some(offset) = selected
            && offset < count
        {
            *slot = Some(at + offset);
            return Ok(true);
        }
        Ok(false)
    }

    /// Turn a payload into a tree node, wrapping loose tabs in a new tab-set.
    fn payload_node(&mut self, payload: Payload) -> LayoutNode {
        match payload {
            Payload::Tabs { tabs, selected, .. } => {
                let id = self.generate_id(&FxHashSet::default());
                let mut tabset = TabSetNode::new(id).with_tabs(tabs);
                if let Some(offset) = selected {
                    tabset.selected = Some(offset);
                }
                LayoutNode::TabSet(tabset)
            }
            Payload::Node(node) => node,
        }
    }

    fn append_to_row(
        &mut self,
        scope: Scope,
        path: &[usize],
        mut node: LayoutNode,
        target: &NodeId,
    ) -> Result<(), ActionRejection> {
        let row = self
            .scope_root_mut(scope)
            .and_then(|root| row_at_mut(root, path))
            .ok_or_else(|| missing(target))?;
        let weight = if row.children.is_empty() {
            DEFAULT_WEIGHT
        } else {
            row.total_weight() / row.children.len() as f64
        };
        node.set_weight(weight);
        let activated = match &node {
            LayoutNode::TabSet(tabset) => Some(tabset.id.clone()),
            LayoutNode::Row(_) => None,
        };
        row.children.push(node);
        if activated.is_some() {
            self.active_tabset = activated;
        }
        Ok(())
    }

    /// Split beside the node at `path`.
    ///
    /// If the parent row already runs along the edge's axis the node becomes a
    /// sibling and the target's weight is halved between them; otherwise the
    /// target is wrapped in a new row with a 50/50 split. At the scope root the
    /// whole layout is docked against.
    fn insert_at_edge(
        &mut self,
        scope: Scope,
        path: &[usize],
        mut node: LayoutNode,
        location: DockLocation,
    ) -> Result<(), ActionRejection> {
        let Some(axis) = location.axis() else {
            return Err(ActionRejection::InvalidLocation {
                id: node.id().clone(),
                location,
            });
        };
        let activated = match &node {
            LayoutNode::TabSet(tabset) => Some(tabset.id.clone()),
            LayoutNode::Row(_) => None,
        };
        let leading = location.is_leading();
        let Some(root) = self.scope_root_mut(scope) else {
            return Err(ActionRejection::NoNetChange);
        };

        match path.split_last() {
            None => dock_against_root(root, node, axis, leading),
            Some((&last, parent_path)) => {
                let Some(parent) = row_at_mut(root, parent_path) else {
                    return Err(ActionRejection::NoNetChange);
                };
                if last >= parent.children.len() {
                    return Err(ActionRejection::NoNetChange);
                }
                if parent.orientation == axis {
                    let half = parent.children[last].weight() / 2.0;
                    parent.children[last].set_weight(half);
                    node.set_weight(half);
                    let at = if leading { last } else { last + 1 };
                    parent.children.insert(at, node);
                } else {
                    let mut existing = parent.children.remove(last);
                    let weight = existing.weight();
                    existing.set_weight(50.0);
                    node.set_weight(50.0);
                    let children = if leading {
                        vec![node, existing]
                    } else {
                        vec![existing, node]
                    };
                    let wrapper = RowNode::new(NodeId::default(), axis)
                        .with_weight(weight)
                        .with_children(children);
                    parent.children.insert(last, LayoutNode::Row(wrapper));
                }
            }
        }

        if activated.is_some() {
            self.active_tabset = activated;
        }
        Ok(())
    }

    // -- Removal -----------------------------------------------------------

    /// Remove a tab and repair its owner's selection.
    ///
    /// Tab-sets keep the same index (clamped); a border collapses when its
    /// open tab leaves.
    fn detach_tab(&mut self, parent: &TabParent, index: usize) -> Option<(TabNode, bool)> {
        let is_border = matches!(parent, TabParent::Border(_));
        let (list, slot) = self.tab_list_mut(parent)?;
        if index >= list.len() {
            return None;
        }
        let tab = list.remove(index);
        let was_selected = *slot == Some(index);
        *slot = match *slot {
            Some(current) if current == index => {
                if is_border || list.is_empty() {
                    None
                } else {
                    Some(current.min(list.len() - 1))
                }
            }
            Some(current) if current > index => Some(current - 1),
            other => other,
        };
        Some((tab, was_selected))
    }

    fn detach_node(&mut self, scope: Scope, path: &[usize]) -> Option<LayoutNode> {
        let (&last, parent_path) = path.split_last()?;
        let row = row_at_mut(self.scope_root_mut(scope)?, parent_path)?;
        (last < row.children.len()).then(|| row.children.remove(last))
    }

    fn delete_tab(&mut self, tab_id: &NodeId) -> Result<(), ActionRejection> {
        let Some(NodeAddress::Tab { parent, index }) = self.address(tab_id.as_str()).cloned() else {
            return Err(self.missing_or_wrong(tab_id, "tab"));
        };
        self.detach_tab(&parent, index).ok_or_else(|| missing(tab_id))?;
        Ok(())
    }

    fn delete_tabset(&mut self, tabset_id: &NodeId) -> Result<(), ActionRejection> {
        let Some(NodeAddress::TabSet { scope, path }) = self.address(tabset_id.as_str()).cloned()
        else {
            return Err(self.missing_or_wrong(tabset_id, "tab-set"));
        };
        if scope == Scope::Main && self.main_tabset_count() == 1 {
            // The last main tab-set stays as an empty placeholder.
            let tabset = self.tabset_mut(tabset_id.as_str()).ok_or_else(|| missing(tabset_id))?;
            tabset.children.clear();
            tabset.selected = None;
            return Ok(());
        }
        self.detach_node(scope, &path).ok_or_else(|| missing(tabset_id))?;
        Ok(())
    }

    fn missing_or_wrong(&self, id: &NodeId, expected: &'static str) -> ActionRejection {
        if self.address(id.as_str()).is_some() {
            wrong_kind(id, expected)
        } else {
            missing(id)
        }
    }

    // -- Moves -------------------------------------------------------------

    fn move_tab(
        &mut self,
        tab_id: &NodeId,
        to_node: &NodeId,
        location: DockLocation,
        index: i64,
    ) -> Result<(), ActionRejection> {
        let Some(NodeAddress::Tab { parent, index: from }) = self.address(tab_id.as_str()).cloned()
        else {
            return Err(self.missing_or_wrong(tab_id, "tab"));
        };
        let tab = self.find_tab(tab_id.as_str()).ok_or_else(|| missing(tab_id))?;
        if !self.tab_enable_drag(tab) {
            return Err(ActionRejection::DragDisabled { id: tab_id.clone() });
        }
        if to_node == tab_id {
            return Err(ActionRejection::SelfDrop { id: tab_id.clone() });
        }
        let target = self
            .address(to_node.as_str())
            .cloned()
            .ok_or_else(|| missing(to_node))?;
        let same_parent = match (&parent, &target) {
            (
                TabParent::TabSet { scope, path },
                NodeAddress::TabSet {
                    scope: target_scope,
                    path: target_path,
                },
            ) => scope == target_scope && path == target_path,
            (TabParent::Border(source), NodeAddress::Border(destination)) => source == destination,
            _ => false,
        };

        let mut index = index;
        if same_parent {
            let len = self.tab_list(&parent).map_or(0, Vec::len);
            if location == DockLocation::Center {
                let destination = clamp_index(index, len);
                if destination == from || destination == from + 1 {
                    return Err(ActionRejection::NoNetChange);
                }
                let adjusted = if destination > from {
                    destination - 1
                } else {
                    destination
                };
                index = i64::try_from(adjusted).unwrap_or(-1);
            } else if len == 1 {
                return Err(ActionRejection::SelfDrop { id: tab_id.clone() });
            }
        }

        let (tab, was_selected) = self
            .detach_tab(&parent, from)
            .ok_or_else(|| missing(tab_id))?;
        self.set_paths("");
        // Reordering the open tab of a border keeps the border open.
        let payload = Payload::Tabs {
            tabs: vec![tab],
            selected: was_selected.then_some(0),
            expand_border: same_parent && was_selected,
        };
        self.drop_payload(payload, to_node, location, index)
    }

    fn move_tabset(
        &mut self,
        tabset_id: &NodeId,
        to_node: &NodeId,
        location: DockLocation,
        index: i64,
    ) -> Result<(), ActionRejection> {
        let Some(NodeAddress::TabSet { scope, path }) = self.address(tabset_id.as_str()).cloned()
        else {
            return Err(self.missing_or_wrong(tabset_id, "tab-set"));
        };
        let tabset = self
            .find_tabset(tabset_id.as_str())
            .ok_or_else(|| missing(tabset_id))?;
        if !self.tabset_enable_drag(tabset) {
            return Err(ActionRejection::DragDisabled {
                id: tabset_id.clone(),
            });
        }
        if to_node == tabset_id {
            return Err(ActionRejection::SelfDrop {
                id: tabset_id.clone(),
            });
        }
        if self.address(to_node.as_str()).is_none() {
            return Err(missing(to_node));
        }
        if scope == Scope::Main
            && self.main_tabset_count() == 1
            && self.scope_of(to_node.as_str()) != Some(Scope::Main)
        {
            return Err(ActionRejection::LastMainTabset {
                id: tabset_id.clone(),
            });
        }

        let mut node = self
            .detach_node(scope, &path)
            .ok_or_else(|| missing(tabset_id))?;
        node.set_weight(DEFAULT_WEIGHT);
        self.set_paths("");
        self.drop_payload(Payload::Node(node), to_node, location, index)
    }

    fn adjust_weights(
        &mut self,
        row_id: &NodeId,
        weights: &[f64],
        orientation: Orientation,
    ) -> Result<(), ActionRejection> {
        let Some(row) = self.row_mut(row_id.as_str()) else {
            return Err(self.missing_or_wrong(row_id, "row"));
        };
        if row.orientation != orientation {
            return Err(ActionRejection::OrientationMismatch {
                row: row_id.clone(),
                expected: row.orientation,
                actual: orientation,
            });
        }
        if weights.len() != row.children.len() {
            return Err(ActionRejection::WeightCountMismatch {
                row: row_id.clone(),
                expected: row.children.len(),
                actual: weights.len(),
            });
        }
        if let Some((index, &weight)) = weights
            .iter()
            .enumerate()
            .find(|(_, weight)| !(weight.is_finite() && **weight > 0.0))
        {
            return Err(ActionRejection::InvalidWeight {
                row: row_id.clone(),
                index,
                weight,
            });
        }
        for (child, weight) in row.children.iter_mut().zip(weights) {
            child.set_weight(*weight);
        }
        Ok(())
    }

    // -- Floating ----------------------------------------------------------

    fn float_tabset(&mut self, tabset_id: &NodeId, rect: Rect) -> Result<(), ActionRejection> {
        let Some(NodeAddress::TabSet { scope, path }) = self.address(tabset_id.as_str()).cloned()
        else {
            return Err(self.missing_or_wrong(tabset_id, "tab-set"));
        };
        if scope != Scope::Main {
            return Err(wrong_kind(tabset_id, "docked tab-set"));
        }
        if !rect.is_valid_window() {
            return Err(ActionRejection::InvalidRect {
                id: tabset_id.clone(),
            });
        }
        if self.main_tabset_count() == 1 {
            return Err(ActionRejection::LastMainTabset {
                id: tabset_id.clone(),
            });
        }

        let Some((&slot, parent_path)) = path.split_last() else {
            return Err(missing(tabset_id));
        };
        let parent = row_at(&self.root, parent_path).ok_or_else(|| missing(tabset_id))?;
        let parent_id = parent.id.clone();
        let mut node = self
            .detach_node(scope, &path)
            .ok_or_else(|| missing(tabset_id))?;
        let anchor = DockAnchor {
            parent: parent_id,
            index: slot,
            weight: node.weight(),
        };
        node.set_weight(DEFAULT_WEIGHT);

        let window_id = self.generate_id(&FxHashSet::default());
        let layout = RowNode::new(NodeId::default(), Orientation::Horizontal).with_children(vec![node]);
        let mut window = FloatingWindow::new(window_id, rect, layout);
        window.dock_anchor = Some(anchor);
        self.floating.push(window);
        Ok(())
    }

    fn dock_floating_window(
        &mut self,
        window_id: &NodeId,
        target: Option<&NodeId>,
    ) -> Result<(), ActionRejection> {
        let Some(mut window) = self.floating.remove(window_id.as_str()) else {
            return Err(missing(window_id));
        };
        self.set_paths("");

        let mut node = if window.layout.children.len() == 1 {
            match window.layout.children.pop() {
                Some(only) => only,
                None => return Err(missing(window_id)),
            }
        } else {
            LayoutNode::Row(window.layout)
        };

        if let Some(target) = target {
            node.set_weight(DEFAULT_WEIGHT);
            return self.drop_payload(Payload::Node(node), target, DockLocation::Center, -1);
        }

        let anchored = window.dock_anchor.as_ref().and_then(|anchor| {
            match self.address(anchor.parent.as_str()) {
                Some(NodeAddress::Row {
                    scope: Scope::Main,
                    path,
                }) => Some((path.clone(), anchor.index, anchor.weight)),
                _ => None,
            }
        });
        let (path, index, weight) = match anchored {
            Some(found) => found,
            None => {
                let count = self.root.children.len();
                let weight = if count == 0 {
                    DEFAULT_WEIGHT
                } else {
                    self.root.total_weight() / count as f64
                };
                (Vec::new(), count, weight)
            }
        };
        let row = row_at_mut(&mut self.root, &path).ok_or_else(|| missing(window_id))?;
        node.set_weight(weight);
        let at = index.min(row.children.len());
        row.children.insert(at, node);
        Ok(())
    }

    // -- Attributes and selection -----------------------------------------

    fn update_model_attributes(&mut self, patch: &ModelAttributesPatch) -> Result<(), ActionRejection> {
        let was_vertical = self.attributes.root_orientation_vertical;
        if !self.attributes.apply(patch) {
            return Err(ActionRejection::NoNetChange);
        }
        if let Some(name) = self.attributes.invalid_sizes().first().copied() {
            return Err(ActionRejection::InvalidAttribute { name });
        }
        if was_vertical != self.attributes.root_orientation_vertical {
            self.root.flip_orientation();
        }
        Ok(())
    }

    fn select_tab(&mut self, tab_id: &NodeId) -> Result<(), ActionRejection> {
        let Some(NodeAddress::Tab { parent, index }) = self.address(tab_id.as_str()).cloned() else {
            return Err(self.missing_or_wrong(tab_id, "tab"));
        };
        let owner = self.parent_of(tab_id.as_str()).map(|node| node.id());
        let is_border = matches!(parent, TabParent::Border(_));
        let (_, slot) = self.tab_list_mut(&parent).ok_or_else(|| missing(tab_id))?;
        if is_border {
            *slot = if *slot == Some(index) { None } else { Some(index) };
        } else {
            *slot = Some(index);
            self.active_tabset = owner;
        }
        Ok(())
    }

    fn rename_tab(&mut self, tab_id: &NodeId, name: String) -> Result<(), ActionRejection> {
        let Some(tab) = self.find_tab(tab_id.as_str()) else {
            return Err(self.missing_or_wrong(tab_id, "tab"));
        };
        if !self.tab_enable_rename(tab) {
            return Err(ActionRejection::RenameDisabled { id: tab_id.clone() });
        }
        let tab = self.tab_mut(tab_id.as_str()).ok_or_else(|| missing(tab_id))?;
        tab.name = name;
        Ok(())
    }

    fn set_active_tabset(&mut self, tabset_id: Option<NodeId>) -> Result<(), ActionRejection> {
        if let Some(id) = &tabset_id
            && self.find_tabset(id.as_str()).is_none()
        {
            return Err(self.missing_or_wrong(id, "tab-set"));
        }
        self.active_tabset = tabset_id;
        Ok(())
    }

    fn maximize_toggle(&mut self, tabset_id: &NodeId) -> Result<(), ActionRejection> {
        if self.find_tabset(tabset_id.as_str()).is_none() {
            return Err(self.missing_or_wrong(tabset_id, "tab-set"));
        }
        if self.scope_of(tabset_id.as_str()) != Some(Scope::Main) {
            return Err(wrong_kind(tabset_id, "docked tab-set"));
        }
        if self.maximized_tabset.as_ref() == Some(tabset_id) {
            self.maximized_tabset = None;
        } else {
            self.maximized_tabset = Some(tabset_id.clone());
            self.active_tabset = Some(tabset_id.clone());
        }
        Ok(())
    }

    fn adjust_border_size(&mut self, location: BorderLocation, size: f64) -> Result<(), ActionRejection> {
        if !size.is_finite() {
            return Err(ActionRejection::InvalidAttribute { name: "size" });
        }
        let border = self.borders.get_mut(location);
        border.size = border.clamp_size(size);
        Ok(())
    }

    fn update_node_attributes(
        &mut self,
        node_id: &NodeId,
        patch: &NodeAttributesPatch,
    ) -> Result<(), ActionRejection> {
        if let Some(name) = patch.invalid_numbers().first().copied() {
            return Err(ActionRejection::InvalidAttribute { name });
        }
        let address = self
            .address(node_id.as_str())
            .cloned()
            .ok_or_else(|| missing(node_id))?;
        match address {
            NodeAddress::Tab { .. } => {
                let tab = self.tab_mut(node_id.as_str()).ok_or_else(|| missing(node_id))?;
                patch.apply_to_tab(tab);
            }
            NodeAddress::TabSet { .. } => {
                let tabset = self
                    .tabset_mut(node_id.as_str())
                    .ok_or_else(|| missing(node_id))?;
                patch.apply_to_tabset(tabset);
            }
            NodeAddress::Border(location) => patch.apply_to_border(self.borders.get_mut(location)),
            NodeAddress::Row { .. } => {
                let row = self.row_mut(node_id.as_str()).ok_or_else(|| missing(node_id))?;
                if let Some(weight) = patch.weight {
                    row.weight = weight;
                }
            }
            NodeAddress::Window(_) => return Err(wrong_kind(node_id, "tab, tab-set, row or border")),
        }
        Ok(())
    }
}

fn dock_against_root(root: &mut RowNode, mut node: LayoutNode, axis: Orientation, leading: bool) {
    if root.orientation == axis {
        let total = root.total_weight();
        node.set_weight(if total > 0.0 { total } else { DEFAULT_WEIGHT });
        if leading {
            root.children.insert(0, node);
        } else {
            root.children.push(node);
        }
        return;
    }
    let previous = RowNode::new(NodeId::default(), root.orientation)
        .with_weight(50.0)
        .with_children(std::mem::take(&mut root.children));
    node.set_weight(50.0);
    root.orientation = axis;
    root.children = if leading {
        vec![node, LayoutNode::Row(previous)]
    } else {
        vec![LayoutNode::Row(previous), node]
    };
}
