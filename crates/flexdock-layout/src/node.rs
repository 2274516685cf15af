//! Layout tree nodes.
//!
//! The main tree is a [`RowNode`] whose children are [`LayoutNode`]s (rows or
//! tab-sets). Tabs live in tab-sets and borders; borders and floating windows
//! hang off the model, not off the main tree.
//!
//! Selected indices are `Option<usize>` in memory and `-1`-for-none integers
//! on the wire.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Weight assigned to nodes whose definition omits one.
pub const DEFAULT_WEIGHT: f64 = 100.0;

/// Default pixel size of an expanded border.
pub const DEFAULT_BORDER_SIZE: f64 = 200.0;

pub(crate) fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

fn default_border_size() -> f64 {
    DEFAULT_BORDER_SIZE
}

/// Node identifier, unique within one model.
///
/// An empty id means "unassigned"; the model replaces unassigned ids with
/// generated `#<n>` ids when a definition is loaded or inserted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create an id from any string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty placeholder id.
    #[must_use]
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn generated(counter: u64) -> Self {
        Self(format!("#{counter}"))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Axis along which a row lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Children left to right.
    #[default]
    Horizontal,
    /// Children top to bottom.
    Vertical,
}

impl Orientation {
    /// The other axis.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Discrete drop location within a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockLocation {
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl DockLocation {
    /// The four edge locations in hit-test priority order.
    pub const EDGES: [Self; 4] = [Self::Left, Self::Right, Self::Top, Self::Bottom];

    #[must_use]
    pub const fn is_edge(self) -> bool {
        !matches!(self, Self::Center)
    }

    /// Row orientation that places a new sibling on this edge.
    #[must_use]
    pub const fn axis(self) -> Option<Orientation> {
        match self {
            Self::Left | Self::Right => Some(Orientation::Horizontal),
            Self::Top | Self::Bottom => Some(Orientation::Vertical),
            Self::Center => None,
        }
    }

    /// True when the incoming node goes before the target.
    #[must_use]
    pub const fn is_leading(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for DockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the four fixed border docks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderLocation {
    Top,
    Bottom,
    Left,
    Right,
}

impl BorderLocation {
    pub const ALL: [Self; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Fixed node id of the border at this location.
    #[must_use]
    pub fn node_id(self) -> NodeId {
        NodeId(format!("border_{}", self.as_str()))
    }

    /// Parse a fixed border id (`border_left`, ...).
    #[must_use]
    pub fn from_node_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|location| id.strip_prefix("border_") == Some(location.as_str()))
    }

    /// Top and bottom borders span the full width of the layout.
    #[must_use]
    pub const fn spans_width(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

impl fmt::Display for BorderLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a tab-set draws its tab strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabLocation {
    #[default]
    Top,
    Bottom,
}

/// A tab: one panel with a title, an icon and an opaque component handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabNode {
    #[serde(default, skip_serializing_if = "NodeId::is_unassigned")]
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    /// Opaque content reference resolved by the host.
    #[serde(default)]
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_drag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_close: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_rename: Option<bool>,
    /// Arbitrary host payload, round-tripped untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
    #[serde(skip)]
    path: String,
}

impl TabNode {
    #[must_use]
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            component: component.into(),
            icon: None,
            enable_drag: None,
            enable_close: None,
            enable_rename: None,
            config: Value::Null,
            path: String::new(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn with_enable_drag(mut self, enabled: bool) -> Self {
        self.enable_drag = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_enable_close(mut self, enabled: bool) -> Self {
        self.enable_close = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_enable_rename(mut self, enabled: bool) -> Self {
        self.enable_rename = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Positional path, e.g. `/r0/ts1/tb0`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }
}

/// A tab-set: an ordered strip of tabs with one selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSetNode {
    #[serde(default, skip_serializing_if = "NodeId::is_unassigned")]
    pub id: NodeId,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<TabNode>,
    #[serde(default, with = "selected_index")]
    pub selected: Option<usize>,
    #[serde(default)]
    pub min_width: f64,
    #[serde(default)]
    pub min_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_drag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_drop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_close: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_divide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_tab_strip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_delete_when_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_location: Option<TabLocation>,
    #[serde(skip)]
    path: String,
}

impl TabSetNode {
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            weight: DEFAULT_WEIGHT,
            name: None,
            children: Vec::new(),
            selected: None,
            min_width: 0.0,
            min_height: 0.0,
            max_width: None,
            max_height: None,
            enable_drag: None,
            enable_drop: None,
            enable_close: None,
            enable_divide: None,
            enable_tab_strip: None,
            enable_delete_when_empty: None,
            tab_location: None,
            path: String::new(),
        }
    }

    /// Replace the tabs, selecting the first one.
    #[must_use]
    pub fn with_tabs(mut self, tabs: Vec<TabNode>) -> Self {
        self.selected = if tabs.is_empty() { None } else { Some(0) };
        self.children = tabs;
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn with_selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn with_enable_drop(mut self, enabled: bool) -> Self {
        self.enable_drop = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_enable_drag(mut self, enabled: bool) -> Self {
        self.enable_drag = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_enable_divide(mut self, enabled: bool) -> Self {
        self.enable_divide = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_enable_delete_when_empty(mut self, enabled: bool) -> Self {
        self.enable_delete_when_empty = Some(enabled);
        self
    }

    /// The selected tab, if any.
    #[must_use]
    pub fn selected_tab(&self) -> Option<&TabNode> {
        self.selected.and_then(|index| self.children.get(index))
    }

    /// Position of a child tab.
    #[must_use]
    pub fn position_of(&self, tab: &str) -> Option<usize> {
        self.children.iter().position(|child| child.id.as_str() == tab)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }
}

/// A row: children laid out along one axis, sized by weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowNode {
    #[serde(default, skip_serializing_if = "NodeId::is_unassigned")]
    pub id: NodeId,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub children: Vec<LayoutNode>,
    #[serde(skip)]
    path: String,
}

impl RowNode {
    #[must_use]
    pub fn new(id: impl Into<NodeId>, orientation: Orientation) -> Self {
        Self {
            id: id.into(),
            weight: DEFAULT_WEIGHT,
            orientation,
            children: Vec::new(),
            path: String::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<LayoutNode>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }

    /// Sum of child weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.children.iter().map(LayoutNode::weight).sum()
    }

    /// Every tab-set below this row in document order.
    #[must_use]
    pub fn tabsets(&self) -> Vec<&TabSetNode> {
        let mut out = Vec::new();
        collect_tabsets(self, &mut out);
        out
    }

    pub(crate) fn tabsets_mut(&mut self) -> Vec<&mut TabSetNode> {
        let mut out = Vec::new();
        collect_tabsets_mut(self, &mut out);
        out
    }

    /// Number of tab-sets below this row.
    #[must_use]
    pub fn tabset_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                LayoutNode::Row(row) => row.tabset_count(),
                LayoutNode::TabSet(_) => 1,
            })
            .sum()
    }

    /// Flip this row and every nested row.
    pub(crate) fn flip_orientation(&mut self) {
        self.orientation = self.orientation.flip();
        for child in &mut self.children {
            if let LayoutNode::Row(row) = child {
                row.flip_orientation();
            }
        }
    }

    /// Force nested rows to alternate starting from this row's orientation.
    pub(crate) fn enforce_alternation(&mut self) {
        let nested = self.orientation.flip();
        for child in &mut self.children {
            if let LayoutNode::Row(row) = child {
                row.orientation = nested;
                row.enforce_alternation();
            }
        }
    }
}

fn collect_tabsets<'a>(row: &'a RowNode, out: &mut Vec<&'a TabSetNode>) {
    for child in &row.children {
        match child {
            LayoutNode::Row(nested) => collect_tabsets(nested, out),
            LayoutNode::TabSet(tabset) => out.push(tabset),
        }
    }
}

fn collect_tabsets_mut<'a>(row: &'a mut RowNode, out: &mut Vec<&'a mut TabSetNode>) {
    for child in &mut row.children {
        match child {
            LayoutNode::Row(nested) => collect_tabsets_mut(nested, out),
            LayoutNode::TabSet(tabset) => out.push(tabset),
        }
    }
}

/// A child of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutNode {
    Row(RowNode),
    TabSet(TabSetNode),
}

impl LayoutNode {
    #[must_use]
    pub fn id(&self) -> &NodeId {
        match self {
            Self::Row(row) => &row.id,
            Self::TabSet(tabset) => &tabset.id,
        }
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        match self {
            Self::Row(row) => row.weight,
            Self::TabSet(tabset) => tabset.weight,
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        match self {
            Self::Row(row) => row.weight = weight,
            Self::TabSet(tabset) => tabset.weight = weight,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Row(row) => row.path(),
            Self::TabSet(tabset) => tabset.path(),
        }
    }

    #[must_use]
    pub fn as_row(&self) -> Option<&RowNode> {
        match self {
            Self::Row(row) => Some(row),
            Self::TabSet(_) => None,
        }
    }

    #[must_use]
    pub fn as_tabset(&self) -> Option<&TabSetNode> {
        match self {
            Self::TabSet(tabset) => Some(tabset),
            Self::Row(_) => None,
        }
    }
}

/// A border dock holding tabs along one edge of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderNode {
    pub location: BorderLocation,
    #[serde(default)]
    pub children: Vec<TabNode>,
    /// `None` (wire `-1`) is the collapsed state.
    #[serde(default, with = "selected_index")]
    pub selected: Option<usize>,
    #[serde(default = "default_border_size")]
    pub size: f64,
    #[serde(default)]
    pub min_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_drop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_hide: Option<bool>,
    #[serde(skip)]
    path: String,
}

impl BorderNode {
    #[must_use]
    pub fn new(location: BorderLocation) -> Self {
        Self {
            location,
            children: Vec::new(),
            selected: None,
            size: DEFAULT_BORDER_SIZE,
            min_size: 0.0,
            max_size: None,
            enable_drop: None,
            auto_hide: None,
            path: String::new(),
        }
    }

    /// Fixed id: `border_<location>`.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.location.node_id()
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.selected.is_none()
    }

    #[must_use]
    pub fn selected_tab(&self) -> Option<&TabNode> {
        self.selected.and_then(|index| self.children.get(index))
    }

    #[must_use]
    pub fn position_of(&self, tab: &str) -> Option<usize> {
        self.children.iter().position(|child| child.id.as_str() == tab)
    }

    /// Clamp a requested size into `[min_size, max_size]`.
    #[must_use]
    pub fn clamp_size(&self, size: f64) -> f64 {
        let upper = self.max_size.unwrap_or(f64::INFINITY).max(self.min_size);
        size.clamp(self.min_size, upper)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: String) {
        self.path = path;
    }
}

/// Serde adapter: `Option<usize>` as a `-1`-for-none integer.
pub(crate) mod selected_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(index) => {
                let index = i64::try_from(*index).map_err(serde::ser::Error::custom)?;
                serializer.serialize_i64(index)
            }
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}

/// Serde adapter: a [`RowNode`] written with its `"type": "row"` tag.
///
/// A bare tab-set in that position is accepted and wrapped in a row.
pub(crate) mod tagged_row {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{LayoutNode, NodeId, Orientation, RowNode};

    pub fn serialize<S: Serializer>(row: &RowNode, serializer: S) -> Result<S::Ok, S::Error> {
        LayoutNode::Row(row.clone()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RowNode, D::Error> {
        match LayoutNode::deserialize(deserializer)? {
            LayoutNode::Row(row) => Ok(row),
            tabset @ LayoutNode::TabSet(_) => {
                Ok(RowNode::new(NodeId::default(), Orientation::Horizontal).with_children(vec![tabset]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selected_index_uses_minus_one_for_none() {
        let mut border = BorderNode::new(BorderLocation::Left);
        let value = serde_json::to_value(&border).expect("serialize border");
        assert_eq!(value["selected"], json!(-1));

        border.children.push(TabNode::new("a", "A", "panel"));
        border.selected = Some(0);
        let value = serde_json::to_value(&border).expect("serialize border");
        assert_eq!(value["selected"], json!(0));

        let parsed: BorderNode =
            serde_json::from_value(json!({"location": "left", "selected": -7})).expect("parse");
        assert_eq!(parsed.selected, None);
    }

    #[test]
    fn layout_node_uses_type_discriminator() {
        let node = LayoutNode::TabSet(TabSetNode::new("ts"));
        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(value["type"], json!("tabset"));

        let row: LayoutNode = serde_json::from_value(json!({
            "type": "row",
            "id": "r",
            "children": [{"type": "tabset", "id": "inner"}]
        }))
        .expect("parse row");
        let LayoutNode::Row(row) = row else {
            unreachable!("expected row");
        };
        assert_eq!(row.children[0].id().as_str(), "inner");
        assert_eq!(row.children[0].weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn tab_config_round_trips_untouched() {
        let tab = TabNode::new("t", "Title", "editor").with_config(json!({"file": "a.rs", "line": 3}));
        let value = serde_json::to_value(&tab).expect("serialize");
        let back: TabNode = serde_json::from_value(value).expect("parse");
        assert_eq!(back, tab);
    }

    #[test]
    fn border_ids_are_fixed() {
        assert_eq!(BorderLocation::Right.node_id().as_str(), "border_right");
        assert_eq!(BorderLocation::from_node_id("border_bottom"), Some(BorderLocation::Bottom));
        assert_eq!(BorderLocation::from_node_id("border_middle"), None);
    }

    #[test]
    fn dock_location_axes() {
        assert_eq!(DockLocation::Left.axis(), Some(Orientation::Horizontal));
        assert_eq!(DockLocation::Bottom.axis(), Some(Orientation::Vertical));
        assert_eq!(DockLocation::Center.axis(), None);
        assert!(DockLocation::Top.is_leading());
        assert!(!DockLocation::Right.is_leading());
    }

    #[test]
    fn clamp_size_respects_bounds() {
        let mut border = BorderNode::new(BorderLocation::Bottom);
        border.min_size = 50.0;
        border.max_size = Some(400.0);
        assert_eq!(border.clamp_size(10.0), 50.0);
        assert_eq!(border.clamp_size(900.0), 400.0);
        assert_eq!(border.clamp_size(120.0), 120.0);
    }
}
