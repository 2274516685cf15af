//! Global model attributes and partial attribute patches.
//!
//! Per-node flags are `Option<bool>`; `None` inherits the matching global
//! attribute here. Resolution goes through the `LayoutModel` accessors.

use serde::{Deserialize, Serialize};

use crate::node::{BorderNode, Orientation, TabLocation, TabNode, TabSetNode};

/// Model-wide defaults and switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelAttributes {
    pub tab_enable_drag: bool,
    pub tab_enable_close: bool,
    pub tab_enable_rename: bool,
    pub tab_set_enable_drag: bool,
    pub tab_set_enable_drop: bool,
    pub tab_set_enable_divide: bool,
    pub tab_set_enable_close: bool,
    pub tab_set_enable_tab_strip: bool,
    pub tab_set_enable_delete_when_empty: bool,
    pub border_enable_drop: bool,
    pub border_auto_hide: bool,
    /// Allow docking against the outer edges of the whole layout.
    pub enable_edge_dock: bool,
    pub root_orientation_vertical: bool,
    /// Thickness of a border's tab bar in pixels.
    pub border_bar_size: f64,
    pub tab_strip_height: f64,
    pub splitter_size: f64,
}

impl Default for ModelAttributes {
    fn default() -> Self {
        Self {
            tab_enable_drag: true,
            tab_enable_close: true,
            tab_enable_rename: true,
            tab_set_enable_drag: true,
            tab_set_enable_drop: true,
            tab_set_enable_divide: true,
            tab_set_enable_close: false,
            tab_set_enable_tab_strip: true,
            tab_set_enable_delete_when_empty: true,
            border_enable_drop: true,
            border_auto_hide: false,
            enable_edge_dock: true,
            root_orientation_vertical: false,
            border_bar_size: 30.0,
            tab_strip_height: 30.0,
            splitter_size: 8.0,
        }
    }
}

impl ModelAttributes {
    /// Orientation of the main root row.
    #[must_use]
    pub const fn root_orientation(&self) -> Orientation {
        if self.root_orientation_vertical {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }

    /// Names of pixel attributes that are not finite and non-negative.
    #[must_use]
    pub fn invalid_sizes(&self) -> Vec<&'static str> {
        [
            ("borderBarSize", self.border_bar_size),
            ("tabStripHeight", self.tab_strip_height),
            ("splitterSize", self.splitter_size),
        ]
        .into_iter()
        .filter(|(_, value)| !(value.is_finite() && *value >= 0.0))
        .map(|(name, _)| name)
        .collect()
    }

    /// Merge a patch; returns true if anything changed.
    pub fn apply(&mut self, patch: &ModelAttributesPatch) -> bool {
        let before = self.clone();
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    self.$field = value;
                })*
            };
        }
        merge!(
            tab_enable_drag,
            tab_enable_close,
            tab_enable_rename,
            tab_set_enable_drag,
            tab_set_enable_drop,
            tab_set_enable_divide,
            tab_set_enable_close,
            tab_set_enable_tab_strip,
            tab_set_enable_delete_when_empty,
            border_enable_drop,
            border_auto_hide,
            enable_edge_dock,
            root_orientation_vertical,
            border_bar_size,
            tab_strip_height,
            splitter_size,
        );
        *self != before
    }
}

/// Partial update for [`ModelAttributes`]; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelAttributesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_enable_drag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_enable_close: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_enable_rename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_set_enable_drag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_set_enable_drop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_set_enable_divide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_set_enable_close: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_set_enable_tab_strip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_set_enable_delete_when_empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_enable_drop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_auto_hide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_edge_dock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_orientation_vertical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bar_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_strip_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splitter_size: Option<f64>,
}

/// Partial update for a single node.
///
/// Fields that do not apply to the addressed node kind are ignored; a patch
/// that touches nothing applicable is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeAttributesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_drag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_drop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_close: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_rename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_divide: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_tab_strip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_delete_when_empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_location: Option<TabLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_hide: Option<bool>,
}

impl NodeAttributesPatch {
    pub(crate) fn apply_to_tab(&self, tab: &mut TabNode) {
        if let Some(name) = &self.name {
            tab.name.clone_from(name);
        }
        if let Some(icon) = &self.icon {
            tab.icon = Some(icon.clone());
        }
        set_flag(&mut tab.enable_drag, self.enable_drag);
        set_flag(&mut tab.enable_close, self.enable_close);
        set_flag(&mut tab.enable_rename, self.enable_rename);
    }

    pub(crate) fn apply_to_tabset(&self, tabset: &mut TabSetNode) {
        if let Some(name) = &self.name {
            tabset.name = Some(name.clone());
        }
        if let Some(weight) = self.weight {
            tabset.weight = weight;
        }
        set_flag(&mut tabset.enable_drag, self.enable_drag);
        set_flag(&mut tabset.enable_drop, self.enable_drop);
        set_flag(&mut tabset.enable_close, self.enable_close);
        set_flag(&mut tabset.enable_divide, self.enable_divide);
        set_flag(&mut tabset.enable_tab_strip, self.enable_tab_strip);
        set_flag(&mut tabset.enable_delete_when_empty, self.enable_delete_when_empty);
        if let Some(location) = self.tab_location {
            tabset.tab_location = Some(location);
        }
        if let Some(value) = self.min_width {
            tabset.min_width = value;
        }
        if let Some(value) = self.min_height {
            tabset.min_height = value;
        }
        if let Some(value) = self.max_width {
            tabset.max_width = Some(value);
        }
        if let Some(value) = self.max_height {
            tabset.max_height = Some(value);
        }
    }

    pub(crate) fn apply_to_border(&self, border: &mut BorderNode) {
        if let Some(value) = self.min_size {
            border.min_size = value;
        }
        if let Some(value) = self.max_size {
            border.max_size = Some(value);
        }
        if let Some(size) = self.size {
            border.size = border.clamp_size(size);
        }
        set_flag(&mut border.enable_drop, self.enable_drop);
        set_flag(&mut border.auto_hide, self.auto_hide);
    }

    /// Numeric fields that are present but not finite, or negative.
    #[must_use]
    pub fn invalid_numbers(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if let Some(weight) = self.weight
            && !(weight.is_finite() && weight > 0.0)
        {
            invalid.push("weight");
        }
        for (name, value) in [
            ("minWidth", self.min_width),
            ("minHeight", self.min_height),
            ("maxWidth", self.max_width),
            ("maxHeight", self.max_height),
            ("size", self.size),
            ("minSize", self.min_size),
            ("maxSize", self.max_size),
        ] {
            if let Some(value) = value
                && !(value.is_finite() && value >= 0.0)
            {
                invalid.push(name);
            }
        }
        invalid
    }
}

fn set_flag(slot: &mut Option<bool>, value: Option<bool>) {
    if value.is_some() {
        *slot = value;
    }
}
