//! Persisted layout record, schema version 2.
//!
//! ```json
//! {
//!   "version": 2,
//!   "grid": { "center": { "layout": { ... } }, "left": { ... } },
//!   "panels": { "notes": { "title": "Notes", "icon": "book", "component": "notes-browser" } },
//!   "dockedGroups": [
//!     { "id": "left-main", "zone": "left", "size": 280.0, "tabs": ["notes"], "selected": 0 }
//!   ],
//!   "visibility": { "left": true, "right": false, "bottom": false },
//!   "widths": { "left": 280.0, "right": 280.0, "bottom": 200.0 }
//! }
//! ```
//!
//! `grid` holds each zone's full model. `panels` and `dockedGroups` describe
//! the dock zones independently of the tree so a zone whose tree is lost can
//! be rebuilt.

use std::collections::BTreeMap;

use flexdock_layout::{
    LayoutModel, LayoutNode, ModelAttributes, ModelError, ModelSnapshot, NodeId, RowNode, TabNode,
    TabSetNode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::zones::{Zone, ZoneState};

/// Current record schema version.
pub const RECORD_VERSION: u32 = 2;

fn default_record_version() -> u32 {
    RECORD_VERSION
}

/// Tab metadata supplied by the panel host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub component: String,
}

impl PanelInfo {
    #[must_use]
    pub fn from_tab(tab: &TabNode) -> Self {
        Self {
            title: tab.name.clone(),
            icon: tab.icon.clone(),
            component: tab.component.clone(),
        }
    }

    /// Tab for `id` described by this panel.
    #[must_use]
    pub fn to_tab(&self, id: &str) -> TabNode {
        let tab = TabNode::new(id, self.title.clone(), self.component.clone());
        match &self.icon {
            Some(icon) => tab.with_icon(icon.clone()),
            None => tab,
        }
    }
}

/// A docked tab-set and the zone holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockedGroup {
    pub id: String,
    pub zone: Zone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default)]
    pub tabs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
}

/// The whole persisted state of a shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    #[serde(default = "default_record_version")]
    pub version: u32,
    #[serde(default)]
    pub grid: BTreeMap<Zone, Value>,
    #[serde(default)]
    pub panels: BTreeMap<String, PanelInfo>,
    #[serde(default)]
    pub docked_groups: Vec<DockedGroup>,
    #[serde(default)]
    pub visibility: BTreeMap<Zone, bool>,
    #[serde(default)]
    pub widths: BTreeMap<Zone, f64>,
}

impl Default for PersistedRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            grid: BTreeMap::new(),
            panels: BTreeMap::new(),
            docked_groups: Vec::new(),
            visibility: BTreeMap::new(),
            widths: BTreeMap::new(),
        }
    }
}

impl PersistedRecord {
    /// Store `model` as the tree of `zone` and index its tabs.
    ///
    /// Tabs of dock zones are also listed in `dockedGroups`, one group per
    /// tab-set, sized with `size`.
    pub fn insert_zone(&mut self, zone: Zone, model: &LayoutModel, size: Option<f64>) -> Result<(), ModelError> {
        self.grid.insert(zone, model.to_value()?);
        for tab in model.tabs() {
            self.panels
                .insert(tab.id.to_string(), PanelInfo::from_tab(tab));
        }
        self.docked_groups.retain(|group| group.zone != zone);
        if zone.is_dock() {
            for tabset in model.tabsets() {
                if tabset.children.is_empty() {
                    continue;
                }
                self.docked_groups.push(DockedGroup {
                    id: tabset.id.to_string(),
                    zone,
                    size,
                    tabs: tabset.children.iter().map(|tab| tab.id.to_string()).collect(),
                    selected: tabset.selected,
                });
            }
        }
        Ok(())
    }

    pub fn insert_state(&mut self, zone: Zone, state: ZoneState) {
        self.visibility.insert(zone, state.visible);
        self.widths.insert(zone, state.width);
    }

    /// Groups docked in `zone`, in record order.
    pub fn groups_in(&self, zone: Zone) -> impl Iterator<Item = &DockedGroup> {
        self.docked_groups
            .iter()
            .filter(move |group| group.zone == zone)
    }

    /// Rebuild a zone tree from its docked groups and the panel index.
    ///
    /// Tabs without panel metadata are named after their id. Returns `None`
    /// when the zone has no group with at least one tab.
    pub fn rebuild_zone(&self, zone: Zone) -> Option<Result<LayoutModel, ModelError>> {
        let children: Vec<LayoutNode> = self
            .groups_in(zone)
            .filter(|group| !group.tabs.is_empty())
            .map(|group| LayoutNode::TabSet(self.group_tabset(group)))
            .collect();
        if children.is_empty() {
            return None;
        }
        // Side docks stack their groups; the bottom dock lays them out in a line.
        let global = ModelAttributes {
            root_orientation_vertical: zone != Zone::Bottom,
            ..ModelAttributes::default()
        };
        let layout = RowNode::new(NodeId::default(), global.root_orientation()).with_children(children);
        let snapshot = ModelSnapshot {
            global,
            layout,
            borders: Vec::new(),
            floating: Vec::new(),
            active_tabset: None,
            maximized_tabset: None,
        };
        Some(LayoutModel::from_snapshot(snapshot))
    }

    fn group_tabset(&self, group: &DockedGroup) -> TabSetNode {
        let tabs: Vec<TabNode> = group
            .tabs
            .iter()
            .map(|id| match self.panels.get(id) {
                Some(panel) => panel.to_tab(id),
                None => TabNode::new(id.as_str(), id.clone(), ""),
            })
            .collect();
        let selected = group
            .selected
            .filter(|index| *index < tabs.len())
            .or(Some(0));
        TabSetNode::new(group.id.as_str())
            .with_tabs(tabs)
            .with_selected(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn side_model() -> LayoutModel {
        LayoutModel::from_value(json!({
            "layout": {"type": "row", "children": [
                {"type": "tabset", "id": "left-main", "selected": 1, "children": [
                    {"id": "files", "name": "Files", "component": "file-tree", "icon": "folder"},
                    {"id": "search", "name": "Search", "component": "search"}
                ]}
            ]}
        }))
        .unwrap()
    }

    #[test]
    fn insert_zone_indexes_panels_and_groups() {
        let mut record = PersistedRecord::default();
        record.insert_zone(Zone::Left, &side_model(), Some(280.0)).unwrap();

        assert_eq!(record.panels["files"].icon.as_deref(), Some("folder"));
        assert_eq!(record.panels["search"].title, "Search");
        assert_eq!(record.docked_groups.len(), 1);
        let group = &record.docked_groups[0];
        assert_eq!(group.id, "left-main");
        assert_eq!(group.tabs, vec!["files", "search"]);
        assert_eq!(group.selected, Some(1));
        assert_eq!(group.size, Some(280.0));
    }

    #[test]
    fn center_tabs_are_not_docked_groups() {
        let mut record = PersistedRecord::default();
        record.insert_zone(Zone::Center, &side_model(), None).unwrap();
        assert!(record.docked_groups.is_empty());
        assert_eq!(record.panels.len(), 2);
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let mut record = PersistedRecord::default();
        record.insert_zone(Zone::Left, &side_model(), Some(280.0)).unwrap();
        record.insert_state(Zone::Left, ZoneState::new(true, 280.0));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["version"], json!(2));
        assert!(value["dockedGroups"].is_array());
        assert_eq!(value["visibility"]["left"], json!(true));
        assert_eq!(value["widths"]["left"], json!(280.0));
        assert!(value["grid"]["left"]["layout"].is_object());
    }

    #[test]
    fn rebuild_zone_from_groups() {
        let mut record = PersistedRecord::default();
        record.insert_zone(Zone::Left, &side_model(), Some(280.0)).unwrap();
        record.grid.clear();
        record.docked_groups[0].tabs.push("orphan".into());

        let rebuilt = record.rebuild_zone(Zone::Left).unwrap().unwrap();
        let tabset = rebuilt.find_tabset("left-main").unwrap();
        let names: Vec<&str> = tabset.children.iter().map(|tab| tab.name.as_str()).collect();
        assert_eq!(names, vec!["Files", "Search", "orphan"]);
        assert_eq!(tabset.selected, Some(1));
        assert_eq!(
            rebuilt.find_tab("files").and_then(|tab| tab.icon.as_deref()),
            Some("folder")
        );
        assert!(record.rebuild_zone(Zone::Right).is_none());
    }
}
