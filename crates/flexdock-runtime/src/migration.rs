//! Storage keys and one-shot migration of legacy layouts.
//!
//! Earlier builds stored the layout under several keys:
//!
//! | key              | contents                               |
//! |------------------|----------------------------------------|
//! | `layout`         | the center tree                        |
//! | `layout:<zone>`  | one tree per zone                      |
//! | `zones`          | `{ "<zone>": <visible> }`              |
//! | `zone-widths`    | `{ "<zone>": <pixels> }`               |
//!
//! [`migrate_legacy`] folds whatever is present into one
//! [`PersistedRecord`] under [`LAYOUT_KEY`], then deletes the legacy keys so
//! storage never holds both formats. When the current key already exists the
//! legacy keys are stale and are deleted without being read.

use std::collections::BTreeMap;

use flexdock_core::{info, warn};
use flexdock_layout::LayoutModel;
use serde_json::Value;

use crate::error::PersistenceError;
use crate::record::PersistedRecord;
use crate::storage::StorageBackend;
use crate::zones::Zone;

/// Key of the current record.
pub const LAYOUT_KEY: &str = "dock-layout";
pub const LEGACY_LAYOUT_KEY: &str = "layout";
pub const LEGACY_ZONE_KEY_PREFIX: &str = "layout:";
pub const LEGACY_VISIBILITY_KEY: &str = "zones";
pub const LEGACY_WIDTHS_KEY: &str = "zone-widths";

/// Optional namespace prepended to every key as `<namespace>:<key>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    namespace: Option<String>,
}

impl KeySpace {
    #[must_use]
    pub fn new(namespace: Option<String>) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn key(&self, base: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}:{base}"),
            None => base.to_owned(),
        }
    }

    #[must_use]
    pub fn layout(&self) -> String {
        self.key(LAYOUT_KEY)
    }

    fn legacy_zone(&self, zone: Zone) -> String {
        self.key(&format!("{LEGACY_ZONE_KEY_PREFIX}{zone}"))
    }

    /// Every legacy key, namespaced.
    #[must_use]
    pub fn legacy_keys(&self) -> Vec<String> {
        let mut keys = vec![self.key(LEGACY_LAYOUT_KEY)];
        keys.extend(Zone::ALL.iter().map(|zone| self.legacy_zone(*zone)));
        keys.push(self.key(LEGACY_VISIBILITY_KEY));
        keys.push(self.key(LEGACY_WIDTHS_KEY));
        keys
    }
}

/// What a migration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// A new record was written from legacy data.
    pub migrated: bool,
    /// Legacy keys deleted, namespaced.
    pub removed: Vec<String>,
    /// Legacy zones whose tree could not be parsed and was dropped.
    pub skipped: Vec<Zone>,
}

impl MigrationReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.migrated && self.removed.is_empty()
    }
}

/// Run the legacy migration against `storage`.
pub fn migrate_legacy<S: StorageBackend + ?Sized>(
    storage: &mut S,
    keys: &KeySpace,
) -> Result<MigrationReport, PersistenceError> {
    let mut present = Vec::new();
    for key in keys.legacy_keys() {
        if storage.contains(&key)? {
            present.push(key);
        }
    }
    let mut report = MigrationReport::default();
    if present.is_empty() {
        return Ok(report);
    }

    if storage.contains(&keys.layout())? {
        info!(
            target: "flexdock.persist",
            count = present.len(),
            "current layout present; discarding legacy keys"
        );
    } else {
        let record = legacy_record(storage, keys, &mut report)?;
        storage.set(&keys.layout(), &serde_json::to_string(&record)?)?;
        report.migrated = true;
        info!(
            target: "flexdock.persist",
            zones = record.grid.len(),
            groups = record.docked_groups.len(),
            legacy_keys = present.len(),
            "migrated legacy layout"
        );
    }

    for key in present {
        storage.remove(&key)?;
        report.removed.push(key);
    }
    Ok(report)
}

fn legacy_record<S: StorageBackend + ?Sized>(
    storage: &S,
    keys: &KeySpace,
    report: &mut MigrationReport,
) -> Result<PersistedRecord, PersistenceError> {
    let mut trees: BTreeMap<Zone, String> = BTreeMap::new();
    if let Some(center) = storage.get(&keys.key(LEGACY_LAYOUT_KEY))? {
        trees.insert(Zone::Center, center);
    }
    // Per-zone keys win over the single-key center tree.
    for zone in Zone::ALL {
        if let Some(tree) = storage.get(&keys.legacy_zone(zone))? {
            trees.insert(zone, tree);
        }
    }

    let visibility = match storage.get(&keys.key(LEGACY_VISIBILITY_KEY))? {
        Some(raw) => zone_map::<bool>(&raw, LEGACY_VISIBILITY_KEY),
        None => BTreeMap::new(),
    };
    let widths = match storage.get(&keys.key(LEGACY_WIDTHS_KEY))? {
        Some(raw) => zone_map::<f64>(&raw, LEGACY_WIDTHS_KEY),
        None => BTreeMap::new(),
    };

    let mut record = PersistedRecord::default();
    for (zone, raw) in trees {
        match LayoutModel::from_json(&raw) {
            Ok(model) => {
                let size = widths.get(&zone).copied();
                record.insert_zone(zone, &model, size)?;
            }
            Err(err) => {
                warn!(
                    target: "flexdock.persist",
                    zone = %zone,
                    error = %err,
                    "legacy zone layout is corrupt; dropping it"
                );
                report.skipped.push(zone);
            }
        }
    }
    record.visibility = visibility;
    record.widths = widths;
    Ok(record)
}

/// Parse a legacy `{ "<zone>": value }` map, skipping unknown zones and
/// values of the wrong type.
fn zone_map<T: serde::de::DeserializeOwned>(raw: &str, key: &str) -> BTreeMap<Zone, T> {
    let entries: BTreeMap<String, Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(target: "flexdock.persist", key, error = %err, "legacy zone map is corrupt");
            return BTreeMap::new();
        }
    };
    entries
        .into_iter()
        .filter_map(|(name, value)| {
            let zone = name.parse::<Zone>().ok()?;
            let value = serde_json::from_value(value).ok()?;
            Some((zone, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn tree(tab: &str) -> String {
        json!({
            "layout": {"type": "row", "children": [
                {"type": "tabset", "id": format!("{tab}-set"), "children": [
                    {"id": tab, "name": tab.to_uppercase()}
                ]}
            ]}
        })
        .to_string()
    }

    #[test]
    fn keys_are_namespaced() {
        let plain = KeySpace::default();
        assert_eq!(plain.layout(), "dock-layout");
        let spaced = KeySpace::new(Some("acme".into()));
        assert_eq!(spaced.layout(), "acme:dock-layout");
        assert!(spaced.legacy_keys().contains(&"acme:layout:left".to_owned()));
        assert_eq!(KeySpace::new(Some(String::new())), plain);
    }

    #[test]
    fn nothing_to_migrate() {
        let mut storage = MemoryStorage::with_entries([("unrelated", "1")]);
        let report = migrate_legacy(&mut storage, &KeySpace::default()).unwrap();
        assert!(report.is_noop());
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn single_key_layout_becomes_center() {
        let mut storage = MemoryStorage::with_entries([("layout", tree("chat"))]);
        let report = migrate_legacy(&mut storage, &KeySpace::default()).unwrap();
        assert!(report.migrated);
        assert_eq!(report.removed, vec!["layout"]);

        let raw = storage.get("dock-layout").unwrap().unwrap();
        let record: PersistedRecord = serde_json::from_str(&raw).unwrap();
        assert!(record.grid.contains_key(&Zone::Center));
        assert_eq!(record.panels["chat"].title, "CHAT");
        assert!(record.docked_groups.is_empty());
    }

    #[test]
    fn per_zone_keys_and_maps_are_merged() {
        let mut storage = MemoryStorage::with_entries([
            ("layout:center".to_owned(), tree("chat")),
            ("layout:left".to_owned(), tree("files")),
            ("zones".to_owned(), r#"{"left": true, "right": false, "top": true}"#.to_owned()),
            ("zone-widths".to_owned(), r#"{"left": 300, "bottom": "wide"}"#.to_owned()),
        ]);
        let report = migrate_legacy(&mut storage, &KeySpace::default()).unwrap();
        assert!(report.migrated);
        assert_eq!(storage.keys().unwrap(), vec!["dock-layout"]);

        let raw = storage.get("dock-layout").unwrap().unwrap();
        let record: PersistedRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.visibility.get(&Zone::Left), Some(&true));
        assert_eq!(record.visibility.get(&Zone::Right), Some(&false));
        assert_eq!(record.visibility.len(), 2);
        assert_eq!(record.widths.get(&Zone::Left), Some(&300.0));
        assert_eq!(record.widths.len(), 1);
        assert_eq!(record.docked_groups.len(), 1);
        assert_eq!(record.docked_groups[0].zone, Zone::Left);
        assert_eq!(record.docked_groups[0].size, Some(300.0));
    }

    #[test]
    fn corrupt_legacy_zone_is_skipped() {
        let mut storage = MemoryStorage::with_entries([
            ("layout:center".to_owned(), tree("chat")),
            ("layout:right".to_owned(), "{not json".to_owned()),
        ]);
        let report = migrate_legacy(&mut storage, &KeySpace::default()).unwrap();
        assert_eq!(report.skipped, vec![Zone::Right]);
        assert_eq!(storage.keys().unwrap(), vec!["dock-layout"]);
    }

    #[test]
    fn existing_record_wins_over_legacy_keys() {
        let current = serde_json::to_string(&PersistedRecord::default()).unwrap();
        let mut storage = MemoryStorage::with_entries([
            ("dock-layout".to_owned(), current.clone()),
            ("layout".to_owned(), tree("chat")),
            ("zones".to_owned(), r#"{"left": false}"#.to_owned()),
        ]);
        let report = migrate_legacy(&mut storage, &KeySpace::default()).unwrap();
        assert!(!report.migrated);
        assert_eq!(report.removed.len(), 2);
        assert_eq!(storage.get("dock-layout").unwrap(), Some(current));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn namespace_isolates_migration() {
        let mut storage = MemoryStorage::with_entries([
            ("acme:layout".to_owned(), tree("chat")),
            ("layout".to_owned(), tree("other")),
        ]);
        let keys = KeySpace::new(Some("acme".into()));
        let report = migrate_legacy(&mut storage, &keys).unwrap();
        assert!(report.migrated);
        assert_eq!(storage.keys().unwrap(), vec!["acme:dock-layout", "layout"]);
    }
}
