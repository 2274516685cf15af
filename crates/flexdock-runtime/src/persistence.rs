//! Debounced persistence of zone layouts.
//!
//! [`ZonePersistence`] owns the storage backend. Writes are trailing-debounced
//! and driven by explicit timestamps: [`schedule`](ZonePersistence::schedule)
//! replaces the pending record and pushes the deadline out,
//! [`poll`](ZonePersistence::poll) writes once the deadline has passed, and
//! [`flush`](ZonePersistence::flush) writes immediately before unload or
//! navigation.
//!
//! Loading never fails. Legacy keys are migrated first; after that every
//! slot of the record is parsed on its own, and a slot that does not parse
//! logs a warning and falls back to its default without touching the others.

use std::collections::BTreeMap;
use std::time::Duration;

use flexdock_core::{debug, warn};
use flexdock_layout::LayoutModel;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use web_time::Instant;

use crate::error::PersistenceError;
use crate::migration::{KeySpace, MigrationReport, migrate_legacy};
use crate::record::{DockedGroup, PanelInfo, PersistedRecord, RECORD_VERSION};
use crate::storage::StorageBackend;
use crate::zones::Zone;

/// Default trailing debounce for writes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// How a zone's model was obtained on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSource {
    /// Parsed from `grid`.
    Stored,
    /// Rebuilt from `dockedGroups` and `panels`.
    Rebuilt,
    /// Nothing usable was stored.
    Default,
}

/// Result of [`ZonePersistence::load`].
#[derive(Debug, Clone)]
pub struct LoadedLayout {
    pub models: BTreeMap<Zone, LayoutModel>,
    pub sources: BTreeMap<Zone, ZoneSource>,
    pub visibility: BTreeMap<Zone, bool>,
    pub widths: BTreeMap<Zone, f64>,
    pub migration: MigrationReport,
    /// Slots that were present but unreadable, e.g. `grid.left`.
    pub corrupt: Vec<String>,
}

impl LoadedLayout {
    fn defaults(migration: MigrationReport, corrupt: Vec<String>) -> Self {
        let models = Zone::ALL
            .iter()
            .map(|zone| (*zone, LayoutModel::default()))
            .collect();
        let sources = Zone::ALL
            .iter()
            .map(|zone| (*zone, ZoneSource::Default))
            .collect();
        Self {
            models,
            sources,
            visibility: BTreeMap::new(),
            widths: BTreeMap::new(),
            migration,
            corrupt,
        }
    }

    #[must_use]
    pub fn source(&self, zone: Zone) -> ZoneSource {
        self.sources.get(&zone).copied().unwrap_or(ZoneSource::Default)
    }
}

#[derive(Debug, Clone)]
struct Pending {
    record: PersistedRecord,
    due: Instant,
}

/// Storage-backed, debounced layout persistence.
#[derive(Debug)]
pub struct ZonePersistence<S> {
    storage: S,
    keys: KeySpace,
    debounce: Duration,
    pending: Option<Pending>,
    writes: u64,
}

impl<S: StorageBackend> ZonePersistence<S> {
    #[must_use]
    pub fn new(storage: S, keys: KeySpace, debounce: Duration) -> Self {
        Self {
            storage,
            keys,
            debounce,
            pending: None,
            writes: 0,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Drops any pending write.
    #[must_use]
    pub fn into_storage(self) -> S {
        self.storage
    }

    #[must_use]
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending write becomes due.
    #[must_use]
    pub fn due_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    /// Records written so far.
    #[must_use]
    pub const fn write_count(&self) -> u64 {
        self.writes
    }

    /// Queue `record`, replacing any pending one and restarting the delay.
    pub fn schedule(&mut self, record: PersistedRecord, now: Instant) {
        let due = now + self.debounce;
        self.pending = Some(Pending { record, due });
    }

    /// Write the pending record if its deadline has passed.
    ///
    /// Returns whether a write happened. On error the record stays pending.
    pub fn poll(&mut self, now: Instant) -> Result<bool, PersistenceError> {
        if self.pending.as_ref().is_some_and(|pending| pending.due <= now) {
            self.flush()
        } else {
            Ok(false)
        }
    }

    /// Write the pending record now.
    pub fn flush(&mut self) -> Result<bool, PersistenceError> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        if let Err(err) = self.write(&pending.record) {
            self.pending = Some(pending);
            return Err(err);
        }
        Ok(true)
    }

    /// Write `record` immediately, bypassing the debounce.
    pub fn write(&mut self, record: &PersistedRecord) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(record)?;
        let key = self.keys.layout();
        self.storage.set(&key, &json)?;
        self.writes = self.writes.saturating_add(1);
        debug!(
            target: "flexdock.persist",
            key = %key,
            bytes = json.len(),
            backend = self.storage.name(),
            "layout written"
        );
        Ok(())
    }

    /// Migrate, then read the record slot by slot.
    pub fn load(&mut self) -> LoadedLayout {
        let migration = match migrate_legacy(&mut self.storage, &self.keys) {
            Ok(report) => report,
            Err(err) => {
                warn!(target: "flexdock.persist", error = %err, "legacy migration failed");
                MigrationReport::default()
            }
        };

        let key = self.keys.layout();
        let raw = match self.storage.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadedLayout::defaults(migration, Vec::new()),
            Err(err) => {
                warn!(target: "flexdock.persist", key = %key, error = %err, "layout read failed");
                return LoadedLayout::defaults(migration, Vec::new());
            }
        };

        let object = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                warn!(target: "flexdock.persist", key = %key, "layout record is not an object; using defaults");
                return LoadedLayout::defaults(migration, vec!["record".into()]);
            }
            Err(err) => {
                warn!(target: "flexdock.persist", key = %key, error = %err, "layout record is corrupt; using defaults");
                return LoadedLayout::defaults(migration, vec!["record".into()]);
            }
        };

        let version = object.get("version").and_then(Value::as_u64);
        if version != Some(u64::from(RECORD_VERSION)) {
            warn!(
                target: "flexdock.persist",
                key = %key,
                ?version,
                expected = RECORD_VERSION,
                "unsupported layout record version; using defaults"
            );
            return LoadedLayout::defaults(migration, vec!["version".into()]);
        }

        let mut corrupt = Vec::new();
        let record = PersistedRecord {
            version: RECORD_VERSION,
            grid: BTreeMap::new(),
            panels: slot::<BTreeMap<String, PanelInfo>>(&object, "panels", &mut corrupt),
            docked_groups: slot::<Vec<DockedGroup>>(&object, "dockedGroups", &mut corrupt),
            visibility: zone_slot::<bool>(&object, "visibility", &mut corrupt),
            widths: zone_slot::<f64>(&object, "widths", &mut corrupt),
        };
        let grid = match object.get("grid") {
            None => Map::new(),
            Some(Value::Object(grid)) => grid.clone(),
            Some(_) => {
                warn!(target: "flexdock.persist", slot = "grid", "slot is corrupt; using defaults");
                corrupt.push("grid".into());
                Map::new()
            }
        };

        let mut loaded = LoadedLayout::defaults(migration, Vec::new());
        for zone in Zone::ALL {
            let stored = grid.get(zone.as_str()).and_then(|value| {
                match LayoutModel::from_value(value.clone()) {
                    Ok(model) => Some(model),
                    Err(err) => {
                        warn!(
                            target: "flexdock.persist",
                            zone = %zone,
                            error = %err,
                            "zone layout is corrupt; falling back"
                        );
                        corrupt.push(format!("grid.{zone}"));
                        None
                    }
                }
            });
            let (model, source) = match stored {
                Some(model) => (model, ZoneSource::Stored),
                None => match record.rebuild_zone(zone) {
                    Some(Ok(model)) => (model, ZoneSource::Rebuilt),
                    Some(Err(err)) => {
                        warn!(
                            target: "flexdock.persist",
                            zone = %zone,
                            error = %err,
                            "docked groups do not form a valid layout"
                        );
                        (LayoutModel::default(), ZoneSource::Default)
                    }
                    None => (LayoutModel::default(), ZoneSource::Default),
                },
            };
            loaded.models.insert(zone, model);
            loaded.sources.insert(zone, source);
        }
        loaded.visibility = record.visibility;
        loaded.widths = record.widths;
        loaded.corrupt = corrupt;
        loaded
    }
}

/// Parse one top-level slot; a missing slot is the default.
fn slot<T: DeserializeOwned + Default>(object: &Map<String, Value>, name: &str, corrupt: &mut Vec<String>) -> T {
    let Some(value) = object.get(name) else {
        return T::default();
    };
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(target: "flexdock.persist", slot = name, error = %err, "slot is corrupt; using defaults");
            corrupt.push(name.to_owned());
            T::default()
        }
    }
}

/// Like [`slot`] for zone maps, but keeps the entries that do parse.
fn zone_slot<T: DeserializeOwned>(
    object: &Map<String, Value>,
    name: &str,
    corrupt: &mut Vec<String>,
) -> BTreeMap<Zone, T> {
    let Some(value) = object.get(name) else {
        return BTreeMap::new();
    };
    let Value::Object(entries) = value else {
        warn!(target: "flexdock.persist", slot = name, "slot is not a map; using defaults");
        corrupt.push(name.to_owned());
        return BTreeMap::new();
    };
    let mut parsed = BTreeMap::new();
    for (zone_name, value) in entries {
        let Ok(zone) = zone_name.parse::<Zone>() else {
            continue;
        };
        match serde_json::from_value(value.clone()) {
            Ok(value) => {
                parsed.insert(zone, value);
            }
            Err(_) => corrupt.push(format!("{name}.{zone}")),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn persistence(storage: MemoryStorage) -> ZonePersistence<MemoryStorage> {
        ZonePersistence::new(storage, KeySpace::default(), DEFAULT_DEBOUNCE)
    }

    fn center() -> LayoutModel {
        LayoutModel::from_value(json!({
            "layout": {"type": "row", "children": [
                {"type": "tabset", "id": "main", "children": [{"id": "chat", "name": "Chat"}]}
            ]}
        }))
        .unwrap()
    }

    fn record() -> PersistedRecord {
        let mut record = PersistedRecord::default();
        record.insert_zone(Zone::Center, &center(), None).unwrap();
        record
    }

    #[test]
    fn schedule_coalesces_until_due() {
        let mut store = persistence(MemoryStorage::new());
        let t0 = Instant::now();
        store.schedule(record(), t0);
        store.schedule(record(), t0 + Duration::from_millis(200));

        assert!(!store.poll(t0 + Duration::from_millis(400)).unwrap());
        assert!(store.storage().is_empty());
        assert!(store.poll(t0 + Duration::from_millis(500)).unwrap());
        assert_eq!(store.write_count(), 1);
        assert!(!store.has_pending());
        assert!(!store.poll(t0 + Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn flush_writes_immediately() {
        let mut store = persistence(MemoryStorage::new());
        assert!(!store.flush().unwrap());
        store.schedule(record(), Instant::now());
        assert!(store.flush().unwrap());
        assert!(store.storage().contains("dock-layout").unwrap());
    }

    #[test]
    fn load_round_trips_written_record() {
        let mut store = persistence(MemoryStorage::new());
        let mut written = record();
        written.visibility.insert(Zone::Left, false);
        written.widths.insert(Zone::Left, 310.0);
        store.write(&written).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.source(Zone::Center), ZoneSource::Stored);
        assert_eq!(loaded.source(Zone::Left), ZoneSource::Default);
        assert_eq!(loaded.models[&Zone::Center], center());
        assert_eq!(loaded.visibility.get(&Zone::Left), Some(&false));
        assert_eq!(loaded.widths.get(&Zone::Left), Some(&310.0));
        assert!(loaded.corrupt.is_empty());
    }

    #[test]
    fn unparsable_record_uses_defaults() {
        let mut store = persistence(MemoryStorage::with_entries([("dock-layout", "{{{")]));
        let loaded = store.load();
        assert_eq!(loaded.corrupt, vec!["record"]);
        assert!(Zone::ALL.iter().all(|zone| loaded.source(*zone) == ZoneSource::Default));
    }

    #[test]
    fn corrupt_zone_falls_back_alone() {
        let mut value = serde_json::to_value(record()).unwrap();
        value["grid"]["right"] = json!({"layout": 42});
        value["widths"] = json!({"left": 250, "right": "wide"});
        let mut store = persistence(MemoryStorage::with_entries([("dock-layout", value.to_string())]));

        let loaded = store.load();
        assert_eq!(loaded.source(Zone::Center), ZoneSource::Stored);
        assert_eq!(loaded.source(Zone::Right), ZoneSource::Default);
        assert_eq!(loaded.widths.get(&Zone::Left), Some(&250.0));
        assert!(loaded.corrupt.contains(&"grid.right".to_owned()));
        assert!(loaded.corrupt.contains(&"widths.right".to_owned()));
    }

    #[test]
    fn missing_zone_is_rebuilt_from_groups() {
        let mut value = serde_json::to_value(record()).unwrap();
        value["panels"]["files"] = json!({"title": "Files", "component": "file-tree"});
        value["dockedGroups"] = json!([
            {"id": "left-main", "zone": "left", "size": 280.0, "tabs": ["files"], "selected": 0}
        ]);
        let mut store = persistence(MemoryStorage::with_entries([("dock-layout", value.to_string())]));

        let loaded = store.load();
        assert_eq!(loaded.source(Zone::Left), ZoneSource::Rebuilt);
        let left = &loaded.models[&Zone::Left];
        assert_eq!(left.find_tab("files").map(|tab| tab.name.as_str()), Some("Files"));
    }

    #[test]
    fn unknown_version_uses_defaults() {
        let mut value = serde_json::to_value(record()).unwrap();
        value["version"] = json!(7);
        let mut store = persistence(MemoryStorage::with_entries([("dock-layout", value.to_string())]));
        let loaded = store.load();
        assert_eq!(loaded.corrupt, vec!["version"]);
        assert_eq!(loaded.source(Zone::Center), ZoneSource::Default);
    }
}
