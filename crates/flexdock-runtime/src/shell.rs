//! The dock shell: one layout model per zone plus the state around them.
//!
//! [`DockShell`] is what a render bridge talks to. It routes actions to the
//! right zone's model, owns the single [`DragSession`], maps keyboard
//! shortcuts to zone toggles, moves tabs between zones, and hands every
//! committed change to [`ZonePersistence`] for a debounced write.
//!
//! Time is always passed in. Call [`poll`](DockShell::poll) from the event
//! loop and [`flush`](DockShell::flush) before unload.

use std::collections::BTreeMap;
use std::sync::Arc;

use flexdock_core::event::KeyEvent;
use flexdock_core::geometry::Point;
use flexdock_core::keybinding::ShortcutMapper;
use flexdock_core::{info, warn};
use flexdock_layout::{
    Action, ActionDispatcher, DispatchOutcome, DockLocation, DragNoopReason, DragSession,
    DragSignal, DragSource, DragTransition, DropTarget, END_INDEX, LayoutModel, NodeDefinition,
    NodeId,
};
use web_time::Instant;

use crate::config::ShellConfig;
use crate::error::{ConfigError, PersistenceError, ShellError};
use crate::migration::MigrationReport;
use crate::persistence::{ZonePersistence, ZoneSource};
use crate::record::PersistedRecord;
use crate::storage::StorageBackend;
use crate::zones::{MotionPolicy, Zone, ZoneState, ZoneTransition};

/// What loading found, kept for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub sources: BTreeMap<Zone, ZoneSource>,
    pub migration: MigrationReport,
    pub corrupt: Vec<String>,
}

/// Result of [`DockShell::handle_key`].
#[derive(Debug, Clone)]
pub enum KeyOutcome {
    Toggled(ZoneTransition),
    Drag(DragTransition),
    /// Not a shell key; forward it to the focused panel.
    Unhandled,
}

pub struct DockShell<S> {
    config: ShellConfig,
    models: BTreeMap<Zone, Arc<LayoutModel>>,
    states: BTreeMap<Zone, ZoneState>,
    dispatcher: ActionDispatcher,
    drag: DragSession,
    drag_zone: Option<Zone>,
    shortcuts: ShortcutMapper,
    motion: MotionPolicy,
    persistence: ZonePersistence<S>,
    summary: LoadSummary,
}

impl<S> std::fmt::Debug for DockShell<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockShell")
            .field("states", &self.states)
            .field("drag_zone", &self.drag_zone)
            .field("drag_phase", &self.drag.phase())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl<S: StorageBackend> DockShell<S> {
    /// Validate `config`, migrate and load from `storage`.
    pub fn open(config: ShellConfig, storage: S) -> Result<Self, ConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }
        let drag = config
            .drag_session()
            .map_err(|err| ConfigError::Invalid(vec![err.to_string()]))?;

        let mut persistence = ZonePersistence::new(storage, config.key_space(), config.debounce());
        let loaded = persistence.load();

        let mut states = BTreeMap::new();
        for zone in Zone::DOCKS {
            let Some(mut state) = config.zone_state(zone) else {
                continue;
            };
            if let Some(visible) = loaded.visibility.get(&zone) {
                state.visible = *visible;
            }
            if let Some(width) = loaded.widths.get(&zone) {
                state.set_width(*width);
            }
            states.insert(zone, state);
        }

        let models = loaded
            .models
            .into_iter()
            .map(|(zone, model)| (zone, Arc::new(model)))
            .collect();
        let summary = LoadSummary {
            sources: loaded.sources,
            migration: loaded.migration,
            corrupt: loaded.corrupt,
        };
        info!(
            target: "flexdock.shell",
            migrated = summary.migration.migrated,
            corrupt = summary.corrupt.len(),
            backend = persistence.storage().name(),
            "dock shell opened"
        );

        Ok(Self {
            motion: config.motion_policy(),
            config,
            models,
            states,
            dispatcher: ActionDispatcher::new(),
            drag,
            drag_zone: None,
            shortcuts: ShortcutMapper::default(),
            persistence,
            summary,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    #[must_use]
    pub fn load_summary(&self) -> &LoadSummary {
        &self.summary
    }

    /// Current model of `zone`.
    #[must_use]
    pub fn model(&self, zone: Zone) -> Arc<LayoutModel> {
        self.models
            .get(&zone)
            .cloned()
            .unwrap_or_else(|| Arc::new(LayoutModel::default()))
    }

    /// Visibility and width of a dock zone; `None` for the center.
    #[must_use]
    pub fn zone_state(&self, zone: Zone) -> Option<ZoneState> {
        self.states.get(&zone).copied()
    }

    #[must_use]
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher {
        &mut self.dispatcher
    }

    #[must_use]
    pub fn drag_session(&self) -> &DragSession {
        &self.drag
    }

    /// Zone of the active drag.
    #[must_use]
    pub const fn drag_zone(&self) -> Option<Zone> {
        self.drag_zone
    }

    #[must_use]
    pub fn persistence(&self) -> &ZonePersistence<S> {
        &self.persistence
    }

    pub fn set_shortcut_mapper(&mut self, mapper: ShortcutMapper) {
        self.shortcuts = mapper;
    }

    // -- Actions -----------------------------------------------------------

    /// Dispatch `action` against `zone` and commit it when applied.
    pub fn dispatch(&mut self, zone: Zone, action: Action, now: Instant) -> DispatchOutcome {
        let model = self.model(zone);
        let outcome = self.dispatcher.dispatch(&model, action);
        if outcome.status.is_applied() {
            self.models.insert(zone, Arc::clone(&outcome.model));
            self.schedule(now);
        }
        outcome
    }

    /// Move a tab from one zone's model to another's.
    ///
    /// The tab lands in the destination's active tab-set, or its first one,
    /// and is selected. Nothing is committed unless both halves apply.
    pub fn move_tab_to_zone(&mut self, tab_id: &str, from: Zone, to: Zone, now: Instant) -> Result<(), ShellError> {
        if from == to {
            return Err(ShellError::SameZone {
                tab: tab_id.to_owned(),
                zone: from,
            });
        }
        if self.drag.is_active() {
            return Err(ShellError::DragActive);
        }
        let source = self.model(from);
        let Some(tab) = source.find_tab(tab_id) else {
            return Err(ShellError::TabNotFound {
                tab: tab_id.to_owned(),
                zone: from,
            });
        };
        if !source.tab_enable_drag(tab) {
            return Err(ShellError::Locked {
                tab: tab_id.to_owned(),
            });
        }

        let destination = self.model(to);
        let add = Action::AddNode {
            definition: NodeDefinition::Tab(tab.clone()),
            to_node: landing_node(&destination),
            location: DockLocation::Center,
            index: END_INDEX,
            select: Some(true),
        };
        let added = self.dispatcher.dispatch(&destination, add);
        if !added.status.is_applied() {
            return Err(ShellError::Refused {
                zone: to,
                status: added.status,
            });
        }
        let removed = self.dispatcher.dispatch(&source, Action::delete_tab(tab_id));
        if !removed.status.is_applied() {
            return Err(ShellError::Refused {
                zone: from,
                status: removed.status,
            });
        }

        self.models.insert(to, added.model);
        self.models.insert(from, removed.model);
        info!(target: "flexdock.shell", tab = tab_id, %from, %to, "tab moved between zones");
        self.schedule(now);
        Ok(())
    }

    // -- Zones -------------------------------------------------------------

    /// Flip a dock zone's visibility. The center cannot be hidden.
    pub fn toggle(&mut self, zone: Zone, now: Instant) -> Option<ZoneTransition> {
        let state = self.states.get_mut(&zone)?;
        state.toggle();
        let state = *state;
        info!(target: "flexdock.shell", %zone, visible = state.visible, "zone toggled");
        self.schedule(now);
        Some(self.motion.transition(zone, state))
    }

    /// Resize a dock zone; returns whether the width changed.
    pub fn set_zone_width(&mut self, zone: Zone, width: f64, now: Instant) -> bool {
        let changed = self
            .states
            .get_mut(&zone)
            .is_some_and(|state| state.set_width(width));
        if changed {
            self.schedule(now);
        }
        changed
    }

    /// Route a key: Escape to an active drag, then dock shortcuts.
    pub fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> KeyOutcome {
        if self.drag.is_active() {
            let transition = self.drag.key(event);
            if !matches!(
                transition.signal,
                DragSignal::Noop {
                    reason: DragNoopReason::UnhandledKey
                }
            ) {
                self.settle_drag(&transition, now);
                return KeyOutcome::Drag(transition);
            }
        }
        match self.shortcuts.map(event) {
            Some(shortcut) => self
                .toggle(Zone::from_shortcut(shortcut), now)
                .map_or(KeyOutcome::Unhandled, KeyOutcome::Toggled),
            None => KeyOutcome::Unhandled,
        }
    }

    // -- Drag and drop -----------------------------------------------------

    /// Pointer-down on a tab or tab-set of `zone`, or an external drag
    /// entering it.
    pub fn begin_drag(&mut self, zone: Zone, source: DragSource, origin: Point) -> DragTransition {
        let model = self.model(zone);
        let transition = self.drag.begin(&model, source, origin);
        if matches!(transition.signal, DragSignal::Started) {
            self.drag_zone = Some(zone);
        }
        transition
    }

    pub fn drag_move(&mut self, target: Option<&DropTarget>, pointer: Point) -> DragTransition {
        self.drag.pointer_move(target, pointer)
    }

    /// Pointer-up; a successful drop is applied to the drag zone's current
    /// model and committed.
    pub fn release_drag(&mut self, target: Option<&DropTarget>, pointer: Point, now: Instant) -> DragTransition {
        // Without a drag zone the session is idle and release is a no-op.
        let current = self.model(self.drag_zone.unwrap_or(Zone::Center));
        let transition = self.drag.release(&mut self.dispatcher, &current, target, pointer);
        self.settle_drag(&transition, now);
        transition
    }

    pub fn cancel_drag(&mut self) -> Option<DragTransition> {
        let transition = self.drag.force_cancel();
        self.drag_zone = None;
        transition
    }

    fn settle_drag(&mut self, transition: &DragTransition, now: Instant) {
        if let DragSignal::Dropped { model, .. } = &transition.signal
            && let Some(zone) = self.drag_zone
        {
            self.models.insert(zone, Arc::clone(model));
            self.schedule(now);
        }
        if !self.drag.is_active() {
            self.drag_zone = None;
        }
    }

    // -- Persistence -------------------------------------------------------

    /// The record that would be written for the current state.
    pub fn snapshot_record(&self) -> Result<PersistedRecord, PersistenceError> {
        let mut record = PersistedRecord::default();
        for (zone, model) in &self.models {
            let state = self.states.get(zone).copied();
            record.insert_zone(*zone, model, state.map(|state| state.width))?;
            if let Some(state) = state {
                record.insert_state(*zone, state);
            }
        }
        Ok(record)
    }

    /// Write a pending record if its debounce has elapsed. Failures are
    /// logged and retried on the next poll.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.persistence.poll(now) {
            Ok(written) => written,
            Err(err) => {
                warn!(target: "flexdock.persist", error = %err, "debounced layout write failed");
                false
            }
        }
    }

    /// Write any pending record now.
    pub fn flush(&mut self) -> Result<bool, PersistenceError> {
        self.persistence.flush()
    }

    fn schedule(&mut self, now: Instant) {
        match self.snapshot_record() {
            Ok(record) => self.persistence.schedule(record, now),
            Err(err) => {
                warn!(target: "flexdock.persist", error = %err, "failed to capture layout");
            }
        }
    }
}

/// Where a tab moved into a zone lands.
fn landing_node(model: &LayoutModel) -> NodeId {
    model
        .active_tabset()
        .or_else(|| model.root().tabsets().into_iter().next())
        .map_or_else(|| model.root().id.clone(), |tabset| tabset.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use flexdock_core::event::{KeyCode, Modifiers};
    use flexdock_layout::TabNode;
    use serde_json::json;
    use std::time::Duration;

    fn seeded_storage() -> MemoryStorage {
        let center = json!({
            "layout": {"type": "row", "children": [
                {"type": "tabset", "id": "main", "children": [
                    {"id": "chat", "name": "Chat", "component": "chat"},
                    {"id": "notes", "name": "Notes", "component": "notes"}
                ]}
            ]}
        });
        let left = json!({
            "layout": {"type": "row", "children": [
                {"type": "tabset", "id": "left-main", "children": [
                    {"id": "files", "name": "Files", "component": "file-tree"},
                    {"id": "pinned", "name": "Pinned", "component": "outline", "enableDrag": false}
                ]}
            ]}
        });
        let record = json!({
            "version": 2,
            "grid": {"center": center, "left": left},
            "visibility": {"left": true, "bottom": true},
            "widths": {"left": 300.0}
        });
        MemoryStorage::with_entries([("dock-layout", record.to_string())])
    }

    fn shell() -> DockShell<MemoryStorage> {
        DockShell::open(ShellConfig::default(), seeded_storage()).unwrap()
    }

    #[test]
    fn open_applies_stored_zone_state() {
        let shell = shell();
        assert_eq!(shell.zone_state(Zone::Left), Some(ZoneState::new(true, 300.0)));
        assert_eq!(shell.zone_state(Zone::Bottom), Some(ZoneState::new(true, 200.0)));
        assert_eq!(shell.zone_state(Zone::Right), Some(ZoneState::new(false, 280.0)));
        assert_eq!(shell.zone_state(Zone::Center), None);
        assert_eq!(shell.load_summary().sources[&Zone::Center], ZoneSource::Stored);
        assert!(shell.model(Zone::Center).find_tab("chat").is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ShellConfig::default();
        config.drop.edge_fraction = 2.0;
        let err = DockShell::open(config, MemoryStorage::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(errors) if errors.len() == 1));
    }

    #[test]
    fn shortcuts_toggle_zones() {
        let mut shell = shell();
        let now = Instant::now();
        let ctrl_b = KeyEvent::new(KeyCode::Char('b')).with_modifiers(Modifiers::CTRL);

        let KeyOutcome::Toggled(transition) = shell.handle_key(&ctrl_b, now) else {
            panic!("ctrl+b toggles the left zone");
        };
        assert_eq!(transition.zone, Zone::Left);
        assert!(!transition.visible);
        assert_eq!(transition.width, 300.0);
        assert_eq!(transition.duration, Duration::from_millis(200));

        shell.handle_key(&ctrl_b, now);
        assert_eq!(shell.zone_state(Zone::Left), Some(ZoneState::new(true, 300.0)));

        let plain = KeyEvent::new(KeyCode::Char('b'));
        assert!(matches!(shell.handle_key(&plain, now), KeyOutcome::Unhandled));
    }

    #[test]
    fn reduced_motion_toggles_instantly() {
        let mut config = ShellConfig::default();
        config.motion.reduced_motion = true;
        let mut shell = DockShell::open(config, seeded_storage()).unwrap();
        let transition = shell.toggle(Zone::Bottom, Instant::now()).unwrap();
        assert_eq!(transition.duration, Duration::ZERO);
        assert!(shell.toggle(Zone::Center, Instant::now()).is_none());
    }

    #[test]
    fn dispatch_schedules_a_write() {
        let mut shell = shell();
        let t0 = Instant::now();
        let outcome = shell.dispatch(Zone::Center, Action::select_tab("notes"), t0);
        assert!(outcome.status.is_applied());
        assert!(shell.persistence().has_pending());
        assert!(!shell.poll(t0 + Duration::from_millis(100)));
        assert!(shell.poll(t0 + Duration::from_millis(300)));
        assert_eq!(shell.persistence().write_count(), 1);
    }

    #[test]
    fn rejected_dispatch_does_not_schedule() {
        let mut shell = shell();
        let before = shell.model(Zone::Center);
        let outcome = shell.dispatch(Zone::Center, Action::delete_tab("missing"), Instant::now());
        assert!(!outcome.status.is_applied());
        assert!(Arc::ptr_eq(&before, &shell.model(Zone::Center)));
        assert!(!shell.persistence().has_pending());
    }

    #[test]
    fn tab_moves_between_zones() {
        let mut shell = shell();
        shell
            .move_tab_to_zone("files", Zone::Left, Zone::Center, Instant::now())
            .unwrap();

        let center = shell.model(Zone::Center);
        let main = center.find_tabset("main").unwrap();
        assert_eq!(main.children.last().map(|tab| tab.id.as_str()), Some("files"));
        assert_eq!(main.selected_tab().map(|tab| tab.id.as_str()), Some("files"));
        assert!(shell.model(Zone::Left).find_tab("files").is_none());
    }

    #[test]
    fn locked_and_missing_tabs_do_not_move() {
        let mut shell = shell();
        let now = Instant::now();
        assert!(matches!(
            shell.move_tab_to_zone("pinned", Zone::Left, Zone::Center, now),
            Err(ShellError::Locked { .. })
        ));
        assert!(matches!(
            shell.move_tab_to_zone("ghost", Zone::Left, Zone::Center, now),
            Err(ShellError::TabNotFound { .. })
        ));
        assert!(matches!(
            shell.move_tab_to_zone("chat", Zone::Center, Zone::Center, now),
            Err(ShellError::SameZone { .. })
        ));
        assert!(shell.model(Zone::Left).find_tab("pinned").is_some());
    }

    #[test]
    fn escape_cancels_drag_and_keeps_model() {
        let mut shell = shell();
        let before = shell.model(Zone::Center);
        shell.begin_drag(Zone::Center, DragSource::Tab("chat".into()), Point::new(10.0, 10.0));
        assert_eq!(shell.drag_zone(), Some(Zone::Center));

        let escape = KeyEvent::new(KeyCode::Escape);
        let KeyOutcome::Drag(transition) = shell.handle_key(&escape, Instant::now()) else {
            panic!("escape goes to the drag session");
        };
        assert!(matches!(transition.signal, DragSignal::Cancelled { .. }));
        assert_eq!(shell.drag_zone(), None);
        assert!(Arc::ptr_eq(&before, &shell.model(Zone::Center)));
    }

    #[test]
    fn drop_commits_to_drag_zone() {
        let mut shell = shell();
        let now = Instant::now();
        let target = DropTarget::TabSet {
            id: "main".into(),
            rect: flexdock_core::geometry::Rect::new(0.0, 0.0, 800.0, 600.0),
            tab_strip: Some(flexdock_core::geometry::Rect::new(0.0, 0.0, 800.0, 30.0)),
            tab_buttons: vec![
                flexdock_core::geometry::Rect::new(0.0, 0.0, 100.0, 30.0),
                flexdock_core::geometry::Rect::new(100.0, 0.0, 100.0, 30.0),
            ],
        };
        shell.begin_drag(Zone::Center, DragSource::Tab("chat".into()), Point::new(50.0, 15.0));
        shell.drag_move(Some(&target), Point::new(790.0, 300.0));
        let released = shell.release_drag(Some(&target), Point::new(790.0, 300.0), now);
        assert!(matches!(released.signal, DragSignal::Dropped { .. }), "{:?}", released.signal);

        let center = shell.model(Zone::Center);
        assert_eq!(center.main_tabset_count(), 2);
        assert!(shell.persistence().has_pending());
        assert_eq!(shell.drag_zone(), None);
    }

    #[test]
    fn drop_keeps_changes_made_during_the_drag() {
        let mut shell = shell();
        let now = Instant::now();
        let target = DropTarget::Layout {
            rect: flexdock_core::geometry::Rect::new(0.0, 0.0, 800.0, 600.0),
        };
        shell.begin_drag(Zone::Center, DragSource::Tab("chat".into()), Point::new(50.0, 15.0));
        shell.drag_move(Some(&target), Point::new(400.0, 595.0));

        let added = shell.dispatch(
            Zone::Center,
            Action::add_tab(TabNode::new("draft", "Draft", "editor"), "main", DockLocation::Center, -1),
            now,
        );
        assert!(added.status.is_applied());

        let released = shell.release_drag(Some(&target), Point::new(400.0, 595.0), now);
        assert!(matches!(released.signal, DragSignal::Dropped { .. }), "{:?}", released.signal);
        let center = shell.model(Zone::Center);
        assert_eq!(center.main_tabset_count(), 2);
        assert!(center.find_tab("draft").is_some());
        assert!(center.find_tab("chat").is_some());
    }
}
