//! Property/fuzz-style invariants for random action streams.
//!
//! Random actions are dispatched against a seeded layout. After every step the
//! model must validate, every tab must have exactly one parent, rejected
//! actions must hand back the same `Arc`, and the JSON form must round-trip.

use std::collections::HashMap;
use std::sync::Arc;

use flexdock_layout::{
    Action, ActionDispatcher, BorderLocation, DispatchStatus, DockLocation, LayoutModel,
    LayoutNode, NodeId, Rect, RowNode, TabNode,
};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state >> 11
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.choose_index(items.len());
        items.get(index)
    }

    fn next_f64(&mut self, min: f64, max: f64) -> f64 {
        let unit = (self.next_u64() % 10_000) as f64 / 10_000.0;
        min + (max - min) * unit
    }
}

const LOCATIONS: [DockLocation; 5] = [
    DockLocation::Center,
    DockLocation::Left,
    DockLocation::Right,
    DockLocation::Top,
    DockLocation::Bottom,
];

fn seed_model() -> Arc<LayoutModel> {
    Arc::new(
        LayoutModel::from_value(json!({
            "layout": {"type": "row", "id": "root", "children": [
                {"type": "tabset", "id": "ts-a", "children": [
                    {"id": "a1", "name": "A1"},
                    {"id": "a2", "name": "A2"},
                    {"id": "pinned", "name": "Pinned", "enableDrag": false}
                ]},
                {"type": "row", "id": "column", "children": [
                    {"type": "tabset", "id": "ts-b", "children": [{"id": "b1", "name": "B1"}]},
                    {"type": "tabset", "id": "ts-c", "enableDrop": false, "children": [
                        {"id": "c1", "name": "C1"}
                    ]}
                ]}
            ]},
            "borders": [
                {"location": "left", "children": [{"id": "files", "name": "Files"}]},
                {"location": "bottom", "selected": 0, "children": [{"id": "log", "name": "Log"}]}
            ]
        }))
        .expect("seed layout"),
    )
}

fn ids(model: &LayoutModel) -> (Vec<NodeId>, Vec<NodeId>, Vec<NodeId>, Vec<NodeId>) {
    let tabs = model.tabs().into_iter().map(|tab| tab.id.clone()).collect();
    let tabsets = model.tabsets().into_iter().map(|ts| ts.id.clone()).collect();
    let mut rows = Vec::new();
    collect_rows(model.root(), &mut rows);
    for window in model.floating().windows() {
        collect_rows(&window.layout, &mut rows);
    }
    let windows = model.floating().windows().iter().map(|w| w.id.clone()).collect();
    (tabs, tabsets, rows, windows)
}

fn collect_rows(row: &RowNode, out: &mut Vec<NodeId>) {
    out.push(row.id.clone());
    for child in &row.children {
        if let LayoutNode::Row(nested) = child {
            collect_rows(nested, out);
        }
    }
}

fn random_action(rng: &mut Lcg, model: &LayoutModel, counter: &mut u32) -> Action {
    let (tabs, tabsets, rows, windows) = ids(model);
    let mut targets: Vec<NodeId> = tabsets.clone();
    targets.extend(rows.iter().cloned());
    targets.extend(BorderLocation::ALL.iter().map(|location| location.node_id()));
    let location = LOCATIONS[rng.choose_index(LOCATIONS.len())];
    let index = rng.choose_index(5) as i64 - 1;
    let pick = |rng: &mut Lcg, items: &[NodeId]| {
        rng.choose(items).cloned().unwrap_or_else(|| NodeId::from("missing"))
    };

    match rng.choose_index(12) {
        0 | 1 | 2 => Action::move_tab(pick(rng, &tabs), pick(rng, &targets), location, index),
        3 => {
            *counter += 1;
            Action::add_tab(
                TabNode::new(format!("new-{counter}").as_str(), "New", "panel"),
                pick(rng, &targets),
                location,
                index,
            )
        }
        4 => Action::delete_tab(pick(rng, &tabs)),
        5 => Action::MoveTabset {
            tabset_id: pick(rng, &tabsets),
            to_node: pick(rng, &targets),
            location,
            index,
        },
        6 => Action::select_tab(pick(rng, &tabs)),
        7 => {
            let row_id = pick(rng, &rows);
            let len = model.find_row(row_id.as_str()).map_or(1, |row| row.children.len());
            let orientation = model
                .find_row(row_id.as_str())
                .map_or(flexdock_layout::Orientation::Horizontal, |row| row.orientation);
            Action::AdjustWeights {
                row_id,
                weights: (0..len).map(|_| rng.next_f64(1.0, 200.0)).collect(),
                orientation,
            }
        }
        8 => Action::FloatTabset {
            tabset_id: pick(rng, &tabsets),
            rect: Rect::new(rng.next_f64(0.0, 400.0), rng.next_f64(0.0, 400.0), 200.0, 150.0),
        },
        9 => {
            let window_id = pick(rng, &windows);
            let candidate = pick(rng, &tabsets);
            let target = (rng.choose_index(2) == 0).then_some(candidate);
            Action::DockFloatingWindow { window_id, target }
        }
        10 => Action::DeleteTabset {
            tabset_id: pick(rng, &tabsets),
        },
        _ => Action::BringToFront {
            window_id: pick(rng, &windows),
        },
    }
}

fn assert_invariants(model: &LayoutModel) {
    model.validate().expect("model validates");

    let mut parents: HashMap<String, usize> = HashMap::new();
    for tab in model.tabs() {
        *parents.entry(tab.id.to_string()).or_default() += 1;
    }
    for (id, count) in &parents {
        assert_eq!(*count, 1, "tab {id} appears under {count} parents");
        assert!(model.parent_of(id).is_some(), "tab {id} has no parent");
    }

    for border in model.borders().iter() {
        match border.selected {
            None => assert!(border.is_collapsed()),
            Some(index) => assert!(index < border.children.len()),
        }
    }

    assert!(model.main_tabset_count() >= 1);
    let pinned = model.find_tab("pinned").expect("locked tab is never deleted by drags");
    assert!(!model.tab_enable_drag(pinned));
}

fn run_sequence(seed: u64, steps: usize) -> (Arc<LayoutModel>, Vec<Action>) {
    let mut rng = Lcg::new(seed);
    let mut dispatcher = ActionDispatcher::with_capacity(16);
    let mut model = seed_model();
    let mut applied = Vec::new();
    let mut counter = 0;

    for _ in 0..steps {
        let action = random_action(&mut rng, &model, &mut counter);
        // Deleting the locked tab is allowed; keep it around for the checks.
        let deletes_pinned = match &action {
            Action::DeleteTab { tab_id } => tab_id.as_str() == "pinned",
            Action::DeleteTabset { tabset_id } => model
                .find_tabset(tabset_id.as_str())
                .is_some_and(|ts| ts.position_of("pinned").is_some()),
            _ => false,
        };
        if deletes_pinned {
            continue;
        }
        let pinned_parent = model.parent_of("pinned").map(|parent| parent.id());
        let pinned_index = pinned_parent.as_ref().and_then(|parent| {
            model
                .find_tabset(parent.as_str())
                .and_then(|ts| ts.position_of("pinned"))
        });
        let sealed_len = model.find_tabset("ts-c").map(|ts| ts.children.len());

        let outcome = dispatcher.dispatch(&model, action.clone());
        match outcome.status {
            DispatchStatus::Applied => {
                assert!(!Arc::ptr_eq(&model, &outcome.model));
                applied.push(action.clone());
            }
            DispatchStatus::Rejected(_) | DispatchStatus::Vetoed => {
                assert!(Arc::ptr_eq(&model, &outcome.model));
            }
        }
        let next = outcome.model;
        assert_invariants(&next);

        if let Action::MoveTab { tab_id, .. } = &action
            && tab_id.as_str() == "pinned"
        {
            let parent = next.parent_of("pinned").map(|parent| parent.id());
            assert_eq!(parent, pinned_parent, "locked tab changed parent");
            let index = parent.as_ref().and_then(|parent| {
                next.find_tabset(parent.as_str())
                    .and_then(|ts| ts.position_of("pinned"))
            });
            assert_eq!(index, pinned_index, "locked tab changed position");
        }
        if let (Some(before), Some(after)) = (sealed_len, next.find_tabset("ts-c").map(|ts| ts.children.len()))
            && matches!(&action, Action::AddNode { to_node, .. } | Action::MoveTab { to_node, .. } if to_node.as_str() == "ts-c")
        {
            assert!(after <= before, "drop-disabled tab-set grew");
        }

        model = next;
    }
    (model, applied)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_action_streams_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..120,
    ) {
        let (model, _) = run_sequence(seed, steps);
        let restored = LayoutModel::from_json(&model.to_json().expect("to json")).expect("from json");
        prop_assert_eq!(&restored, model.as_ref());
    }

    #[test]
    fn applied_actions_replay_deterministically(
        seed in any::<u64>(),
        steps in 20usize..80,
    ) {
        let (final_model, actions) = run_sequence(seed, steps);
        let mut dispatcher = ActionDispatcher::new();
        let mut replay = seed_model();
        for action in actions {
            let outcome = dispatcher.dispatch(&replay, action);
            prop_assert!(outcome.status.is_applied());
            replay = outcome.model;
        }
        prop_assert_eq!(replay.as_ref(), final_model.as_ref());
    }
}

#[test]
fn seed_corpus_preserves_invariants() {
    for seed in [0_u64, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 144, u64::MAX] {
        let (model, _) = run_sequence(seed, 200);
        assert_invariants(&model);
    }
}
