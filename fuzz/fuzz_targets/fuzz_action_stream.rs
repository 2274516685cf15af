#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use flexdock_layout::{Action, ActionDispatcher, DockLocation, LayoutModel, TabNode};
use libfuzzer_sys::fuzz_target;

const SEED: &str = r#"{
    "layout": {"type": "row", "id": "root", "children": [
        {"type": "tabset", "id": "ts-a", "children": [
            {"id": "a1", "name": "A1"},
            {"id": "a2", "name": "A2"}
        ]},
        {"type": "row", "id": "column", "children": [
            {"type": "tabset", "id": "ts-b", "children": [{"id": "b1", "name": "B1"}]},
            {"type": "tabset", "id": "ts-c", "children": [{"id": "c1", "name": "C1"}]}
        ]}
    ]},
    "borders": [
        {"location": "left", "children": [{"id": "files", "name": "Files"}]}
    ]
}"#;

const LOCATIONS: [DockLocation; 5] = [
    DockLocation::Center,
    DockLocation::Left,
    DockLocation::Right,
    DockLocation::Top,
    DockLocation::Bottom,
];

#[derive(Debug, Arbitrary)]
enum Op {
    Move { tab: u8, target: u8, location: u8, index: i8 },
    Add { target: u8, location: u8 },
    Delete { tab: u8 },
    Select { tab: u8 },
    DeleteTabset { target: u8 },
    Maximize { target: u8 },
}

fn pick<T: Clone>(items: &[T], raw: u8) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[usize::from(raw) % items.len()].clone())
    }
}

fn to_action(model: &LayoutModel, op: &Op, serial: usize) -> Option<Action> {
    let tabs: Vec<String> = model.tabs().iter().map(|tab| tab.id.to_string()).collect();
    let tabsets: Vec<String> = model.tabsets().iter().map(|ts| ts.id.to_string()).collect();
    let location = |raw: u8| LOCATIONS[usize::from(raw) % LOCATIONS.len()];

    Some(match *op {
        Op::Move { tab, target, location: loc, index } => Action::move_tab(
            pick(&tabs, tab)?,
            pick(&tabsets, target)?,
            location(loc),
            i64::from(index),
        ),
        Op::Add { target, location: loc } => Action::add_tab(
            TabNode::new(format!("fz-{serial}"), "Fuzz", "fuzz"),
            pick(&tabsets, target)?,
            location(loc),
            -1,
        ),
        Op::Delete { tab } => Action::delete_tab(pick(&tabs, tab)?),
        Op::Select { tab } => Action::select_tab(pick(&tabs, tab)?),
        Op::DeleteTabset { target } => Action::DeleteTabset {
            tabset_id: pick(&tabsets, target)?.into(),
        },
        Op::Maximize { target } => Action::MaximizeToggle {
            tabset_id: pick(&tabsets, target)?.into(),
        },
    })
}

fuzz_target!(|ops: Vec<Op>| {
    let mut dispatcher = ActionDispatcher::new();
    let mut model = Arc::new(LayoutModel::from_json(SEED).expect("seed layout"));

    for (serial, op) in ops.iter().take(256).enumerate() {
        let Some(action) = to_action(&model, op, serial) else {
            continue;
        };
        let outcome = dispatcher.dispatch(&model, action);
        if !outcome.status.is_applied() {
            assert!(Arc::ptr_eq(&outcome.model, &model), "rejected action replaced the model");
            continue;
        }
        outcome.model.validate().expect("applied action broke the model");
        model = outcome.model;
    }
});
