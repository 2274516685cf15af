#![no_main]

use flexdock_core::geometry::Rect;
use flexdock_layout::LayoutModel;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(model) = LayoutModel::from_json(text) else {
        return;
    };

    // Anything that loads must validate, serialize and load back with the
    // same tabs in the same places.
    model.validate().expect("loaded model failed validation");
    let json = model.to_json().expect("loaded model failed to serialize");
    let reloaded = LayoutModel::from_json(&json).expect("serialized model failed to load");
    assert_eq!(tab_ids(&model), tab_ids(&reloaded));
    assert_eq!(model.tabsets().len(), reloaded.tabsets().len());

    let solved = model.solve_layout(Rect::new(0.0, 0.0, 1024.0, 768.0));
    drop(solved);
});

fn tab_ids(model: &LayoutModel) -> Vec<String> {
    model.tabs().iter().map(|tab| tab.id.to_string()).collect()
}
