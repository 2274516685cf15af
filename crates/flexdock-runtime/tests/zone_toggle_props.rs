//! Property tests for zone toggles and their persistence.

use std::time::Duration;

use flexdock_runtime::{DockShell, MemoryStorage, ShellConfig, Zone};
use proptest::prelude::*;
use web_time::Instant;

fn dock_zone() -> impl Strategy<Value = Zone> {
    prop_oneof![Just(Zone::Left), Just(Zone::Right), Just(Zone::Bottom)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn double_toggle_is_identity(zones in prop::collection::vec(dock_zone(), 0..24)) {
        let mut shell = DockShell::open(ShellConfig::default(), MemoryStorage::new()).unwrap();
        let now = Instant::now();
        let before: Vec<_> = Zone::DOCKS.iter().map(|zone| shell.zone_state(*zone)).collect();

        for zone in &zones {
            shell.toggle(*zone, now);
            shell.toggle(*zone, now);
        }

        let after: Vec<_> = Zone::DOCKS.iter().map(|zone| shell.zone_state(*zone)).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn toggled_state_survives_reload(
        zones in prop::collection::vec(dock_zone(), 1..16),
        width in 120u32..900,
    ) {
        let mut shell = DockShell::open(ShellConfig::default(), MemoryStorage::new()).unwrap();
        let t0 = Instant::now();
        for zone in &zones {
            shell.toggle(*zone, t0);
        }
        shell.set_zone_width(zones[0], f64::from(width), t0);
        prop_assert!(shell.poll(t0 + Duration::from_millis(300)));

        let expected: Vec<_> = Zone::DOCKS.iter().map(|zone| shell.zone_state(*zone)).collect();
        let storage = shell.persistence().storage().clone();
        let reopened = DockShell::open(ShellConfig::default(), storage).unwrap();
        let actual: Vec<_> = Zone::DOCKS.iter().map(|zone| reopened.zone_state(*zone)).collect();
        prop_assert_eq!(expected, actual);
    }
}
