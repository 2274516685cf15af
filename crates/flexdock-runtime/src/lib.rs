#![forbid(unsafe_code)]

//! Runtime: persistence, configuration and the dock shell.
//!
//! # Role in flexdock
//! `flexdock-runtime` sits between a render bridge and the layout engine. It
//! keeps one [`LayoutModel`](flexdock_layout::LayoutModel) per [`Zone`],
//! toggles dock visibility from keyboard shortcuts, and persists everything
//! through a [`StorageBackend`] as a single versioned [`PersistedRecord`].
//!
//! # Key Components
//! - [`DockShell`]: the entry point for a host application.
//! - [`ZonePersistence`]: debounced writes, legacy migration and
//!   corrupt-data recovery.
//! - [`ShellConfig`]: TOML/JSON configuration with validated defaults.
//!
//! ```
//! use flexdock_runtime::{DockShell, MemoryStorage, ShellConfig, Zone};
//! use web_time::Instant;
//!
//! let mut shell = DockShell::open(ShellConfig::default(), MemoryStorage::new()).unwrap();
//! let transition = shell.toggle(Zone::Left, Instant::now()).unwrap();
//! assert!(!transition.visible);
//! assert!(shell.flush().unwrap());
//! ```

pub mod config;
pub mod error;
pub mod migration;
pub mod persistence;
pub mod record;
pub mod shell;
pub mod storage;
pub mod zones;

pub use config::{DragConfig, MotionConfig, PersistenceConfig, ShellConfig, ZoneDefaults, ZonesConfig};
pub use error::{ConfigError, PersistenceError, ShellError, StorageError, StorageResult};
pub use migration::{KeySpace, LAYOUT_KEY, MigrationReport, migrate_legacy};
pub use persistence::{DEFAULT_DEBOUNCE, LoadedLayout, ZonePersistence, ZoneSource};
pub use record::{DockedGroup, PanelInfo, PersistedRecord, RECORD_VERSION};
pub use shell::{DockShell, KeyOutcome, LoadSummary};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use zones::{MotionPolicy, UnknownZone, Zone, ZoneState, ZoneTransition};
