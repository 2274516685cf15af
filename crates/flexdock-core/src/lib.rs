#![forbid(unsafe_code)]

//! Core: geometry, keyboard events, dock shortcuts, and logging.
//!
//! # Role in flexdock
//! `flexdock-core` is the input layer. It owns the pixel-space primitives
//! used for hit testing and layout solving, the normalized keyboard events a
//! render bridge reports, and the mapping from those events to dock toggles.
//!
//! # How it fits in the system
//! `flexdock-layout` builds the layout tree and drop-zone resolution on top of
//! [`geometry`]; `flexdock-runtime` consumes [`keybinding::DockShortcut`]s to
//! flip zone visibility.

pub mod event;
pub mod geometry;
pub mod keybinding;
pub mod logging;

pub use geometry::{Point, Rect};

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
