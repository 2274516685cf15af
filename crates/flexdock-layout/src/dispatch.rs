//! Single mutation entry point for a [`LayoutModel`].
//!
//! The dispatcher owns the optional interceptor and a bounded journal of
//! every attempt. Models are shared as `Arc`s; a successful dispatch returns a
//! fresh `Arc`, anything else hands back the one that came in.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, ActionKind, ActionRejection};
use crate::model::LayoutModel;

/// Default number of journal rows kept.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 256;

/// Hook called once per dispatched action before it is applied.
///
/// Returning `None` vetoes the action; returning `Some` (possibly a different
/// action) lets it proceed.
pub trait ActionInterceptor {
    fn intercept(&mut self, action: Action) -> Option<Action>;
}

impl<F> ActionInterceptor for F
where
    F: FnMut(Action) -> Option<Action>,
{
    fn intercept(&mut self, action: Action) -> Option<Action> {
        self(action)
    }
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchStatus {
    Applied,
    Vetoed,
    Rejected(ActionRejection),
}

impl DispatchStatus {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Vetoed => write!(f, "vetoed by interceptor"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

/// Model after a dispatch plus what happened.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub model: Arc<LayoutModel>,
    pub status: DispatchStatus,
}

/// Journal status, flattened to a string reason for logging and replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DispatchRecordStatus {
    Applied,
    Vetoed,
    Rejected { reason: String },
}

/// One journal row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    pub sequence: u64,
    pub kind: ActionKind,
    /// The action as applied, after interception.
    pub action: Action,
    #[serde(flatten)]
    pub status: DispatchRecordStatus,
}

/// Validating, intercepting action dispatcher.
pub struct ActionDispatcher {
    interceptor: Option<Box<dyn ActionInterceptor>>,
    journal: VecDeque<DispatchRecord>,
    capacity: usize,
    sequence: u64,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("intercepting", &self.interceptor.is_some())
            .field("journal_len", &self.journal.len())
            .field("capacity", &self.capacity)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }

    /// Dispatcher keeping at most `capacity` journal rows (zero disables the
    /// journal).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            interceptor: None,
            journal: VecDeque::with_capacity(capacity.min(DEFAULT_JOURNAL_CAPACITY)),
            capacity,
            sequence: 0,
        }
    }

    pub fn set_interceptor(&mut self, interceptor: impl ActionInterceptor + 'static) {
        self.interceptor = Some(Box::new(interceptor));
    }

    pub fn clear_interceptor(&mut self) {
        self.interceptor = None;
    }

    /// Journal rows, oldest first.
    pub fn journal(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.journal.iter()
    }

    #[must_use]
    pub fn last_record(&self) -> Option<&DispatchRecord> {
        self.journal.back()
    }

    /// Sequence number of the most recent dispatch.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Intercept, apply and journal one action.
    pub fn dispatch(&mut self, model: &Arc<LayoutModel>, action: Action) -> DispatchOutcome {
        self.sequence = self.sequence.saturating_add(1);
        let original_kind = action.kind();

        let action = match self.interceptor.as_mut() {
            Some(interceptor) => match interceptor.intercept(action.clone()) {
                Some(replacement) => replacement,
                None => {
                    debug!(
                        target: "flexdock.dispatch",
                        sequence = self.sequence,
                        kind = %original_kind,
                        "action vetoed"
                    );
                    self.record(action, DispatchRecordStatus::Vetoed);
                    return DispatchOutcome {
                        model: Arc::clone(model),
                        status: DispatchStatus::Vetoed,
                    };
                }
            },
            None => action,
        };

        let kind = action.kind();
        match model.apply(action.clone()) {
            Ok(next) => {
                debug!(
                    target: "flexdock.dispatch",
                    sequence = self.sequence,
                    kind = %kind,
                    "action applied"
                );
                self.record(action, DispatchRecordStatus::Applied);
                DispatchOutcome {
                    model: Arc::new(next),
                    status: DispatchStatus::Applied,
                }
            }
            Err(reason) => {
                debug!(
                    target: "flexdock.dispatch",
                    sequence = self.sequence,
                    kind = %kind,
                    %reason,
                    "action rejected"
                );
                self.record(
                    action,
                    DispatchRecordStatus::Rejected {
                        reason: reason.to_string(),
                    },
                );
                DispatchOutcome {
                    model: Arc::clone(model),
                    status: DispatchStatus::Rejected(reason),
                }
            }
        }
    }

    fn record(&mut self, action: Action, status: DispatchRecordStatus) {
        if self.capacity == 0 {
            return;
        }
        while self.journal.len() >= self.capacity {
            self.journal.pop_front();
        }
        self.journal.push_back(DispatchRecord {
            sequence: self.sequence,
            kind: action.kind(),
            action,
            status,
        });
    }
}
