//! Drag-and-drop lifecycle.
//!
//! ```text
//! Idle -> Started -> Dragging(hover) -> Dropped
//!            \             \---------> Cancelled
//!             \----------------------> Cancelled
//! ```
//!
//! A session captures the model at pointer-down as its baseline. Hover
//! feedback is resolved against that baseline and never mutates it. The only
//! mutation is the single action dispatched on release, against the model
//! current at that moment. Cancelling hands the baseline `Arc` back untouched.

use std::fmt;
use std::sync::Arc;

use flexdock_core::event::{KeyCode, KeyEvent, KeyEventKind};
use flexdock_core::geometry::Point;
use tracing::debug;

use crate::action::Action;
use crate::dispatch::{ActionDispatcher, DispatchStatus};
use crate::drop::{DragSource, DropOutcome, DropTarget, DropZoneResolver};
use crate::model::LayoutModel;

/// Pointer travel in pixels before a press becomes a drag.
pub const DEFAULT_DRAG_THRESHOLD_PX: f64 = 4.0;

/// Coarse lifecycle phase, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Started,
    Dragging,
    Dropped,
    Cancelled,
}

impl DragPhase {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Started | Self::Dragging)
    }
}

#[derive(Debug, Clone)]
enum DragState {
    Idle,
    Started {
        source: DragSource,
        origin: Point,
        baseline: Arc<LayoutModel>,
    },
    Dragging {
        source: DragSource,
        hover: Option<DropOutcome>,
        baseline: Arc<LayoutModel>,
    },
    Dropped,
    Cancelled,
}

impl DragState {
    const fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Started { .. } => DragPhase::Started,
            Self::Dragging { .. } => DragPhase::Dragging,
            Self::Dropped => DragPhase::Dropped,
            Self::Cancelled => DragPhase::Cancelled,
        }
    }
}

/// Why a session ended without a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Escape,
    /// Released where no valid drop was resolved.
    OutsideTarget,
    /// Released before the pointer crossed the drag threshold.
    NotDragged,
    /// The dispatcher rejected or vetoed the drop.
    DropRefused,
    Programmatic,
}

/// Events that are safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragNoopReason {
    NoActiveDrag,
    DragAlreadyInProgress,
    SourceLocked,
    ThresholdNotReached,
    HoverUnchanged,
    UnhandledKey,
}

/// What a transition did.
#[derive(Debug, Clone)]
pub enum DragSignal {
    Started,
    DragBegan { hover: Option<DropOutcome> },
    HoverChanged { hover: Option<DropOutcome> },
    Dropped {
        action: Action,
        model: Arc<LayoutModel>,
    },
    Cancelled {
        reason: CancelReason,
        /// The pre-drag model.
        model: Arc<LayoutModel>,
    },
    Noop { reason: DragNoopReason },
}

/// One lifecycle step.
#[derive(Debug, Clone)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragPhase,
    pub to: DragPhase,
    pub signal: DragSignal,
}

/// Session construction errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSessionError {
    InvalidThreshold { threshold: f64 },
}

impl fmt::Display for DragSessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreshold { threshold } => {
                write!(f, "drag threshold must be finite and >= 0 (got {threshold})")
            }
        }
    }
}

impl std::error::Error for DragSessionError {}

/// The single drag session of a shell.
#[derive(Debug, Clone)]
pub struct DragSession {
    state: DragState,
    resolver: DropZoneResolver,
    threshold: f64,
    transition_counter: u64,
}

impl Default for DragSession {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
            resolver: DropZoneResolver::default(),
            threshold: DEFAULT_DRAG_THRESHOLD_PX,
            transition_counter: 0,
        }
    }
}

impl DragSession {
    pub fn new(resolver: DropZoneResolver, threshold: f64) -> Result<Self, DragSessionError> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(DragSessionError::InvalidThreshold { threshold });
        }
        Ok(Self {
            resolver,
            threshold,
            ..Self::default()
        })
    }

    #[must_use]
    pub const fn phase(&self) -> DragPhase {
        self.state.phase()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.phase().is_active()
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current drop indicator, while dragging.
    #[must_use]
    pub fn hover(&self) -> Option<&DropOutcome> {
        match &self.state {
            DragState::Dragging { hover, .. } => hover.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn source(&self) -> Option<&DragSource> {
        match &self.state {
            DragState::Started { source, .. } | DragState::Dragging { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Model captured at pointer-down.
    #[must_use]
    pub fn baseline(&self) -> Option<&Arc<LayoutModel>> {
        match &self.state {
            DragState::Started { baseline, .. } | DragState::Dragging { baseline, .. } => Some(baseline),
            _ => None,
        }
    }

    /// Pointer-down on a draggable element.
    ///
    /// Refused while another drag is active, and for locked sources.
    pub fn begin(&mut self, model: &Arc<LayoutModel>, source: DragSource, origin: Point) -> DragTransition {
        if self.is_active() {
            return self.noop(DragNoopReason::DragAlreadyInProgress);
        }
        let locked = match &source {
            DragSource::Tab(id) => !model
                .find_tab(id.as_str())
                .is_some_and(|tab| model.tab_enable_drag(tab)),
            DragSource::Tabset(id) => !model
                .find_tabset(id.as_str())
                .is_some_and(|tabset| model.tabset_enable_drag(tabset)),
            DragSource::External(drag) => !drag.is_recognized(),
        };
        if locked {
            return self.noop(DragNoopReason::SourceLocked);
        }
        let baseline = Arc::clone(model);
        self.transition(
            DragState::Started {
                source,
                origin,
                baseline,
            },
            DragSignal::Started,
        )
    }

    /// Pointer moved; `target` is the element under the pointer, if any.
    pub fn pointer_move(&mut self, target: Option<&DropTarget>, pointer: Point) -> DragTransition {
        match &self.state {
            DragState::Started {
                source,
                origin,
                baseline,
            } => {
                if origin.distance(pointer) < self.threshold {
                    return self.noop(DragNoopReason::ThresholdNotReached);
                }
                let hover = self.resolve(baseline, source, target, pointer);
                let (source, baseline) = (source.clone(), Arc::clone(baseline));
                self.transition(
                    DragState::Dragging {
                        source,
                        hover: hover.clone(),
                        baseline,
                    },
                    DragSignal::DragBegan { hover },
                )
            }
            DragState::Dragging {
                source,
                hover,
                baseline,
            } => {
                let next = self.resolve(baseline, source, target, pointer);
                if next == *hover {
                    return self.noop(DragNoopReason::HoverUnchanged);
                }
                let (source, baseline) = (source.clone(), Arc::clone(baseline));
                self.transition(
                    DragState::Dragging {
                        source,
                        hover: next.clone(),
                        baseline,
                    },
                    DragSignal::HoverChanged { hover: next },
                )
            }
            _ => self.noop(DragNoopReason::NoActiveDrag),
        }
    }

    /// Escape cancels an active drag.
    pub fn key(&mut self, event: &KeyEvent) -> DragTransition {
        let Some(baseline) = self.baseline().cloned() else {
            return self.noop(DragNoopReason::NoActiveDrag);
        };
        if event.code == KeyCode::Escape && event.kind == KeyEventKind::Press {
            return self.cancel_with(CancelReason::Escape, baseline);
        }
        self.noop(DragNoopReason::UnhandledKey)
    }

    /// Pointer released. The drop is resolved and dispatched against
    /// `current`, the model as it stands now, so changes made while the
    /// pointer was down survive. Everything else cancels and restores the
    /// baseline.
    pub fn release(
        &mut self,
        dispatcher: &mut ActionDispatcher,
        current: &Arc<LayoutModel>,
        target: Option<&DropTarget>,
        pointer: Point,
    ) -> DragTransition {
        let (source, baseline) = match &self.state {
            DragState::Started { baseline, .. } => {
                let baseline = Arc::clone(baseline);
                return self.cancel_with(CancelReason::NotDragged, baseline);
            }
            DragState::Dragging { source, baseline, .. } => (source.clone(), Arc::clone(baseline)),
            _ => return self.noop(DragNoopReason::NoActiveDrag),
        };
        let Some(outcome) = self.resolve(current, &source, target, pointer) else {
            return self.cancel_with(CancelReason::OutsideTarget, baseline);
        };

        let action = DropZoneResolver::to_action(&source, &outcome);
        let dispatched = dispatcher.dispatch(current, action.clone());
        match dispatched.status {
            DispatchStatus::Applied => {
                self.transition(
                    DragState::Dropped,
                    DragSignal::Dropped {
                        action,
                        model: dispatched.model,
                    },
                )
            }
            DispatchStatus::Vetoed | DispatchStatus::Rejected(_) => {
                self.cancel_with(CancelReason::DropRefused, baseline)
            }
        }
    }

    /// Cancel programmatically; a no-op when nothing is active.
    pub fn force_cancel(&mut self) -> Option<DragTransition> {
        let baseline = self.baseline().cloned()?;
        Some(self.cancel_with(CancelReason::Programmatic, baseline))
    }

    fn resolve(
        &self,
        model: &LayoutModel,
        source: &DragSource,
        target: Option<&DropTarget>,
        pointer: Point,
    ) -> Option<DropOutcome> {
        self.resolver.resolve(model, source, target?, pointer)
    }

    fn cancel_with(&mut self, reason: CancelReason, model: Arc<LayoutModel>) -> DragTransition {
        self.transition(DragState::Cancelled, DragSignal::Cancelled { reason, model })
    }

    fn noop(&mut self, reason: DragNoopReason) -> DragTransition {
        let phase = self.state.phase();
        self.transition_counter = self.transition_counter.saturating_add(1);
        debug!(target: "flexdock.drag", ?reason, ?phase, "drag event ignored");
        DragTransition {
            transition_id: self.transition_counter,
            from: phase,
            to: phase,
            signal: DragSignal::Noop { reason },
        }
    }

    fn transition(&mut self, next: DragState, signal: DragSignal) -> DragTransition {
        let from = self.state.phase();
        self.state = next;
        let to = self.state.phase();
        self.transition_counter = self.transition_counter.saturating_add(1);
        debug!(target: "flexdock.drag", ?from, ?to, "drag transition");
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to,
            signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexdock_core::geometry::Rect;
    use serde_json::json;

    fn model() -> Arc<LayoutModel> {
        Arc::new(
            LayoutModel::from_value(json!({
                "layout": {"type": "row", "children": [
                    {"type": "tabset", "id": "ts1", "children": [
                        {"id": "alpha", "name": "Alpha"},
                        {"id": "beta", "name": "Beta"},
                        {"id": "pinned", "name": "Pinned", "enableDrag": false}
                    ]},
                    {"type": "tabset", "id": "ts2", "children": [
                        {"id": "delta", "name": "Delta"}
                    ]}
                ]}
            }))
            .expect("model"),
        )
    }

    fn ts2() -> DropTarget {
        DropTarget::TabSet {
            id: "ts2".into(),
            rect: Rect::new(400.0, 0.0, 400.0, 400.0),
            tab_strip: None,
            tab_buttons: Vec::new(),
        }
    }

    fn started(session: &mut DragSession, base: &Arc<LayoutModel>) {
        let transition = session.begin(base, DragSource::Tab("alpha".into()), Point::new(10.0, 10.0));
        assert_eq!(transition.to, DragPhase::Started);
    }

    #[test]
    fn full_drag_dispatches_once_on_release() {
        let base = model();
        let mut session = DragSession::default();
        let mut dispatcher = ActionDispatcher::new();
        started(&mut session, &base);

        let moved = session.pointer_move(Some(&ts2()), Point::new(600.0, 200.0));
        assert_eq!(moved.to, DragPhase::Dragging);
        assert!(session.hover().is_some());
        assert_eq!(dispatcher.sequence(), 0);

        let released = session.release(&mut dispatcher, &base, Some(&ts2()), Point::new(600.0, 200.0));
        assert_eq!(released.to, DragPhase::Dropped);
        let DragSignal::Dropped { model: next, .. } = released.signal else {
            panic!("expected a drop");
        };
        assert_eq!(next.find_tabset("ts2").map(|ts| ts.children.len()), Some(2));
        assert_eq!(dispatcher.sequence(), 1);
        assert!(!session.is_active());
    }

    #[test]
    fn small_moves_stay_in_started() {
        let base = model();
        let mut session = DragSession::default();
        started(&mut session, &base);
        let transition = session.pointer_move(Some(&ts2()), Point::new(11.0, 11.0));
        assert!(matches!(
            transition.signal,
            DragSignal::Noop {
                reason: DragNoopReason::ThresholdNotReached
            }
        ));
        assert_eq!(session.phase(), DragPhase::Started);
    }

    #[test]
    fn escape_restores_baseline() {
        let base = model();
        let mut session = DragSession::default();
        started(&mut session, &base);
        session.pointer_move(Some(&ts2()), Point::new(600.0, 200.0));
        let transition = session.key(&KeyEvent::new(KeyCode::Escape));
        let DragSignal::Cancelled { reason, model } = transition.signal else {
            panic!("expected cancel");
        };
        assert_eq!(reason, CancelReason::Escape);
        assert!(Arc::ptr_eq(&model, &base));
        assert_eq!(session.phase(), DragPhase::Cancelled);
    }

    #[test]
    fn release_outside_target_cancels() {
        let base = model();
        let mut session = DragSession::default();
        let mut dispatcher = ActionDispatcher::new();
        started(&mut session, &base);
        session.pointer_move(None, Point::new(900.0, 900.0));
        let transition = session.release(&mut dispatcher, &base, None, Point::new(900.0, 900.0));
        assert!(matches!(
            transition.signal,
            DragSignal::Cancelled {
                reason: CancelReason::OutsideTarget,
                ..
            }
        ));
        assert_eq!(dispatcher.sequence(), 0);
    }

    #[test]
    fn second_drag_is_refused_while_active() {
        let base = model();
        let mut session = DragSession::default();
        started(&mut session, &base);
        let transition = session.begin(&base, DragSource::Tab("beta".into()), Point::new(0.0, 0.0));
        assert!(matches!(
            transition.signal,
            DragSignal::Noop {
                reason: DragNoopReason::DragAlreadyInProgress
            }
        ));
        assert_eq!(
            session.source(),
            Some(&DragSource::Tab("alpha".into()))
        );
    }

    #[test]
    fn locked_tab_never_starts() {
        let base = model();
        let mut session = DragSession::default();
        let transition = session.begin(&base, DragSource::Tab("pinned".into()), Point::new(0.0, 0.0));
        assert!(matches!(
            transition.signal,
            DragSignal::Noop {
                reason: DragNoopReason::SourceLocked
            }
        ));
        assert!(!session.is_active());
    }

    #[test]
    fn refused_drop_restores_baseline() {
        let base = model();
        let mut session = DragSession::default();
        let mut dispatcher = ActionDispatcher::new();
        dispatcher.set_interceptor(|_action: Action| -> Option<Action> { None });
        started(&mut session, &base);
        session.pointer_move(Some(&ts2()), Point::new(600.0, 200.0));
        let transition = session.release(&mut dispatcher, &base, Some(&ts2()), Point::new(600.0, 200.0));
        let DragSignal::Cancelled { reason, model } = transition.signal else {
            panic!("expected cancel");
        };
        assert_eq!(reason, CancelReason::DropRefused);
        assert!(Arc::ptr_eq(&model, &base));
    }

    #[test]
    fn drop_applies_to_the_model_current_at_release() {
        let base = model();
        let mut session = DragSession::default();
        let mut dispatcher = ActionDispatcher::new();
        started(&mut session, &base);
        session.pointer_move(Some(&ts2()), Point::new(600.0, 200.0));

        let current = base.apply(Action::select_tab("pinned")).map(Arc::new).expect("select");
        let released = session.release(&mut dispatcher, &current, Some(&ts2()), Point::new(600.0, 200.0));
        let DragSignal::Dropped { model: next, .. } = released.signal else {
            panic!("expected a drop");
        };
        let ts1 = next.find_tabset("ts1").expect("ts1");
        assert_eq!(ts1.selected_tab().map(|tab| tab.id.as_str()), Some("pinned"));
        assert_eq!(next.find_tabset("ts2").map(|ts| ts.children.len()), Some(2));
    }

    #[test]
    fn cancel_returns_the_captured_baseline() {
        let base = model();
        let mut session = DragSession::default();
        let mut dispatcher = ActionDispatcher::new();
        started(&mut session, &base);
        assert!(session.baseline().is_some_and(|held| Arc::ptr_eq(held, &base)));

        let current = base.apply(Action::select_tab("beta")).map(Arc::new).expect("select");
        let not_dragged = session.release(&mut dispatcher, &current, Some(&ts2()), Point::new(10.0, 10.0));
        let DragSignal::Cancelled { reason, model } = not_dragged.signal else {
            panic!("expected cancel");
        };
        assert_eq!(reason, CancelReason::NotDragged);
        assert!(Arc::ptr_eq(&model, &base));
        assert!(session.baseline().is_none());

        started(&mut session, &base);
        let forced = session.force_cancel().expect("active drag cancels");
        assert!(matches!(
            forced.signal,
            DragSignal::Cancelled { reason: CancelReason::Programmatic, ref model } if Arc::ptr_eq(model, &base)
        ));
        assert!(session.force_cancel().is_none());
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        assert!(DragSession::new(DropZoneResolver::default(), f64::NAN).is_err());
        assert!(DragSession::new(DropZoneResolver::default(), 0.0).is_ok());
        assert!(DragSession::default().force_cancel().is_none());
    }
}
