//! Shot events
//!
//! Fire-and-forget notifications for anything outside the pipeline (score
//! display, run tracking). Listeners see the context read-only.

use std::cell::RefCell;
use std::rc::Rc;

use super::context::ShotContext;
use super::shot::ShotResult;

/// Pipeline milestones
#[derive(Debug, Clone, Copy)]
pub enum ShotEvent<'a> {
    ShotStarted(&'a ShotContext),
    AoeComputed(&'a ShotContext),
    LandingResolved(&'a ShotContext),
    ScoringComputed(&'a ShotContext),
    ShotCompleted(&'a ShotResult),
    /// The in-flight shot was abandoned; nothing was committed
    ShotCancelled { shot_index: u32 },
}

impl ShotEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ShotEvent::ShotStarted(_) => "shot_started",
            ShotEvent::AoeComputed(_) => "aoe_computed",
            ShotEvent::LandingResolved(_) => "landing_resolved",
            ShotEvent::ScoringComputed(_) => "scoring_computed",
            ShotEvent::ShotCompleted(_) => "shot_completed",
            ShotEvent::ShotCancelled { .. } => "shot_cancelled",
        }
    }
}

pub trait ShotListener {
    fn on_event(&mut self, event: &ShotEvent<'_>);
}

/// Lets a caller keep a handle on a listener it subscribed
impl<T: ShotListener> ShotListener for Rc<RefCell<T>> {
    fn on_event(&mut self, event: &ShotEvent<'_>) {
        self.borrow_mut().on_event(event);
    }
}

/// Multiple-subscriber event fan-out
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn ShotListener>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn ShotListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&mut self, event: ShotEvent<'_>) {
        log::trace!("event {}", event.name());
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
