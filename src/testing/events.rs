//! Runtime events emitted while scenarios run
//!
//! Listeners are registered through the config's setup-events hook before the
//! browser starts. The registry is frozen once the run begins.

use serde::Serialize;
use std::fmt;

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RuntimeEvent {
    BeforeRun {
        base_url: String,
        scenarios: usize,
    },
    BeforeScenario {
        name: String,
    },
    AfterStep {
        scenario: String,
        step: usize,
        description: String,
        passed: bool,
    },
    AfterScenario {
        name: String,
        passed: bool,
    },
    AfterRun {
        passed: usize,
        failed: usize,
    },
}

type Listener = Box<dyn Fn(&RuntimeEvent) + Send + Sync>;

/// Registered runtime event listeners
#[derive(Default)]
pub struct EventRegistry {
    listeners: Vec<Listener>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener that receives every event
    pub fn on<F>(&mut self, listener: F)
    where
        F: Fn(&RuntimeEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Deliver an event to all listeners, in registration order
    pub fn emit(&self, event: &RuntimeEvent) {
        tracing::trace!(?event, "Emitting runtime event");
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
