//! Resolution lifecycle events.
//!
//! The resolver reports each pipeline stage to registered listeners. Every
//! event carries a UTC timestamp and the root coordinate it concerns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Resolution stages that produce events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    TreeBuilt,
    SolverCreated,
    PoliciesApplied,
    Solved,
    Failed,
}

impl EventType {
    pub fn name(&self) -> &'static str {
        match self {
            EventType::TreeBuilt => "tree-built",
            EventType::SolverCreated => "solver-created",
            EventType::PoliciesApplied => "policies-applied",
            EventType::Solved => "solved",
            EventType::Failed => "failed",
        }
    }

    pub fn all() -> &'static [EventType] {
        &[
            EventType::TreeBuilt,
            EventType::SolverCreated,
            EventType::PoliciesApplied,
            EventType::Solved,
            EventType::Failed,
        ]
    }
}

/// Stage specific payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventDetail {
    TreeBuilt {
        nodes: usize,
        distinct: usize,
        depth: usize,
        duration_ms: u64,
    },
    SolverCreated {
        variables: usize,
        constraints: usize,
        buckets: usize,
    },
    PoliciesApplied {
        policies: Vec<String>,
    },
    Solved {
        selected: usize,
        duration_ms: u64,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionEvent {
    pub timestamp: DateTime<Utc>,
    /// GAV of the root being resolved
    pub root: String,
    pub detail: EventDetail,
}

impl ResolutionEvent {
    pub fn new(root: impl Into<String>, detail: EventDetail) -> Self {
        Self {
            timestamp: Utc::now(),
            root: root.into(),
            detail,
        }
    }

    pub fn tree_built(root: impl Into<String>, nodes: usize, distinct: usize, depth: usize, took: Duration) -> Self {
        Self::new(
            root,
            EventDetail::TreeBuilt {
                nodes,
                distinct,
                depth,
                duration_ms: took.as_millis() as u64,
            },
        )
    }

    pub fn solved(root: impl Into<String>, selected: usize, took: Duration) -> Self {
        Self::new(
            root,
            EventDetail::Solved {
                selected,
                duration_ms: took.as_millis() as u64,
            },
        )
    }

    pub fn event_type(&self) -> EventType {
        match self.detail {
            EventDetail::TreeBuilt { .. } => EventType::TreeBuilt,
            EventDetail::SolverCreated { .. } => EventType::SolverCreated,
            EventDetail::PoliciesApplied { .. } => EventType::PoliciesApplied,
            EventDetail::Solved { .. } => EventType::Solved,
            EventDetail::Failed { .. } => EventType::Failed,
        }
    }
}

/// Trait for event listeners.
pub trait EventListener: Send + Sync {
    /// Handle an event. A non-zero return stops further listeners.
    fn handle(&self, event: &ResolutionEvent) -> anyhow::Result<i32>;

    /// Returns the priority of this listener (higher = earlier execution).
    fn priority(&self) -> i32 {
        0
    }
}

/// Writes every event to the `log` facade at info level
#[derive(Debug, Default)]
pub struct LogEventListener;

impl EventListener for LogEventListener {
    fn handle(&self, event: &ResolutionEvent) -> anyhow::Result<i32> {
        log::info!(
            "[{}] {} {}: {}",
            event.timestamp.format("%H:%M:%S%.3f"),
            event.root,
            event.event_type().name(),
            serde_json::to_string(&event.detail)?
        );
        Ok(0)
    }
}

/// Event dispatcher that manages listeners and dispatches events.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: HashMap<EventType, Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher that logs every event
    pub fn with_logging() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.add_listener_for_all(Arc::new(LogEventListener));
        dispatcher
    }

    pub fn add_listener(&mut self, event_type: EventType, listener: Arc<dyn EventListener>) {
        self.listeners.entry(event_type).or_default().push(listener);
    }

    pub fn add_listener_for_all(&mut self, listener: Arc<dyn EventListener>) {
        for event_type in EventType::all() {
            self.add_listener(*event_type, listener.clone());
        }
    }

    pub fn has_listeners(&self, event_type: EventType) -> bool {
        self.listeners.get(&event_type).map_or(false, |l| !l.is_empty())
    }

    /// Dispatch an event to its listeners, highest priority first.
    ///
    /// Returns the first non-zero code, or 0.
    pub fn dispatch(&self, event: &ResolutionEvent) -> anyhow::Result<i32> {
        let Some(listeners) = self.listeners.get(&event.event_type()) else {
            return Ok(0);
        };

        let mut sorted_listeners: Vec<_> = listeners.iter().collect();
        sorted_listeners.sort_by(|a, b| b.priority().cmp(&a.priority()));

        for listener in sorted_listeners {
            let exit_code = listener.handle(event)?;
            if exit_code != 0 {
                return Ok(exit_code);
            }
        }

        Ok(0)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<&str, usize> = self.listeners.iter().map(|(k, v)| (k.name(), v.len())).collect();
        f.debug_struct("EventDispatcher").field("listeners", &counts).finish()
    }
}
