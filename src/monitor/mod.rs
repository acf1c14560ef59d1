//! Unhandled-failure monitor
//!
//! An [`UnhandledSource`] is an event source for failures that no tracked
//! case observed. Installed handlers are composed, never replaced: each
//! report reaches every handler in install order and is then logged. A
//! [`HandlerGuard`] removes only its own handler, in any drop order.

mod panic;

pub(crate) use panic::payload_message;
pub use panic::{is_tracked, track, PanicBridge};

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::warn;

/// A failure nobody attached a handler to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnhandledFailure {
    pub message: String,
    pub location: Option<String>,
}

impl UnhandledFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for UnhandledFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Callback receiving unhandled failures
pub type FailureHandler = Arc<dyn Fn(&UnhandledFailure) + Send + Sync>;

#[derive(Default)]
struct HandlerChain {
    next_id: u64,
    handlers: Vec<(u64, FailureHandler)>,
}

/// Event source for unhandled failures
#[derive(Clone, Default)]
pub struct UnhandledSource {
    chain: Arc<Mutex<HandlerChain>>,
}

impl UnhandledSource {
    /// An isolated source; with no handlers installed failures are only logged
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide source
    pub fn global() -> Self {
        static GLOBAL: OnceLock<UnhandledSource> = OnceLock::new();
        GLOBAL.get_or_init(UnhandledSource::new).clone()
    }

    /// Add `handler` to the chain; it stays installed until the guard drops
    pub fn install(&self, handler: impl Fn(&UnhandledFailure) + Send + Sync + 'static) -> HandlerGuard {
        let mut chain = self.chain.lock().unwrap_or_else(PoisonError::into_inner);
        let id = chain.next_id;
        chain.next_id += 1;
        chain.handlers.push((id, Arc::new(handler)));

        HandlerGuard {
            chain: self.chain.clone(),
            id: Some(id),
        }
    }

    /// Number of installed handlers
    pub fn handler_count(&self) -> usize {
        self.chain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .len()
    }

    /// Publish a failure to every installed handler in install order
    pub fn report(&self, failure: UnhandledFailure) {
        // Snapshot so handlers may install or report themselves.
        let handlers: Vec<FailureHandler> = self
            .chain
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(&failure);
        }
        warn!("Unhandled failure: {}", failure);
    }

    /// Report panics raised outside tracked cases into this source
    pub fn bridge_panics(&self) -> PanicBridge {
        PanicBridge::install(self.clone())
    }
}

impl fmt::Debug for UnhandledSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnhandledSource")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// Removes its handler from the chain on drop
#[must_use = "dropping the guard uninstalls the handler"]
pub struct HandlerGuard {
    chain: Arc<Mutex<HandlerChain>>,
    id: Option<u64>,
}

impl HandlerGuard {
    /// Uninstall the handler now
    pub fn restore(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(id) = self.id.take() {
            self.chain
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handlers
                .retain(|(installed, _)| *installed != id);
        }
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for HandlerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerGuard")
            .field("installed", &self.id.is_some())
            .finish()
    }
}
