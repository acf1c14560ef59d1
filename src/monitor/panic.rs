//! Panic bridge
//!
//! Case futures run inside a task-local scope. A chained panic hook
//! reports panics raised outside that scope as unhandled failures.

use std::any::Any;
use std::future::Future;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

use super::{UnhandledFailure, UnhandledSource};

tokio::task_local! {
    static TRACKED: ();
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Run `future` as part of a tracked case
pub fn track<F: Future>(future: F) -> impl Future<Output = F::Output> {
    TRACKED.scope((), future)
}

/// Whether the current task is running a tracked case
pub fn is_tracked() -> bool {
    TRACKED.try_with(|_| ()).is_ok()
}

/// Chained panic hook; the previous hook is restored on drop
#[must_use = "dropping the bridge restores the previous panic hook"]
pub struct PanicBridge {
    previous: Option<Arc<PanicHook>>,
}

impl PanicBridge {
    pub(super) fn install(source: UnhandledSource) -> Self {
        let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
        let chained = previous.clone();

        panic::set_hook(Box::new(move |info| {
            if !is_tracked() {
                let mut failure = UnhandledFailure::new(payload_message(info.payload()));
                if let Some(location) = info.location() {
                    failure = failure.with_location(location.to_string());
                }
                source.report(failure);
            }
            chained(info);
        }));

        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for PanicBridge {
    fn drop(&mut self) {
        // Hooks cannot be swapped while unwinding.
        if std::thread::panicking() {
            return;
        }
        if let Some(previous) = self.previous.take() {
            let _ = panic::take_hook();
            panic::set_hook(Box::new(move |info| previous(info)));
        }
    }
}

impl std::fmt::Debug for PanicBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicBridge")
            .field("installed", &self.previous.is_some())
            .finish()
    }
}

/// Best-effort text of a panic payload
pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
