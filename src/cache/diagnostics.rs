//! Suspicious-parameter diagnostics.
//!
//! An encoder that falls back to the argument's type name instead of its value makes
//! every call of a method share one cache entry. When an encoded argument equals its
//! runtime type name, every registered listener is told about it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use metrics::counter;
use tracing::{debug, warn};

use super::identity::Argument;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::diagnostics";
const METRIC_SUSPICIOUS_PARAMETER: &str = "callkey_suspicious_parameter_total";
const METRIC_LISTENER_FAILURE: &str = "callkey_listener_failure_total";

/// Receives diagnostic warnings. Delivery and display are up to the implementation.
pub trait DiagnosticListener: Send + Sync {
    fn notify(&self, message: &str);
}

impl<F> DiagnosticListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl DiagnosticListener for TracingListener {
    fn notify(&self, message: &str) {
        warn!(target: "callkey::diagnostics", "{message}");
    }
}

/// Keeps every message in memory. Useful in tests and for surfacing diagnostics in
/// tooling.
#[derive(Debug, Default)]
pub struct RecordingListener {
    messages: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        mutex_lock(&self.messages, SOURCE, "messages").clone()
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.messages, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        mutex_lock(&self.messages, SOURCE, "clear").clear();
    }
}

impl DiagnosticListener for RecordingListener {
    fn notify(&self, message: &str) {
        mutex_lock(&self.messages, SOURCE, "notify").push(message.to_string());
    }
}

/// Warning raised when an encoded argument equals its own type name.
pub fn suspicious_parameter_message(type_name: &str) -> String {
    format!(
        "Cache key of type {type_name} equals its own type name. \
         Possible bug in your ParameterEncoder implementation."
    )
}

/// Fans diagnostics out to a fixed set of listeners.
///
/// The listener set is fixed at construction. A panicking listener is logged and
/// skipped; it never reaches the caller.
#[derive(Clone)]
pub struct DiagnosticNotifier {
    listeners: Arc<[Arc<dyn DiagnosticListener>]>,
}

impl DiagnosticNotifier {
    pub fn new(listeners: impl IntoIterator<Item = Arc<dyn DiagnosticListener>>) -> Self {
        Self {
            listeners: listeners.into_iter().collect(),
        }
    }

    /// A notifier with `listeners` registered after the current ones.
    pub fn with_listeners(
        &self,
        listeners: impl IntoIterator<Item = Arc<dyn DiagnosticListener>>,
    ) -> Self {
        Self::new(self.listeners.iter().cloned().chain(listeners))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Check one encoded argument and warn when it equals the argument's type name.
    ///
    /// Null arguments are never suspicious. Returns whether a warning was raised.
    pub fn check_argument(&self, argument: Option<Argument<'_>>, encoded: &str) -> bool {
        let Some(argument) = argument else {
            return false;
        };
        let type_name = argument.type_name();
        if encoded != type_name {
            return false;
        }

        counter!(METRIC_SUSPICIOUS_PARAMETER).increment(1);
        self.warn(&suspicious_parameter_message(type_name));
        true
    }

    /// Deliver `message` to every listener.
    pub fn warn(&self, message: &str) {
        if self.listeners.is_empty() {
            debug!(diagnostic = message, "Diagnostic dropped: no listeners registered");
            return;
        }

        for (index, listener) in self.listeners.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| listener.notify(message))).is_err() {
                counter!(METRIC_LISTENER_FAILURE).increment(1);
                warn!(
                    listener = index,
                    result = "panic_swallowed",
                    "Diagnostic listener panicked"
                );
            }
        }
    }
}

impl Default for DiagnosticNotifier {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl std::fmt::Debug for DiagnosticNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
