//! RAII lease over a pooled unit

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::completion::CompletionSink;

/// Exclusive hold on a unit handed out by a pool.
///
/// When the lease is dropped (or [`complete`](Lease::complete) is called) the
/// unit goes back through its pool's completion hook exactly once. Use
/// [`into_parts`](Lease::into_parts) to hand the unit to asynchronous work
/// that reports completion later.
pub struct Lease<U> {
    unit: Option<U>,
    sink: Option<Arc<dyn CompletionSink<U>>>,
    acquired_at: Instant,
}

impl<U> Lease<U> {
    /// Wrap `unit`; `sink` receives it back when the lease ends.
    pub fn new(unit: U, sink: Arc<dyn CompletionSink<U>>) -> Self {
        Self {
            unit: Some(unit),
            sink: Some(sink),
            acquired_at: Instant::now(),
        }
    }

    /// How long this lease has been held.
    #[must_use]
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Signal that the unit's work is done and return it to the pool.
    pub fn complete(self) {
        drop(self);
    }

    /// Split into the unit and the sink that must receive it back.
    ///
    /// The receiver takes over the lease's obligation: call
    /// [`CompletionSink::on_complete`] exactly once with the unit.
    #[must_use]
    pub fn into_parts(mut self) -> (U, Arc<dyn CompletionSink<U>>) {
        let unit = self.unit.take().expect("lease used after into_parts");
        let sink = self.sink.take().expect("lease used after into_parts");
        (unit, sink)
    }
}

impl<U> std::ops::Deref for Lease<U> {
    type Target = U;

    fn deref(&self) -> &U {
        self.unit.as_ref().expect("lease used after into_parts")
    }
}

impl<U> std::ops::DerefMut for Lease<U> {
    fn deref_mut(&mut self) -> &mut U {
        self.unit.as_mut().expect("lease used after into_parts")
    }
}

impl<U> Drop for Lease<U> {
    fn drop(&mut self) {
        if let (Some(unit), Some(sink)) = (self.unit.take(), self.sink.take()) {
            sink.on_complete(unit);
        }
    }
}

impl<U: std::fmt::Debug> std::fmt::Debug for Lease<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("unit", &self.unit)
            .field("held_for", &self.held_for())
            .finish()
    }
}
