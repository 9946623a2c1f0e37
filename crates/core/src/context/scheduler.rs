use std::sync::{Arc, Mutex, PoisonError};

/// Queue of follow-up dispatches raised by a running command.
///
/// Entries run on the same executor after the command that queued them,
/// ahead of work queued earlier.
pub struct Scheduler<S> {
    queue: Arc<Mutex<Vec<(String, S)>>>,
}

impl<S> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self {
            queue: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<S> Scheduler<S> {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `input` to be parsed and executed as `source`.
    pub fn schedule(&self, input: impl Into<String>, source: S) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((input.into(), source));
    }

    /// Number of queued entries.
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn drain(&self) -> Vec<(String, S)> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
