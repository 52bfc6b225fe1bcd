/// Trailing-edge delay gate with an owned timer
///
/// Each [`Debouncer::call`] cancels the pending invocation and restarts the
/// timer; [`Debouncer::poll`] hands back the most recent argument once the
/// input has been quiet for `delay_ms`.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline_ms: u64,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Applies from the next call; a pending deadline is kept
    pub fn set_delay(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    pub fn call(&mut self, value: T, now_ms: u64) {
        self.pending = Some(Pending {
            value,
            deadline_ms: now_ms.saturating_add(self.delay_ms),
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending call will fire, if any
    pub fn deadline_ms(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.deadline_ms)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Fire the pending call if its quiet period has elapsed
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        match &self.pending {
            Some(p) if now_ms >= p.deadline_ms => self.cancel(),
            _ => None,
        }
    }
}
