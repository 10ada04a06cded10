//! Deterministic one-shot timers driven by explicit time advancement.
//!
//! The host feeds elapsed milliseconds in; due timers come back in
//! `(due_ms, id)` order. Nothing here reads a wall clock, so the same inputs
//! always fire the same timers.

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug)]
struct Pending<T> {
    id: TimerId,
    due_ms: u64,
    payload: T,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn schedule(&mut self, delay_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_ms: self.now_ms.saturating_add(delay_ms),
            payload,
        });
        id
    }

    /// Returns `true` if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Cancels every pending timer whose payload matches.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| !pred(&p.payload));
        before - self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Moves time forward and returns the payloads of timers that came due.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<T> {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let now = self.now_ms;

        let mut due = Vec::new();
        let mut idx = 0;
        while idx < self.pending.len() {
            if self.pending[idx].due_ms <= now {
                due.push(self.pending.remove(idx));
            } else {
                idx += 1;
            }
        }
        due.sort_by(|a, b| a.due_ms.cmp(&b.due_ms).then_with(|| a.id.cmp(&b.id)));
        due.into_iter().map(|p| p.payload).collect()
    }
}
