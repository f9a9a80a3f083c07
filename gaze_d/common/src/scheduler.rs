//! Deferred actions keyed on caller-supplied time.
//!
//! The scheduler never reads a clock: whoever drives it passes `now_s`, so the same
//! code runs against wall time in the daemon and against virtual time in tests.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(u64);

#[derive(Debug, Clone)]
struct Scheduled<A> {
    id: ActionId,
    due_s: f64,
    action: A,
}

#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    next_id: u64,
    pending: Vec<Scheduled<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, due_s: f64, action: A) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled { id, due_s, action });
        id
    }

    pub fn cancel(&mut self, id: ActionId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_due(&self) -> Option<f64> {
        self.pending.iter().map(|s| s.due_s).reduce(f64::min)
    }

    /// Removes and returns every action due at or before `now_s` with its due time,
    /// earliest first. Actions with the same due time come out in scheduling order.
    pub fn take_due(&mut self, now_s: f64) -> Vec<(f64, A)> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due_s <= now_s);
        self.pending = rest;
        due.sort_by(|a, b| a.due_s.total_cmp(&b.due_s).then(a.id.cmp(&b.id)));
        due.into_iter().map(|s| (s.due_s, s.action)).collect()
    }
}
