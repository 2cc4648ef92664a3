// One-shot timers advanced by the frame loop
//
// Deferred work never runs on its own thread. Each tick the loop moves the
// clock forward first, lets gameplay schedule against the new time, then
// collects whatever came due, in due-time order.

/// Cancellation handle returned when a timer is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct PendingTimer<T> {
    /// Scheduling order, breaks ties between equal due times
    seq: u64,
    due: f64,
    payload: T,
}

/// Queue of one-shot timers carrying a payload
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: f64,
    next_seq: u64,
    pending: Vec<PendingTimer<T>>,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Schedule `payload` to come due `delay` seconds after the current time
    pub fn schedule(&mut self, delay: f32, payload: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(PendingTimer {
            seq,
            due: self.now + f64::from(delay.max(0.0)),
            payload,
        });
        TimerHandle(seq)
    }

    /// Drop a pending timer; false if it already fired or was cancelled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.seq != handle.0);
        self.pending.len() != before
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, dt: f32) {
        self.now += f64::from(dt.max(0.0));
    }

    /// Hand back every payload due at the current time
    ///
    /// Payloads come out ordered by due time, ties broken by scheduling order.
    pub fn take_due(&mut self) -> Vec<T> {
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|timer| timer.due <= now);
        self.pending = pending;

        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|timer| timer.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
