//! Single-threaded virtual-time dispatcher for timeouts and fixed-period intervals.
//!
//! Tasks fire in (due time, registration order). A firing interval is re-queued before
//! its task runs, so a task may cancel its own timer.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: u64,
    pub order: u64,
    pub period_ms: Option<u64>,
}

#[derive(Debug, Clone)]
struct ScheduledTask<T> {
    id: TimerId,
    due_at: u64,
    order: u64,
    period_ms: Option<u64>,
    task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now_ms: u64,
    queue: Vec<ScheduledTask<T>>,
    next_id: u64,
    next_order: u64,
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            queue: Vec::new(),
            next_id: 1,
            next_order: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn set_timeout(&mut self, delay_ms: u64, task: T) -> TimerId {
        self.push(delay_ms, None, task)
    }

    /// Zero periods are clamped to 1 ms so an interval can never starve the queue.
    pub fn set_interval(&mut self, period_ms: u64, task: T) -> TimerId {
        let period = period_ms.max(1);
        self.push(period, Some(period), task)
    }

    pub fn clear(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|task| task.id != id);
        before != self.queue.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.iter().any(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> Vec<PendingTimer> {
        let mut timers: Vec<PendingTimer> = self
            .queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
                period_ms: task.period_ms,
            })
            .collect();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn next_due_at(&self) -> Option<u64> {
        self.queue.iter().map(|task| task.due_at).min()
    }

    /// Take the earliest task due at or before `limit`, moving the clock to its due time.
    pub fn pop_due(&mut self, limit: u64) -> Option<(TimerId, T)> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, task)| task.due_at <= limit)
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(index, _)| index)?;
        let entry = self.queue.remove(index);
        if entry.due_at > self.now_ms {
            self.now_ms = entry.due_at;
        }
        if let Some(period) = entry.period_ms {
            let order = self.bump_order();
            self.queue.push(ScheduledTask {
                id: entry.id,
                due_at: entry.due_at + period,
                order,
                period_ms: Some(period),
                task: entry.task.clone(),
            });
        }
        Some((entry.id, entry.task))
    }

    /// Move the clock forward without running anything. Never moves it backwards.
    pub fn advance_clock_to(&mut self, target_ms: u64) {
        self.now_ms = self.now_ms.max(target_ms);
    }

    fn push(&mut self, delay_ms: u64, period_ms: Option<u64>, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let order = self.bump_order();
        self.queue.push(ScheduledTask {
            id,
            due_at: self.now_ms.saturating_add(delay_ms),
            order,
            period_ms,
            task,
        });
        id
    }

    fn bump_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}
