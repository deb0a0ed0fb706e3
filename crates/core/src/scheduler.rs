use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// What a timer asks the session to do when it fires.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskKind {
    ChurnTick,
    /// Fixed countdown ran out; carries the draw cycle that armed it.
    AutoStop { cycle: u64 },
}

#[derive(Debug, Clone)]
struct Timer {
    id: TaskId,
    due: u64,
    every: Option<u64>,
    kind: TaskKind,
}

/// Virtual-time timers with cancellation tokens.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    fn push(&mut self, due: u64, every: Option<u64>, kind: TaskKind) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.timers.push(Timer {
            id,
            due,
            every,
            kind,
        });
        id
    }

    pub fn once(&mut self, delay_ms: u64, kind: TaskKind) -> TaskId {
        self.push(self.now.saturating_add(delay_ms), None, kind)
    }

    /// Periodic timer; the first run is one period from now.
    pub fn every(&mut self, period_ms: u64, kind: TaskKind) -> TaskId {
        let period = period_ms.max(1);
        self.push(self.now.saturating_add(period), Some(period), kind)
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        before != self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Moves the clock to `now` and returns every firing that fell due, in
    /// due-time order with ties broken by creation order.
    pub fn advance_to(&mut self, now: u64) -> Vec<(TaskId, TaskKind)> {
        let mut fired = Vec::new();
        loop {
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, timer)| timer.due <= now)
                .min_by_key(|(_, timer)| (timer.due, timer.id))
                .map(|(pos, _)| pos);
            let Some(pos) = next else { break };
            let timer = &mut self.timers[pos];
            fired.push((timer.id, timer.kind));
            self.now = self.now.max(timer.due);
            match timer.every {
                Some(period) => timer.due = timer.due.saturating_add(period),
                None => {
                    self.timers.remove(pos);
                }
            }
        }
        self.now = self.now.max(now);
        fired
    }
}
