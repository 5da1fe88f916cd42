//! Deadline scheduler
//!
//! Single-threaded priority queue of pending transition timers. Nothing
//! here sleeps or spawns; the engine reads its clock and calls [`Scheduler::due`]
//! each tick, then dispatches the fired actions to the owning players.
//!
//! Cancellation is lazy: `cancel` drops the id from the live set and the
//! dead heap entry is skipped when it surfaces.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::types::PlayerId;

/// Shortest accepted delay; zero-length timers still fire on the next tick
const MIN_DELAY: Duration = Duration::from_millis(1);

/// Handle to one scheduled timer, unique for the life of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What a fired timer asks the owning player to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Start ramping the current track down; the successor follows
    BeginFadeOut,

    /// A fade-out ramp has settled; start the pending track
    FadeOutDone,

    /// The user-set interval elapsed; advance regardless of track position
    IntervalExpired,
}

/// A due timer handed back by [`Scheduler::due`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    pub id: TimerId,
    pub player: PlayerId,
    pub action: TimerAction,
}

#[derive(Debug)]
struct Entry {
    deadline: Instant,
    seq: u64,
    id: TimerId,
    player: PlayerId,
    action: TimerAction,
}

// Min-heap by (deadline, seq); seq breaks ties in schedule order.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

/// Pending-timer queue shared by all players
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Entry>,
    live: HashSet<TimerId>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer firing `delay` from `now`
    ///
    /// `delay` is clamped up to 1ms so an already-due deadline still goes
    /// through the queue instead of re-entering the caller.
    pub fn schedule(
        &mut self,
        now: Instant,
        delay: Duration,
        player: PlayerId,
        action: TimerAction,
    ) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = TimerId(seq);
        let delay = delay.max(MIN_DELAY);
        debug!(player, ?action, ?delay, "timer scheduled");
        self.heap.push(Entry {
            deadline: now + delay,
            seq,
            id,
            player,
            action,
        });
        self.live.insert(id);
        id
    }

    /// Deactivate a timer; firing a cancelled id is a no-op
    pub fn cancel(&mut self, id: TimerId) {
        if self.live.remove(&id) {
            debug!(?id, "timer cancelled");
        }
    }

    /// Pop every live timer whose deadline is at or before `now`
    pub fn due(&mut self, now: Instant) -> Vec<Firing> {
        let mut fired = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                if self.live.remove(&entry.id) {
                    fired.push(Firing {
                        id: entry.id,
                        player: entry.player,
                        action: entry.action,
                    });
                }
            }
        }
        fired
    }

    /// Earliest live deadline, if any
    ///
    /// Discards dead entries encountered on the way.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(entry) = self.heap.peek() {
            if self.live.contains(&entry.id) {
                return Some(entry.deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_deadline_order() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now, ms(300), 0, TimerAction::IntervalExpired);
        scheduler.schedule(now, ms(100), 1, TimerAction::BeginFadeOut);
        scheduler.schedule(now, ms(200), 2, TimerAction::FadeOutDone);

        let fired = scheduler.due(now + ms(300));
        let players: Vec<_> = fired.iter().map(|f| f.player).collect();
        assert_eq!(players, vec![1, 2, 0]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn not_due_until_deadline() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now, ms(500), 0, TimerAction::IntervalExpired);

        assert!(scheduler.due(now + ms(499)).is_empty());
        assert_eq!(scheduler.due(now + ms(500)).len(), 1);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(now, ms(100), 0, TimerAction::BeginFadeOut);
        let kept = scheduler.schedule(now, ms(100), 0, TimerAction::IntervalExpired);
        scheduler.cancel(id);

        assert_eq!(scheduler.len(), 1);
        let fired = scheduler.due(now + ms(200));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].id, kept);
    }

    #[test]
    fn zero_delay_clamped_to_minimum() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now, Duration::ZERO, 0, TimerAction::IntervalExpired);

        assert!(scheduler.due(now).is_empty());
        assert_eq!(scheduler.due(now + ms(1)).len(), 1);
    }

    #[test]
    fn next_deadline_skips_dead_entries() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let early = scheduler.schedule(now, ms(100), 0, TimerAction::BeginFadeOut);
        scheduler.schedule(now, ms(400), 1, TimerAction::IntervalExpired);
        scheduler.cancel(early);

        assert_eq!(scheduler.next_deadline(), Some(now + ms(400)));
    }

    #[test]
    fn ids_are_unique_across_reschedules() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        let a = scheduler.schedule(now, ms(10), 0, TimerAction::IntervalExpired);
        scheduler.cancel(a);
        let b = scheduler.schedule(now, ms(10), 0, TimerAction::IntervalExpired);
        assert_ne!(a, b);
    }
}
