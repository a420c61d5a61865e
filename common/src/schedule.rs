use std::{cell::RefCell, time::Duration};

// deferred tasks
//
// everything the page does "later" is named by a TaskKey.  keys identify the component
// instance that owns the task (the n-th faq item, the n-th validated form), and a scheduler
// holds at most one pending task per key: scheduling a key that is already pending replaces
// it.  that replacement is the whole of the debounce logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKey {
    // scroll-top button visibility check
    ScrollCheck,
    // drop the transient `opening` class from the n-th faq item
    FaqSettle(usize),
    // start fading the success banner of the n-th form
    BannerFade(usize),
    // take the faded banner of the n-th form out of the document
    BannerRemove(usize),
}

pub trait Scheduler {
    // run `key` after `delay`, cancelling any pending task with the same key
    fn schedule(&self, key: TaskKey, delay: Duration);

    fn cancel(&self, key: TaskKey);
}

#[derive(Debug)]
struct Pending {
    key: TaskKey,
    due: Duration,
    seq: u64,
}

#[derive(Debug, Default)]
struct VirtualState {
    now: Duration,
    seq: u64,
    pending: Vec<Pending>,
}

// virtual time scheduler
//
// time only moves when advance() is called, and due tasks are handed back to the caller in
// due order (ties broken by scheduling order).  a task that schedules another task while it
// runs is honored within the same advance if the new one falls inside the window.
#[derive(Debug, Default)]
pub struct VirtualTimers {
    state: RefCell<VirtualState>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn is_pending(&self, key: TaskKey) -> bool {
        self.state.borrow().pending.iter().any(|p| p.key == key)
    }

    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    // pop the earliest task due no later than `until`, moving the clock to its due time
    pub fn next_due(&self, until: Duration) -> Option<TaskKey> {
        let mut state = self.state.borrow_mut();

        let (index, _) = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.seq))?;

        let task = state.pending.remove(index);
        state.now = state.now.max(task.due);
        Some(task.key)
    }

    // move the clock forward by `by`, handing every task that comes due to `fire`
    pub fn advance(&self, by: Duration, mut fire: impl FnMut(TaskKey)) {
        let until = self.now() + by;

        while let Some(key) = self.next_due(until) {
            fire(key);
        }

        let mut state = self.state.borrow_mut();
        state.now = state.now.max(until);
    }
}

impl Scheduler for VirtualTimers {
    fn schedule(&self, key: TaskKey, delay: Duration) {
        let mut state = self.state.borrow_mut();
        state.pending.retain(|p| p.key != key);

        let due = state.now + delay;
        state.seq += 1;
        let seq = state.seq;
        state.pending.push(Pending { key, due, seq });
    }

    fn cancel(&self, key: TaskKey) {
        self.state.borrow_mut().pending.retain(|p| p.key != key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn fires_in_due_order() {
        let timers = VirtualTimers::new();
        timers.schedule(TaskKey::FaqSettle(1), ms(300));
        timers.schedule(TaskKey::ScrollCheck, ms(100));
        timers.schedule(TaskKey::FaqSettle(0), ms(300));

        let mut fired = Vec::new();
        timers.advance(ms(1000), |key| fired.push(key));

        assert_eq!(
            fired,
            vec![
                TaskKey::ScrollCheck,
                TaskKey::FaqSettle(1),
                TaskKey::FaqSettle(0)
            ]
        );
        assert_eq!(timers.now(), ms(1000));
    }

    #[test]
    fn rescheduling_debounces() {
        let timers = VirtualTimers::new();
        let mut fired = 0;

        // a burst of scroll events, 40ms apart
        for _ in 0..5 {
            timers.schedule(TaskKey::ScrollCheck, ms(100));
            timers.advance(ms(40), |_| fired += 1);
        }
        assert_eq!(fired, 0);
        assert_eq!(timers.pending_count(), 1);

        timers.advance(ms(60), |_| fired += 1);
        assert_eq!(fired, 1);
        assert!(!timers.is_pending(TaskKey::ScrollCheck));
    }

    #[test]
    fn tasks_scheduled_while_firing_run_in_the_same_window() {
        let timers = VirtualTimers::new();
        timers.schedule(TaskKey::BannerFade(0), ms(3000));

        let mut fired = Vec::new();
        timers.advance(ms(3300), |key| {
            fired.push((key, timers.now()));
            if key == TaskKey::BannerFade(0) {
                timers.schedule(TaskKey::BannerRemove(0), ms(300));
            }
        });

        assert_eq!(
            fired,
            vec![
                (TaskKey::BannerFade(0), ms(3000)),
                (TaskKey::BannerRemove(0), ms(3300))
            ]
        );
    }

    #[test]
    fn cancel_drops_the_pending_task() {
        let timers = VirtualTimers::new();
        timers.schedule(TaskKey::BannerRemove(2), ms(300));
        timers.cancel(TaskKey::BannerRemove(2));

        let mut fired = 0;
        timers.advance(ms(500), |_| fired += 1);
        assert_eq!(fired, 0);
    }
}
