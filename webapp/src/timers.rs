use std::{cell::RefCell, collections::HashMap, time::Duration};

use gloo_timers::callback::Timeout;

use common::schedule::{Scheduler, TaskKey};

// browser scheduler
//
// one gloo Timeout per key.  a Timeout clears itself when dropped, so replacing or removing
// the map entry is all it takes to cancel.  a fired Timeout is parked in `spent` until the
// next one fires, since its closure is still on the stack when it reports back
pub struct BrowserTimers {
    tasks: RefCell<HashMap<TaskKey, Timeout>>,
    spent: RefCell<Option<Timeout>>,
    sink: fn(TaskKey),
}

impl BrowserTimers {
    pub fn new(sink: fn(TaskKey)) -> Self {
        BrowserTimers {
            tasks: RefCell::new(HashMap::new()),
            spent: RefCell::new(None),
            sink,
        }
    }

    // called from within the task's own callback, before the page sees the key.  the running
    // Timeout must outlive this call, so it replaces the previously spent one instead of being
    // dropped here
    pub fn finished(&self, key: TaskKey) {
        let fired = self.tasks.borrow_mut().remove(&key);
        if fired.is_some() {
            let previous = self.spent.replace(fired);
            drop(previous);
        }
    }
}

impl Scheduler for BrowserTimers {
    fn schedule(&self, key: TaskKey, delay: Duration) {
        let sink = self.sink;
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);

        let timeout = Timeout::new(millis, move || sink(key));
        self.tasks.borrow_mut().insert(key, timeout);
    }

    fn cancel(&self, key: TaskKey) {
        self.tasks.borrow_mut().remove(&key);
    }
}
