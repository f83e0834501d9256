//! One periodic tick task per running timer.
//!
//! Tasks only send [`Tick`] messages; all state changes happen on the
//! receiving side. Every schedule gets a new generation so ticks still
//! queued from a cancelled task can be told apart and dropped.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::trace;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub timer_id: String,
    pub generation: u64,
}

struct ScheduledTicks {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct TickScheduler {
    period: Duration,
    sender: mpsc::UnboundedSender<Tick>,
    tasks: HashMap<String, ScheduledTicks>,
    next_generation: u64,
}

impl TickScheduler {
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            period,
            sender,
            tasks: HashMap::new(),
            next_generation: 1,
        };
        (scheduler, receiver)
    }

    /// Starts ticking `timer_id`, replacing any task it already had. The
    /// first tick arrives one period from now. Must run inside a tokio runtime.
    pub fn schedule(&mut self, timer_id: &str) -> u64 {
        self.cancel(timer_id);

        let generation = self.next_generation;
        self.next_generation += 1;

        let period = self.period;
        let sender = self.sender.clone();
        let tick = Tick {
            timer_id: timer_id.to_string(),
            generation,
        };
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                trace!(timer_id = %tick.timer_id, generation, "tick");
                if sender.send(tick.clone()).is_err() {
                    break;
                }
            }
        });

        self.tasks
            .insert(timer_id.to_string(), ScheduledTicks { generation, handle });
        generation
    }

    /// Stops the task for `timer_id`. Returns whether one was running.
    pub fn cancel(&mut self, timer_id: &str) -> bool {
        match self.tasks.remove(timer_id) {
            Some(scheduled) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, scheduled) in self.tasks.drain() {
            scheduled.handle.abort();
        }
    }

    pub fn is_scheduled(&self, timer_id: &str) -> bool {
        self.tasks.contains_key(timer_id)
    }

    /// Whether `tick` came from the task currently scheduled for its timer.
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.tasks
            .get(&tick.timer_id)
            .is_some_and(|scheduled| scheduled.generation == tick.generation)
    }

    pub fn scheduled_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
