pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod model;
pub mod notify;
pub mod runtime;
pub mod scheduler;
pub mod storage;
pub mod timer_api;
pub mod timers;

pub use timer_api::{BulkAction, TimerApi, TimerEdit};
