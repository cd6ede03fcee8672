//! Scheduler surface
//!
//! A minimal cron-style trigger for the producer task: named workflow and
//! task ids, preset cadences anchored at a start date, and no catch-up of
//! ticks missed while the process was down.

mod cadence;
mod scheduler;

pub use cadence::Cadence;
pub use scheduler::{default_start_date, Scheduler, DEFAULT_DAG_ID, DEFAULT_TASK_ID};
