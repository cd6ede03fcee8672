//! Tick loop for the producer task

use super::cadence::Cadence;
use crate::error::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::future::Future;
use tracing::{error, info};

/// Workflow id of the producer schedule
pub const DEFAULT_DAG_ID: &str = "user_automation";

/// Task id of the producer task
pub const DEFAULT_TASK_ID: &str = "stream_data_from_api";

/// Default schedule anchor, 2023-09-03 10:00 UTC
pub fn default_start_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 9, 3, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Runs one task on a fixed cadence without catch-up
#[derive(Debug, Clone)]
pub struct Scheduler {
    dag_id: String,
    task_id: String,
    cadence: Cadence,
    start_date: DateTime<Utc>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DAG_ID, DEFAULT_TASK_ID)
    }
}

impl Scheduler {
    /// Create a daily scheduler for the named workflow and task
    pub fn new(dag_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            dag_id: dag_id.into(),
            task_id: task_id.into(),
            cadence: Cadence::Daily,
            start_date: default_start_date(),
        }
    }

    /// Set the cadence
    #[must_use]
    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Set the anchor of the tick grid
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = start_date;
        self
    }

    /// Workflow id
    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    /// Task id
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Cadence
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Next tick strictly after `now`
    pub fn next_tick(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.cadence.next_tick(self.start_date, now)
    }

    /// Run `task` on every tick until `shutdown` resolves
    ///
    /// A failed run is logged and the loop waits for the next tick. Returns
    /// the number of runs started.
    pub async fn run_until<F, Fut, T, S>(&self, mut task: F, shutdown: S) -> Result<usize>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut last_tick: Option<DateTime<Utc>> = None;
        let mut runs = 0;

        info!(
            dag_id = %self.dag_id,
            task_id = %self.task_id,
            cadence = %self.cadence,
            "Scheduler started"
        );

        loop {
            // The wall clock may lag the last tick when the timer fires early.
            let now = match last_tick {
                Some(last) => Utc::now().max(last),
                None => Utc::now(),
            };
            let tick = self.next_tick(now);
            let wait = (tick - now).to_std().unwrap_or_default();
            info!(dag_id = %self.dag_id, next_run = %tick, "Waiting for next tick");

            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!(dag_id = %self.dag_id, runs, "Scheduler stopped");
                    return Ok(runs);
                }
                () = tokio::time::sleep(wait) => {}
            }

            last_tick = Some(tick);
            runs += 1;
            info!(dag_id = %self.dag_id, task_id = %self.task_id, logical_date = %tick, "Task run started");

            match task().await {
                Ok(_) => info!(dag_id = %self.dag_id, task_id = %self.task_id, "Task run succeeded"),
                Err(e) => error!(
                    dag_id = %self.dag_id,
                    task_id = %self.task_id,
                    error_type = e.kind(),
                    "Task run failed: {e}"
                ),
            }
        }
    }
}
