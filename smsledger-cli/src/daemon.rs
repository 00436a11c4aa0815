//! Daemon mode: wait for the daily run time, run a pass, repeat.

use anyhow::{Context, Result};
use smsledger_core::{Action, Clock, DailySchedule, SchedulerLoop};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;
use tracing::{error, info};

use crate::pipeline::PassSummary;

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Interrupted,
}

/// Suspends the daemon between steps. Interrupts are only observed here.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration) -> impl Future<Output = Result<Wake>>;
}

/// Tokio sleep that ends early on Ctrl-C / SIGINT.
///
/// The signal listener is created once, so an interrupt that arrives during a
/// pass is picked up by the next sleep.
pub struct SignalSleeper {
    interrupt: Pin<Box<dyn Future<Output = io::Result<()>>>>,
}

impl SignalSleeper {
    pub fn new() -> Self {
        Self {
            interrupt: Box::pin(tokio::signal::ctrl_c()),
        }
    }
}

impl Default for SignalSleeper {
    fn default() -> Self {
        Self::new()
    }
}

impl Sleeper for SignalSleeper {
    async fn sleep(&mut self, duration: Duration) -> Result<Wake> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(Wake::Elapsed),
            res = &mut self.interrupt => {
                res.context("listening for ctrl-c")?;
                Ok(Wake::Interrupted)
            }
        }
    }
}

fn to_std(d: chrono::Duration) -> Duration {
    d.to_std().unwrap_or_default()
}

/// Loop forever; returns `Ok` once interrupted.
///
/// Errors from `pass` are logged and the loop keeps going. Only a failing
/// sleeper (e.g. the signal handler could not be installed) ends it with `Err`.
pub async fn run_daemon<C, S, F>(
    clock: &C,
    sleeper: &mut S,
    schedule: DailySchedule,
    mut pass: F,
) -> Result<()>
where
    C: Clock,
    S: Sleeper,
    F: FnMut() -> Result<PassSummary>,
{
    let mut sched = SchedulerLoop::new(schedule);

    loop {
        let now = clock.now();
        let wake = match sched.next_action(now) {
            Action::Wait { until, wait } => {
                info!("Current time: {}", now.format(TS_FORMAT));
                info!("Next run scheduled for: {}", until.format(TS_FORMAT));
                info!("Waiting for {:.1} hours...", wait.num_seconds() as f64 / 3600.0);
                sleeper.sleep(to_std(wait)).await?
            }
            Action::Run { guard } => {
                info!("Running scheduled update at {}", now.format(TS_FORMAT));
                match pass() {
                    Ok(summary) => info!(
                        fetched = summary.fetched,
                        skipped = summary.skipped,
                        added = summary.added,
                        "Processing completed successfully"
                    ),
                    Err(e) => error!("Error during processing: {e:#}"),
                }
                sleeper.sleep(to_std(guard)).await?
            }
        };

        if wake == Wake::Interrupted {
            info!("Shutting down...");
            return Ok(());
        }
    }
}
