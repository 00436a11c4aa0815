//! Daily run schedule and the wait/run state machine behind daemon mode.
//!
//! Time is naive local wall-clock time. The state machine never sleeps itself:
//! callers ask it for the next [`Action`] and perform it, which keeps it
//! testable with a fake [`Clock`].

use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Pause after a pass so the same minute never triggers twice.
pub const GUARD_INTERVAL_SECS: i64 = 61;

pub fn guard_interval() -> Duration {
    Duration::seconds(GUARD_INTERVAL_SECS)
}

/// Source of "now" as local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Real clock, either in the machine's local zone or a fixed IANA zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemClock {
    Local,
    Zone(Tz),
}

impl SystemClock {
    pub fn from_timezone(tz: Option<Tz>) -> Self {
        tz.map_or(SystemClock::Local, SystemClock::Zone)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        match self {
            SystemClock::Local => Local::now().naive_local(),
            SystemClock::Zone(tz) => zoned_now(Utc::now(), *tz),
        }
    }
}

fn zoned_now(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    tz.from_utc_datetime(&now.naive_utc()).naive_local()
}

/// A fixed time of day at which a pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    run_at: NaiveTime,
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            run_at: NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default(),
        }
    }
}

impl DailySchedule {
    pub fn new(run_at: NaiveTime) -> Self {
        Self { run_at }
    }

    /// Parse an "HH:MM" time of day.
    pub fn parse(hh_mm: &str) -> Option<Self> {
        NaiveTime::parse_from_str(hh_mm.trim(), "%H:%M").ok().map(Self::new)
    }

    pub fn run_at(&self) -> NaiveTime {
        self.run_at
    }

    /// Next occurrence strictly after `now`; at or past today's instant means tomorrow.
    pub fn next_run(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.run_at);
        if now >= today {
            today + Duration::days(1)
        } else {
            today
        }
    }

    /// How long to wait from `now` until [`Self::next_run`].
    pub fn wait_from(&self, now: NaiveDateTime) -> Duration {
        self.next_run(now) - now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Waiting,
    Running,
}

/// What the daemon should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Sleep until `until` (`wait` from now).
    Wait { until: NaiveDateTime, wait: Duration },
    /// Run one processing pass, then sleep for `guard`.
    Run { guard: Duration },
}

/// Two-state loop: WAITING computes the sleep to the next run, RUNNING hands
/// out one pass followed by the guard interval.
#[derive(Debug, Clone)]
pub struct SchedulerLoop {
    schedule: DailySchedule,
    state: SchedulerState,
}

impl SchedulerLoop {
    pub fn new(schedule: DailySchedule) -> Self {
        Self {
            schedule,
            state: SchedulerState::Waiting,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Produce the action for the current state and advance to the other one.
    pub fn next_action(&mut self, now: NaiveDateTime) -> Action {
        match self.state {
            SchedulerState::Waiting => {
                self.state = SchedulerState::Running;
                Action::Wait {
                    until: self.schedule.next_run(now),
                    wait: self.schedule.wait_from(now),
                }
            }
            SchedulerState::Running => {
                self.state = SchedulerState::Waiting;
                Action::Run {
                    guard: guard_interval(),
                }
            }
        }
    }
}
