use chrono::{NaiveTime, Timelike};
use parking_lot::Mutex;
use rigkeeper_types::{RigError, RigResult};
use std::fmt;
use tracing::warn;

/// Daily mining window, minute resolution. `start > end` wraps past midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleWindow {
    pub fn parse(s: &str) -> RigResult<Self> {
        let invalid = || RigError::Schedule(format!("expected HH:MM-HH:MM, got {:?}", s));

        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        let start = parse_hhmm(start).ok_or_else(invalid)?;
        let end = parse_hhmm(end).ok_or_else(invalid)?;

        Ok(Self { start, end })
    }

    pub fn is_overnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, now: NaiveTime) -> bool {
        let now = truncate_to_minute(now);
        if self.is_overnight() {
            now >= self.start || now <= self.end
        } else {
            self.start <= now && now <= self.end
        }
    }
}

impl fmt::Display for ScheduleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(h, m, 0)
}

fn truncate_to_minute(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// `true` when scheduling is off or no valid window is configured.
pub fn should_be_active(enabled: bool, window: Option<&ScheduleWindow>, now: NaiveTime) -> bool {
    match (enabled, window) {
        (true, Some(window)) => window.contains(now),
        _ => true,
    }
}

/// Scheduler switch plus the parsed window. An unparseable window degrades to always-active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleGate {
    enabled: bool,
    window: Option<ScheduleWindow>,
}

impl ScheduleGate {
    pub fn new(enabled: bool, mining_hours: &str) -> Self {
        let window = match ScheduleWindow::parse(mining_hours) {
            Ok(window) => Some(window),
            Err(e) => {
                warn!("Invalid mining hours ({}); treating schedule as always active", e);
                None
            }
        };
        Self { enabled, window }
    }

    pub fn always() -> Self {
        Self {
            enabled: false,
            window: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn window(&self) -> Option<ScheduleWindow> {
        self.window
    }

    pub fn is_active_at(&self, now: NaiveTime) -> bool {
        should_be_active(self.enabled, self.window.as_ref(), now)
    }
}

/// Source of local wall-clock time-of-day.
pub trait Clock: Send + Sync {
    fn time_of_day(&self) -> NaiveTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn time_of_day(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// Settable clock for driving the gate deterministically.
#[derive(Debug)]
pub struct FixedClock(Mutex<NaiveTime>);

impl FixedClock {
    pub fn new(time: NaiveTime) -> Self {
        Self(Mutex::new(time))
    }

    pub fn at(hour: u32, minute: u32) -> Self {
        Self::new(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn set(&self, time: NaiveTime) {
        *self.0.lock() = time;
    }
}

impl Clock for FixedClock {
    fn time_of_day(&self) -> NaiveTime {
        *self.0.lock()
    }
}
