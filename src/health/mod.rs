// Package health provides service status values, the checker capability and the aggregate calculator.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

pub mod calculator;


pub use calculator::{encode_summary, report, Calculator, HealthCalculator, Record};

/// Liveness of a single service or dependency.
///
/// Only `Down` makes the aggregate unhealthy; `TemporarilyUnavailable`
/// is reported but still counts as healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Up,
    Down,
    TemporarilyUnavailable,
}

impl Status {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Down => "down",
            Status::TemporarilyUnavailable => "unavailable",
        }
    }

    pub const fn is_down(&self) -> bool {
        matches!(self, Status::Down)
    }

    const fn to_u8(self) -> u8 {
        match self {
            Status::Up => 0,
            Status::Down => 1,
            Status::TemporarilyUnavailable => 2,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Status::Up,
            1 => Status::Down,
            _ => Status::TemporarilyUnavailable,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can report a name and its current status.
///
/// `status` may be called from the health endpoint while the implementor
/// updates its own state, so implementations must tolerate concurrent reads.
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &str;
    fn status(&self) -> Status;
}

/// Lock-free status cell for health-reporting components.
#[derive(Debug)]
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new(status: Status) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub fn load(&self) -> Status {
        Status::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Stores the new status and returns the previous one.
    pub fn swap(&self, status: Status) -> Status {
        Status::from_u8(self.0.swap(status.to_u8(), Ordering::AcqRel))
    }
}

impl Default for AtomicStatus {
    fn default() -> Self {
        Self::new(Status::Up)
    }
}
