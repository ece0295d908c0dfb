use serde::{Deserialize, Serialize};

/// Identifies one started countdown.
///
/// Every start issues a fresh handle, so a tick scheduled for a countdown that
/// has since been cancelled or replaced can be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What a countdown is counting down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPurpose {
    /// Time left to answer the current question.
    Answer,
    /// Pause after a correct answer before moving on.
    Explanation,
}

/// A countdown measured in timer units (one unit per tick).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    handle: TimerHandle,
    purpose: TimerPurpose,
    remaining: u32,
}

impl Countdown {
    #[must_use]
    pub fn handle(&self) -> TimerHandle {
        self.handle
    }

    #[must_use]
    pub fn purpose(&self) -> TimerPurpose {
        self.purpose
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one unit. Returns true once the countdown has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    pub fn extend(&mut self, units: u32) {
        self.remaining = self.remaining.saturating_add(units);
    }
}

/// Issues countdowns with monotonically increasing handles.
#[derive(Debug, Default)]
pub(crate) struct TimerIssuer {
    next: u64,
}

impl TimerIssuer {
    pub(crate) fn start(&mut self, purpose: TimerPurpose, units: u32) -> Countdown {
        self.next += 1;
        Countdown {
            handle: TimerHandle(self.next),
            purpose,
            remaining: units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_never_reused() {
        let mut issuer = TimerIssuer::default();
        let a = issuer.start(TimerPurpose::Answer, 30);
        let b = issuer.start(TimerPurpose::Answer, 30);
        assert_ne!(a.handle(), b.handle());
        assert!(b.handle().value() > a.handle().value());
    }

    #[test]
    fn countdown_runs_out_and_extends() {
        let mut issuer = TimerIssuer::default();
        let mut countdown = issuer.start(TimerPurpose::Explanation, 2);
        assert!(!countdown.tick());
        countdown.extend(1);
        assert_eq!(countdown.remaining(), 2);
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert!(countdown.tick());
        assert_eq!(countdown.remaining(), 0);
    }
}
