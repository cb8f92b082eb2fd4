//! 20-20-20 break reminder, independent of any round.

use tracing::warn;

use crate::error::CapabilityError;
use crate::time::{Duration, Interval};

pub const BREAK_INTERVAL: Duration = Duration::from_secs(20 * 60);
pub const BREAK_TITLE: &str = "Time to rest your eyes";
pub const BREAK_BODY: &str =
    "20 minutes have passed. Look at something 20 feet (about 6 m) away for 20 seconds.";
/// Notification tag so repeated reminders replace each other.
pub const BREAK_TAG: &str = "vision-break";

pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str, tag: &str) -> Result<(), CapabilityError>;
}

#[derive(Debug, Clone)]
pub struct BreakReminder {
    enabled: bool,
    interval: Interval,
    advisory: Option<String>,
}

impl BreakReminder {
    pub fn new(enabled: bool) -> Self {
        Self::with_interval(enabled, BREAK_INTERVAL)
    }

    pub fn with_interval(enabled: bool, period: Duration) -> Self {
        Self {
            enabled,
            interval: Interval::new(period),
            advisory: None,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Toggling restarts the interval from zero.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            self.interval = Interval::new(self.interval.period());
        }
        self.enabled = enabled;
    }

    /// One-time message explaining why reminders were switched off.
    pub fn take_advisory(&mut self) -> Option<String> {
        self.advisory.take()
    }

    /// Advance the timer and notify once per elapsed period.
    ///
    /// A notifier failure disables reminders and leaves an advisory behind.
    pub fn tick<N: Notifier>(&mut self, dt: Duration, notifier: &mut N) -> u32 {
        if !self.enabled {
            return 0;
        }
        let due = self.interval.advance(dt);
        let mut sent = 0;
        for _ in 0..due {
            match notifier.notify(BREAK_TITLE, BREAK_BODY, BREAK_TAG) {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("break reminder disabled: {e}");
                    self.enabled = false;
                    self.advisory = Some(format!("Break reminders turned off: {e}"));
                    break;
                }
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        sent: u32,
        deny: bool,
    }

    impl Notifier for Counting {
        fn notify(&mut self, _: &str, _: &str, tag: &str) -> Result<(), CapabilityError> {
            assert_eq!(tag, BREAK_TAG);
            if self.deny {
                return Err(CapabilityError::NotificationDenied);
            }
            self.sent += 1;
            Ok(())
        }
    }

    #[test]
    fn fires_every_period_while_enabled() {
        let mut n = Counting { sent: 0, deny: false };
        let mut r = BreakReminder::new(true);
        assert_eq!(r.tick(Duration::from_secs(19 * 60), &mut n), 0);
        assert_eq!(r.tick(Duration::from_secs(60), &mut n), 1);
        assert_eq!(r.tick(Duration::from_secs(40 * 60), &mut n), 2);
        assert_eq!(n.sent, 3);

        r.set_enabled(false);
        assert_eq!(r.tick(Duration::from_secs(3600), &mut n), 0);
    }

    #[test]
    fn denied_permission_disables_with_one_advisory() {
        let mut n = Counting { sent: 0, deny: true };
        let mut r = BreakReminder::with_interval(true, Duration::from_secs(1));
        assert_eq!(r.tick(Duration::from_secs(5), &mut n), 0);
        assert!(!r.enabled());
        assert!(r.take_advisory().is_some());
        assert!(r.take_advisory().is_none());
    }
}
