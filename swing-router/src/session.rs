//! Process-wide `active`/`suspend` flags, guarded by a single mutex so the
//! two background workers named in SPEC_FULL.md §5 (margin/commission
//! polling, stale-order reaper) can read them without ever touching
//! strategy state directly. Grounded on `toucan-core`'s pervasive use of
//! `parking_lot::Mutex` over `std::sync::Mutex`.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    active: bool,
    suspended: bool,
}

/// Shared handle to the session's `active`/`suspend` flags. Cheap to
/// clone; every clone refers to the same underlying state.
#[derive(Debug, Clone)]
pub struct SessionControl {
    flags: Arc<Mutex<Flags>>,
}

impl SessionControl {
    pub fn new() -> Self {
        Self {
            flags: Arc::new(Mutex::new(Flags::default())),
        }
    }

    /// Activates the session. Only an explicit `stop()` deactivates it
    /// again (SPEC_FULL.md §7: "nothing in this list is fatal ... only
    /// the explicit `stop()` transitions the session to inactive").
    pub fn start(&self) {
        let mut flags = self.flags.lock();
        flags.active = true;
        flags.suspended = false;
    }

    pub fn stop(&self) {
        self.flags.lock().active = false;
    }

    pub fn suspend(&self) {
        self.flags.lock().suspended = true;
    }

    pub fn resume(&self) {
        self.flags.lock().suspended = false;
    }

    pub fn is_active(&self) -> bool {
        self.flags.lock().active
    }

    /// `true` when the session is active and not suspended — the
    /// condition `EventRouter::dispatch` checks before driving the
    /// `SwingStateMachine` on a tick.
    pub fn should_trade(&self) -> bool {
        let flags = self.flags.lock();
        flags.active && !flags.suspended
    }
}

impl Default for SessionControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive_until_started() {
        let ctl = SessionControl::new();
        assert!(!ctl.is_active());
        ctl.start();
        assert!(ctl.is_active());
        assert!(ctl.should_trade());
    }

    #[test]
    fn suspend_blocks_trading_without_deactivating() {
        let ctl = SessionControl::new();
        ctl.start();
        ctl.suspend();
        assert!(ctl.is_active());
        assert!(!ctl.should_trade());
        ctl.resume();
        assert!(ctl.should_trade());
    }

    #[test]
    fn stop_is_the_only_thing_that_deactivates() {
        let ctl = SessionControl::new();
        ctl.start();
        ctl.stop();
        assert!(!ctl.is_active());
        assert!(!ctl.should_trade());
    }
}
