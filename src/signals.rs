/// Signal sources that drive the engine
///
/// Two kinds of host events feed the grid:
/// - the pagination sentinel at the bottom of the scroll area coming into
///   view (`SentinelProbe`)
/// - the window settling on a new size after a burst of resize events
///   (`Debouncer`)
///
/// Both are plain state machines. The shell feeds them scroll viewports and
/// timer expiries; they decide when the engine should hear about it.

use std::time::Duration;

/// Edge-triggered visibility check for the bottom sentinel
///
/// Fires once when the sentinel enters the visible area (extended by
/// `margin`) and stays quiet until it has left and come back, the way an
/// intersection observer reports entries.
#[derive(Debug, Clone)]
pub struct SentinelProbe {
    margin: f32,
    visible: bool,
}

impl SentinelProbe {
    pub fn new(margin: f32) -> Self {
        Self { margin, visible: false }
    }

    /// Feed the latest scroll geometry. Returns true on a new intersection.
    pub fn observe(&mut self, scroll_top: f32, viewport_height: f32, content_height: f32) -> bool {
        let visible = scroll_top + viewport_height + self.margin >= content_height;
        let entered = visible && !self.visible;
        self.visible = visible;
        entered
    }

    /// Whether the sentinel is currently in view
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Forget the last observation (content was replaced)
    pub fn reset(&mut self) {
        self.visible = false;
    }
}

/// Ticket for one scheduled settle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// Keeps only the last value pushed within the quiet window
///
/// Every `push` schedules a check after `window`; only the check belonging
/// to the most recent push yields the value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    generation: u64,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: 0,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a new value; the caller schedules `settle` after `window()`
    pub fn push(&mut self, value: T) -> DebounceTicket {
        self.generation += 1;
        self.pending = Some(value);
        DebounceTicket(self.generation)
    }

    /// The quiet window of `ticket` elapsed. Yields the value only if no
    /// newer push happened in the meantime.
    pub fn settle(&mut self, ticket: DebounceTicket) -> Option<T> {
        if ticket.0 != self.generation {
            return None;
        }
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_fires_once_per_entry() {
        let mut probe = SentinelProbe::new(100.0);

        assert!(!probe.observe(0.0, 800.0, 3000.0));
        assert!(probe.observe(2150.0, 800.0, 3000.0));
        // Still visible: no repeat
        assert!(!probe.observe(2200.0, 800.0, 3000.0));

        // More content arrived, sentinel pushed out of view
        assert!(!probe.observe(2200.0, 800.0, 6000.0));
        assert!(!probe.is_visible());
        assert!(probe.observe(5200.0, 800.0, 6000.0));
    }

    #[test]
    fn test_short_content_counts_as_visible() {
        let mut probe = SentinelProbe::new(0.0);
        assert!(probe.observe(0.0, 800.0, 300.0));
        probe.reset();
        assert!(probe.observe(0.0, 800.0, 300.0));
    }

    #[test]
    fn test_debouncer_keeps_last_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(150));

        let first = debouncer.push(800.0);
        let second = debouncer.push(900.0);
        let last = debouncer.push(1024.0);

        assert_eq!(debouncer.settle(first), None);
        assert_eq!(debouncer.settle(second), None);
        assert_eq!(debouncer.settle(last), Some(1024.0));
        // Already consumed
        assert_eq!(debouncer.settle(last), None);
    }
}
