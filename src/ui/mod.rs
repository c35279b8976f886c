/// User interface module
///
/// - `grid` - the masonry grid, toolbar and pagination sentinel
/// - `viewer` - the full-screen overlay
///
/// Views only read engine state; every interaction becomes a `Message`.

pub mod grid;
pub mod viewer;

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Padding around the grid
pub const GRID_PADDING: f32 = 16.0;
/// Room taken by the vertical scrollbar
pub const SCROLLBAR_WIDTH: f32 = 12.0;
pub const TOOLBAR_HEIGHT: f32 = 56.0;
/// Cards past this position in a batch all start together
const MAX_STAGGER_STEPS: u32 = 20;

/// Width available to the columns for a given window width
pub fn grid_width(window_width: f32) -> f32 {
    (window_width - 2.0 * GRID_PADDING - SCROLLBAR_WIDTH).max(1.0)
}

/// Height of the scrollable area for a given window height
pub fn grid_viewport_height(window_height: f32) -> f32 {
    (window_height - TOOLBAR_HEIGHT).max(1.0)
}

/// Staggered fade-in of freshly placed cards
///
/// Each card of a batch starts its fade a little after the previous one.
#[derive(Debug, Clone)]
pub struct FadeSchedule {
    stagger: Duration,
    duration: Duration,
    starts: HashMap<String, Instant>,
}

impl FadeSchedule {
    pub fn new(stagger: Duration, duration: Duration) -> Self {
        Self {
            stagger,
            duration,
            starts: HashMap::new(),
        }
    }

    /// Schedule a batch, in placement order
    pub fn schedule<'a>(&mut self, pin_ids: impl IntoIterator<Item = &'a String>, now: Instant) {
        for (position, pin_id) in pin_ids.into_iter().enumerate() {
            let delay = self.stagger * position.min(MAX_STAGGER_STEPS as usize) as u32;
            self.starts.insert(pin_id.clone(), now + delay);
        }
    }

    /// Opacity of a card at `now`; unknown cards are fully visible
    pub fn opacity(&self, pin_id: &str, now: Instant) -> f32 {
        let Some(start) = self.starts.get(pin_id) else {
            return 1.0;
        };
        if now <= *start {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        ((now - *start).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Whether any card is still fading
    pub fn is_animating(&self, now: Instant) -> bool {
        self.starts
            .values()
            .any(|start| now < *start + self.duration)
    }

    /// Drop finished fades
    pub fn prune(&mut self, now: Instant) {
        let duration = self.duration;
        self.starts.retain(|_, start| now < *start + duration);
    }

    pub fn clear(&mut self) {
        self.starts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_is_staggered() {
        let mut fades = FadeSchedule::new(Duration::from_millis(30), Duration::from_millis(250));
        let now = Instant::now();
        let batch = vec!["a".to_string(), "b".to_string()];
        fades.schedule(&batch, now);

        let later = now + Duration::from_millis(125);
        assert!((fades.opacity("a", later) - 0.5).abs() < 1e-3);
        assert!(fades.opacity("b", later) < fades.opacity("a", later));
        assert_eq!(fades.opacity("unknown", now), 1.0);

        assert!(fades.is_animating(later));
        let done = now + Duration::from_secs(1);
        assert!(!fades.is_animating(done));
        fades.prune(done);
        assert_eq!(fades.opacity("b", now), 1.0);
    }

    #[test]
    fn test_stagger_is_capped() {
        let mut fades = FadeSchedule::new(Duration::from_millis(30), Duration::from_millis(250));
        let now = Instant::now();
        let batch: Vec<String> = (0..50).map(|i| format!("p{}", i)).collect();
        fades.schedule(&batch, now);

        let capped = now + Duration::from_millis(30 * 20);
        assert_eq!(fades.opacity("p20", capped), 0.0);
        assert_eq!(fades.opacity("p49", capped), 0.0);
        assert!(fades.opacity("p20", capped + Duration::from_millis(125)) > 0.0);
        assert_eq!(
            fades.opacity("p49", capped + Duration::from_millis(125)),
            fades.opacity("p20", capped + Duration::from_millis(125))
        );
    }

    #[test]
    fn test_grid_width_leaves_room_for_chrome() {
        assert_eq!(grid_width(1024.0), 1024.0 - 32.0 - 12.0);
        assert_eq!(grid_width(0.0), 1.0);
    }
}
