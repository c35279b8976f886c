/// Full-screen viewer state
///
/// Index-addressable view over the same collection the grid shows. Reaching
/// the loaded tail asks for more data instead of stopping, so the viewer
/// walks through the whole archive.

use crate::state::PinCollection;

/// Result of a `next()` press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Now showing this index
    Moved(usize),
    /// At the tail; will advance once the next page lands
    Waiting,
    /// Nothing to move to
    Stay,
}

#[derive(Debug, Clone)]
pub struct CarouselController {
    view_index: usize,
    is_open: bool,
    /// A `next()` is waiting on a page
    pending_advance: bool,
    prefetch_distance: usize,
}

impl CarouselController {
    pub fn new(prefetch_distance: usize) -> Self {
        Self {
            view_index: 0,
            is_open: false,
            pending_advance: false,
            prefetch_distance,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn view_index(&self) -> usize {
        self.view_index
    }

    pub fn is_waiting(&self) -> bool {
        self.pending_advance
    }

    /// Open on `index`. Rejects indices outside the loaded collection.
    pub fn open(&mut self, index: usize, pins: &PinCollection) -> bool {
        if index >= pins.len() {
            return false;
        }
        self.view_index = index;
        self.is_open = true;
        self.pending_advance = false;
        true
    }

    /// Hide the viewer; the position is kept for the next open
    pub fn close(&mut self) {
        self.is_open = false;
        self.pending_advance = false;
    }

    pub fn next(&mut self, pins: &PinCollection) -> Step {
        if !self.is_open {
            return Step::Stay;
        }
        if self.view_index + 1 < pins.len() {
            self.view_index += 1;
            return Step::Moved(self.view_index);
        }
        if pins.has_more() {
            self.pending_advance = true;
            return Step::Waiting;
        }
        Step::Stay
    }

    /// Step back; never fetches
    pub fn prev(&mut self) -> bool {
        if !self.is_open || self.view_index == 0 {
            return false;
        }
        self.view_index -= 1;
        self.pending_advance = false;
        true
    }

    /// Close enough to the loaded tail to fetch ahead
    pub fn should_prefetch(&self, pins: &PinCollection) -> bool {
        self.is_open && pins.has_more() && self.view_index + self.prefetch_distance >= pins.len()
    }

    /// Index whose image should be warmed up next
    pub fn read_ahead(&self, pins: &PinCollection) -> Option<usize> {
        let next = self.view_index + 1;
        (self.is_open && next < pins.len()).then_some(next)
    }

    /// A page this viewer was waiting on landed. Returns true if it moved.
    pub fn page_landed(&mut self, pins: &PinCollection) -> bool {
        if !std::mem::take(&mut self.pending_advance) || !self.is_open {
            return false;
        }
        if self.view_index + 1 < pins.len() {
            self.view_index += 1;
            return true;
        }
        false
    }

    /// A page this viewer was waiting on failed; stay put
    pub fn page_failed(&mut self) {
        self.pending_advance = false;
    }

    /// The pin at `index` was removed; `pins` is the collection after removal
    pub fn pin_removed(&mut self, index: usize, pins: &PinCollection) {
        if pins.is_empty() {
            self.close();
            self.view_index = 0;
            return;
        }
        if index < self.view_index {
            self.view_index -= 1;
        }
        self.view_index = self.view_index.min(pins.len() - 1);
    }

    /// Back to the start for a new session
    pub fn reset(&mut self) {
        self.view_index = 0;
        self.is_open = false;
        self.pending_advance = false;
    }
}
