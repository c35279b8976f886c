/// Masonry layout engine
///
/// Maps the ordered pin sequence onto N columns. New pins go into the
/// currently shortest column using an estimated height, since an image's
/// size is unknown until it decodes. Once real sizes arrive, the whole
/// placement is replayed from the top in collection order: a height change
/// early on can move every later card to a different column, so patching
/// only the changed card is not enough.
///
/// Placement is a pure function of (collection order, per-pin height,
/// column count), which keeps replays deterministic.

use std::ops::Range;

use crate::config::LayoutConfig;
use crate::state::{HeightCache, Pin, PinCollection};

/// Grid never collapses below this many columns
pub const MIN_COLUMNS: usize = 2;

/// Where one card sits in the grid
#[derive(Debug, Clone, PartialEq)]
pub struct CardSlot {
    pub pin_id: String,
    pub column: usize,
    /// Distance from the top of the column
    pub top: f32,
    pub height: f32,
    /// False while the height is still the estimate
    pub resolved: bool,
}

impl CardSlot {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Column geometry and placement progress
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayoutState {
    pub column_count: usize,
    pub column_width: f32,
    /// Running height per column, including the trailing gap
    pub column_heights: Vec<f32>,
    /// Pins that currently have a placed card
    pub rendered_count: usize,
}

/// Number of columns that fit into `container_width`
pub fn column_count_for(container_width: f32, config: &LayoutConfig) -> usize {
    let fit = ((container_width + config.gap) / (config.min_column_width + config.gap)).floor();
    if fit.is_finite() && fit > 0.0 {
        (fit as usize).max(MIN_COLUMNS)
    } else {
        MIN_COLUMNS
    }
}

/// Width of each column once `column_count` columns share the container
pub fn column_width_for(container_width: f32, column_count: usize, gap: f32) -> f32 {
    let gutters = gap * (column_count.saturating_sub(1)) as f32;
    ((container_width - gutters) / column_count as f32).max(1.0)
}

#[derive(Debug, Clone)]
pub struct MasonryLayout {
    config: LayoutConfig,
    container_width: f32,
    state: ColumnLayoutState,
    slots: Vec<CardSlot>,
}

impl MasonryLayout {
    pub fn new(config: LayoutConfig, container_width: f32) -> Self {
        let column_count = column_count_for(container_width, &config);
        Self {
            config,
            container_width,
            state: ColumnLayoutState {
                column_count,
                column_width: column_width_for(container_width, column_count, config.gap),
                column_heights: vec![0.0; column_count],
                rendered_count: 0,
            },
            slots: Vec::new(),
        }
    }

    pub fn state(&self) -> &ColumnLayoutState {
        &self.state
    }

    pub fn slots(&self) -> &[CardSlot] {
        &self.slots
    }

    pub fn rendered_count(&self) -> usize {
        self.state.rendered_count
    }

    pub fn column_width(&self) -> f32 {
        self.state.column_width
    }

    pub fn gap(&self) -> f32 {
        self.config.gap
    }

    /// True when every pin in the collection has a card
    pub fn is_caught_up(&self, pins: &PinCollection) -> bool {
        self.state.rendered_count == pins.len()
    }

    /// Placeholder height for a pin whose image has not decoded
    pub fn estimated_height(&self) -> f32 {
        self.state.column_width * self.config.estimate_ratio + self.config.info_height
    }

    /// Height to place a pin with, and whether it is the real one
    fn height_for(&self, pin: &Pin, heights: &HeightCache) -> (f32, bool) {
        match heights.display_height(&pin.pin_id, self.state.column_width) {
            Some(height) => (height, true),
            None => (self.estimated_height(), false),
        }
    }

    /// Index of the shortest column, lowest index on ties
    fn shortest_column(&self) -> usize {
        let mut best = 0;
        for (column, &height) in self.state.column_heights.iter().enumerate() {
            if height < self.state.column_heights[best] {
                best = column;
            }
        }
        best
    }

    fn place(&mut self, pin: &Pin, heights: &HeightCache) {
        let (height, resolved) = self.height_for(pin, heights);
        let column = self.shortest_column();
        let top = self.state.column_heights[column];

        self.state.column_heights[column] = top + height + self.config.gap;
        self.slots.push(CardSlot {
            pin_id: pin.pin_id.clone(),
            column,
            top,
            height,
            resolved,
        });
    }

    /// Place every pin that arrived since the last call.
    ///
    /// Returns the range of collection indices that received a card.
    pub fn append(&mut self, pins: &PinCollection, heights: &HeightCache) -> Range<usize> {
        let start = self.state.rendered_count.min(pins.len());
        for pin in pins.iter().skip(start) {
            self.place(pin, heights);
        }
        self.state.rendered_count = pins.len();
        start..pins.len()
    }

    /// Recompute column geometry and replay placement for all rendered
    /// cards, in collection order.
    pub fn relayout(&mut self, pins: &PinCollection, heights: &HeightCache) {
        let column_count = column_count_for(self.container_width, &self.config);
        self.state.column_count = column_count;
        self.state.column_width = column_width_for(self.container_width, column_count, self.config.gap);
        self.state.column_heights = vec![0.0; column_count];
        self.slots.clear();

        let rendered = self.state.rendered_count.min(pins.len());
        for pin in &pins.as_slice()[..rendered] {
            self.place(pin, heights);
        }
        self.state.rendered_count = rendered;

        log::debug!(
            "Relayout: {} cards in {} columns of {:.1}px",
            rendered,
            column_count,
            self.state.column_width
        );
    }

    /// A card's image decoded. Replays if that card is on the grid.
    ///
    /// Returns true if a replay happened.
    pub fn correct(&mut self, pin_id: &str, pins: &PinCollection, heights: &HeightCache) -> bool {
        let rendered = self.slots.iter().any(|slot| slot.pin_id == pin_id);
        if rendered {
            self.relayout(pins, heights);
        }
        rendered
    }

    /// New container width. Full relayout when the width actually changed.
    pub fn resize(&mut self, container_width: f32, pins: &PinCollection, heights: &HeightCache) -> bool {
        if (container_width - self.container_width).abs() < 0.5 {
            return false;
        }
        self.container_width = container_width;
        self.relayout(pins, heights);
        true
    }

    /// A pin at collection index `index` was removed from the collection.
    /// `pins` is the collection after the removal.
    pub fn remove(&mut self, index: usize, pins: &PinCollection, heights: &HeightCache) {
        if index < self.state.rendered_count {
            self.state.rendered_count -= 1;
        }
        self.relayout(pins, heights);
    }

    /// Drop every card; used when the session resets
    pub fn reset(&mut self) {
        self.slots.clear();
        self.state.rendered_count = 0;
        self.state.column_heights = vec![0.0; self.state.column_count];
    }

    /// Slot indices grouped by column, top to bottom
    pub fn columns(&self) -> Vec<Vec<usize>> {
        let mut columns = vec![Vec::new(); self.state.column_count];
        for (index, slot) in self.slots.iter().enumerate() {
            columns[slot.column].push(index);
        }
        columns
    }

    /// Height of the tallest column
    pub fn content_height(&self) -> f32 {
        self.slots
            .iter()
            .map(CardSlot::bottom)
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::test_pins;
    use crate::state::ImageSize;

    fn config() -> LayoutConfig {
        LayoutConfig {
            min_column_width: 236.0,
            gap: 16.0,
            estimate_ratio: 1.3,
            info_height: 50.0,
        }
    }

    /// Container that yields exactly two 236px columns
    const TWO_COLUMNS: f32 = 236.0 * 2.0 + 16.0;

    fn collection(count: usize) -> PinCollection {
        let mut pins = PinCollection::new();
        pins.append_batch(test_pins("p", count), count, false, count);
        pins
    }

    fn assert_no_overlap(layout: &MasonryLayout) {
        for column in layout.columns() {
            for pair in column.windows(2) {
                let upper = &layout.slots()[pair[0]];
                let lower = &layout.slots()[pair[1]];
                assert!(
                    upper.bottom() + layout.gap() <= lower.top + 1e-3,
                    "{} overlaps {}",
                    upper.pin_id,
                    lower.pin_id
                );
            }
        }
    }

    #[test]
    fn test_column_count() {
        let config = config();
        assert_eq!(column_count_for(TWO_COLUMNS, &config), 2);
        assert_eq!(column_count_for(100.0, &config), 2);
        assert_eq!(column_count_for(0.0, &config), 2);
        assert_eq!(column_count_for(1300.0, &config), 5);
        assert_eq!(column_width_for(TWO_COLUMNS, 2, 16.0), 236.0);
    }

    #[test]
    fn test_estimated_height() {
        let layout = MasonryLayout::new(config(), TWO_COLUMNS);
        assert_eq!(layout.column_width(), 236.0);
        assert!((layout.estimated_height() - 356.8).abs() < 1e-3);
    }

    #[test]
    fn test_shortest_column_with_ties_to_the_left() {
        let pins = collection(4);
        let heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);

        let placed = layout.append(&pins, &heights);

        assert_eq!(placed, 0..4);
        let columns: Vec<_> = layout.slots().iter().map(|s| s.column).collect();
        assert_eq!(columns, [0, 1, 0, 1]);
        assert!(layout.is_caught_up(&pins));
    }

    #[test]
    fn test_append_only_places_new_pins() {
        let mut pins = PinCollection::new();
        pins.append_batch(test_pins("a", 3), 6, true, 3);
        let heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);
        layout.append(&pins, &heights);
        let before = layout.slots().to_vec();

        pins.append_batch(test_pins("b", 3), 6, false, 3);
        let placed = layout.append(&pins, &heights);

        assert_eq!(placed, 3..6);
        assert_eq!(&layout.slots()[..3], &before[..]);
        assert_eq!(layout.rendered_count(), 6);
    }

    #[test]
    fn test_correction_moves_only_later_cards_in_same_column() {
        let pins = collection(3);
        let mut heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);
        layout.append(&pins, &heights);

        let b_before = layout.slots()[1].clone();
        assert_eq!(layout.slots()[2].column, 0);
        assert!((layout.slots()[2].top - (356.8 + 16.0)).abs() < 1e-3);

        heights.insert("p0", ImageSize { width: 300, height: 450 });
        assert!(layout.correct("p0", &pins, &heights));

        let a = &layout.slots()[0];
        assert!(a.resolved);
        assert!((a.height - 354.0).abs() < 1e-3);
        assert_eq!(layout.slots()[1], b_before);
        assert_eq!(layout.slots()[2].column, 0);
        assert!((layout.slots()[2].top - (354.0 + 16.0)).abs() < 1e-3);
    }

    #[test]
    fn test_correction_can_change_later_columns() {
        let pins = collection(3);
        let mut heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);
        layout.append(&pins, &heights);

        // p0 turns out much taller than the estimate: p2 must go right
        heights.insert("p0", ImageSize { width: 100, height: 400 });
        layout.correct("p0", &pins, &heights);

        assert_eq!(layout.slots()[2].column, 1);
        assert_no_overlap(&layout);
    }

    #[test]
    fn test_correction_of_unrendered_pin_is_ignored() {
        let pins = collection(2);
        let mut heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);

        heights.insert("p0", ImageSize { width: 10, height: 10 });
        assert!(!layout.correct("p0", &pins, &heights));
        assert!(layout.slots().is_empty());
    }

    #[test]
    fn test_replay_is_idempotent_and_order_independent() {
        let pins = collection(30);
        let sizes: Vec<_> = (0..30)
            .map(|i| ImageSize { width: 200 + i * 7, height: 150 + (i * 37) % 400 })
            .collect();

        let mut forward = HeightCache::default();
        let mut layout_a = MasonryLayout::new(config(), 1000.0);
        layout_a.append(&pins, &forward);
        for (i, size) in sizes.iter().enumerate() {
            forward.insert(&format!("p{}", i), *size);
            layout_a.correct(&format!("p{}", i), &pins, &forward);
        }

        let mut backward = HeightCache::default();
        let mut layout_b = MasonryLayout::new(config(), 1000.0);
        layout_b.append(&pins, &backward);
        for (i, size) in sizes.iter().enumerate().rev() {
            backward.insert(&format!("p{}", i), *size);
            layout_b.correct(&format!("p{}", i), &pins, &backward);
        }

        assert_eq!(layout_a.slots(), layout_b.slots());

        let snapshot = layout_a.slots().to_vec();
        layout_a.relayout(&pins, &forward);
        assert_eq!(layout_a.slots(), &snapshot[..]);
        assert_no_overlap(&layout_a);
    }

    #[test]
    fn test_resize_recomputes_columns() {
        let pins = collection(12);
        let mut heights = HeightCache::default();
        heights.insert("p3", ImageSize { width: 400, height: 200 });
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);
        layout.append(&pins, &heights);

        assert!(layout.resize(1300.0, &pins, &heights));
        assert_eq!(layout.state().column_count, 5);
        assert_eq!(layout.rendered_count(), 12);
        assert_eq!(layout.slots().len(), 12);
        // Resolved heights follow the new column width
        let width = layout.column_width();
        assert!((layout.slots()[3].height - width / 2.0).abs() < 1e-3);
        assert_no_overlap(&layout);

        assert!(!layout.resize(1300.2, &pins, &heights));
    }

    #[test]
    fn test_remove_decrements_rendered_count() {
        let mut pins = collection(5);
        let heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);
        layout.append(&pins, &heights);

        let (index, _) = pins.remove("p1").unwrap();
        layout.remove(index, &pins, &heights);

        assert_eq!(layout.rendered_count(), 4);
        assert!(layout.is_caught_up(&pins));
        assert!(layout.slots().iter().all(|slot| slot.pin_id != "p1"));
        assert_no_overlap(&layout);
    }

    #[test]
    fn test_columns_group_slots_top_to_bottom() {
        let pins = collection(5);
        let heights = HeightCache::default();
        let mut layout = MasonryLayout::new(config(), TWO_COLUMNS);
        layout.append(&pins, &heights);

        assert_eq!(layout.columns(), vec![vec![0, 2, 4], vec![1, 3]]);
        let estimate = layout.estimated_height();
        assert!((layout.content_height() - (estimate * 3.0 + 32.0)).abs() < 1e-3);

        layout.reset();
        assert_eq!(layout.rendered_count(), 0);
        assert!(layout.columns().iter().all(Vec::is_empty));
    }
}
