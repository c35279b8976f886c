/// The session context: everything that lives for one sort key
///
/// A sort change throws the whole `Session` away and starts a new one with
/// a fresh token. Every asynchronous request carries the token it was issued
/// under, so a late result from an old session can be recognized and dropped.

use std::collections::{HashMap, HashSet};

use super::data::{PinCollection, SortKey};

/// Identifies one session; strictly increasing across resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

impl SessionToken {
    pub fn first() -> Self {
        SessionToken(1)
    }

    pub fn next(self) -> Self {
        SessionToken(self.0 + 1)
    }
}

/// Natural pixel size of a decoded image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Height when scaled to `column_width`, keeping the aspect ratio
    pub fn height_at(&self, column_width: f32) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        self.height as f32 * (column_width / self.width as f32)
    }
}

/// Resolved image sizes by pin id
///
/// Filled once per pin, the first time its image decodes. Only a full
/// reset clears it.
#[derive(Debug, Clone, Default)]
pub struct HeightCache {
    sizes: HashMap<String, ImageSize>,
}

impl HeightCache {
    /// Record a decoded size. Returns false if the pin was already resolved.
    pub fn insert(&mut self, pin_id: &str, size: ImageSize) -> bool {
        if self.sizes.contains_key(pin_id) {
            return false;
        }
        self.sizes.insert(pin_id.to_string(), size);
        true
    }

    pub fn get(&self, pin_id: &str) -> Option<ImageSize> {
        self.sizes.get(pin_id).copied()
    }

    /// Display height of a resolved pin at the given column width
    pub fn display_height(&self, pin_id: &str, column_width: f32) -> Option<f32> {
        self.get(pin_id).map(|size| size.height_at(column_width))
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

/// One sort key's worth of pagination and image state
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub sort: SortKey,
    pub pins: PinCollection,
    pub heights: HeightCache,
    /// Pins whose image load has been started
    requested_images: HashSet<String>,
    /// Pins whose image failed to load; they keep the estimate for good
    failed_images: HashSet<String>,
}

impl Session {
    pub fn new(token: SessionToken, sort: SortKey) -> Self {
        Self {
            token,
            sort,
            pins: PinCollection::new(),
            heights: HeightCache::default(),
            requested_images: HashSet::new(),
            failed_images: HashSet::new(),
        }
    }

    /// Start a fresh session under a new key, invalidating this token
    pub fn successor(&self, sort: SortKey) -> Self {
        Self::new(self.token.next(), sort)
    }

    /// Mark an image as requested. Returns false if it was already requested.
    pub fn claim_image(&mut self, pin_id: &str) -> bool {
        self.requested_images.insert(pin_id.to_string())
    }

    pub fn mark_image_failed(&mut self, pin_id: &str) {
        self.failed_images.insert(pin_id.to_string());
    }

    pub fn image_failed(&self, pin_id: &str) -> bool {
        self.failed_images.contains(pin_id)
    }
}
