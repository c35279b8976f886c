/// Shared data structures for the viewer state
///
/// These structs represent the data model that flows between
/// the archive server and the layout engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a single archived pin
///
/// Pins are immutable once fetched. The collection only ever appends
/// or removes them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pin {
    /// Stable, unique pin identifier
    pub pin_id: String,
    /// Image location, usually server-relative (e.g., "/images/<file_id>.jpg")
    pub image_url: String,
    /// Link back to the pin on Pinterest
    pub pinterest_url: String,
    /// Unix timestamp of when the pin was archived
    #[serde(default)]
    pub source_date: Option<i64>,
    /// Upstream image address the archive downloaded from
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
}

/// Ordering requested from the server
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Random,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Newest, SortKey::Oldest, SortKey::Random];

    /// Value of the `sort` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::Random => "random",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortKey::Newest => "Newest",
            SortKey::Oldest => "Oldest",
            SortKey::Random => "Shuffle",
        };
        f.write_str(label)
    }
}

/// Ordered pins plus the pagination cursor
///
/// Invariants:
/// - `len() <= total()` at all times
/// - `offset() == len()` after every append and every removal
#[derive(Debug, Clone)]
pub struct PinCollection {
    pins: Vec<Pin>,
    offset: usize,
    total: usize,
    has_more: bool,
}

impl Default for PinCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl PinCollection {
    /// An empty collection that still expects data
    pub fn new() -> Self {
        Self {
            pins: Vec::new(),
            offset: 0,
            total: 0,
            has_more: true,
        }
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Count of items already received from the server
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Server-reported count of pins under the current sort
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn get(&self, index: usize) -> Option<&Pin> {
        self.pins.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pin> {
        self.pins.iter()
    }

    pub fn as_slice(&self) -> &[Pin] {
        &self.pins
    }

    /// Position of a pin in arrival order
    pub fn index_of(&self, pin_id: &str) -> Option<usize> {
        self.pins.iter().position(|pin| pin.pin_id == pin_id)
    }

    /// Append one page from the server.
    ///
    /// `requested` is the page size that was asked for; a shorter page means
    /// the server ran out even if it still claims `has_more`.
    /// Returns the number of pins appended.
    pub fn append_batch(
        &mut self,
        pins: Vec<Pin>,
        total: usize,
        has_more: bool,
        requested: usize,
    ) -> usize {
        let received = pins.len();
        self.pins.extend(pins);
        self.offset += received;

        if total < self.pins.len() {
            log::warn!(
                "⚠️  Server reported total={} but {} pins are loaded",
                total,
                self.pins.len()
            );
        }
        self.total = total.max(self.pins.len());
        self.has_more = has_more && received > 0 && received >= requested;

        received
    }

    /// Remove a pin by id, returning its former index and the pin
    pub fn remove(&mut self, pin_id: &str) -> Option<(usize, Pin)> {
        let index = self.index_of(pin_id)?;
        let pin = self.pins.remove(index);
        self.offset = self.offset.saturating_sub(1);
        self.total = self.total.saturating_sub(1);
        Some((index, pin))
    }
}

#[cfg(test)]
pub(crate) fn test_pins(prefix: &str, count: usize) -> Vec<Pin> {
    (0..count)
        .map(|i| Pin {
            pin_id: format!("{}{}", prefix, i),
            image_url: format!("/images/{}{}.jpg", prefix, i),
            pinterest_url: format!("https://pinterest.com/pin/{}{}/", prefix, i),
            source_date: Some(1_700_000_000 + i as i64),
            original_url: None,
            file_id: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_tracks_received_not_requested() {
        let mut pins = PinCollection::new();
        pins.append_batch(test_pins("a", 50), 120, true, 50);
        pins.append_batch(test_pins("b", 50), 120, true, 50);
        pins.append_batch(test_pins("c", 20), 120, false, 50);

        assert_eq!(pins.offset(), 120);
        assert_eq!(pins.len(), 120);
        assert!(!pins.has_more());
    }

    #[test]
    fn test_short_batch_ends_pagination() {
        let mut pins = PinCollection::new();
        // Server still claims more, but we got less than we asked for
        pins.append_batch(test_pins("a", 10), 500, true, 50);
        assert!(!pins.has_more());
    }

    #[test]
    fn test_total_never_below_len() {
        let mut pins = PinCollection::new();
        pins.append_batch(test_pins("a", 5), 3, false, 50);
        assert_eq!(pins.total(), 5);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut pins = PinCollection::new();
        pins.append_batch(test_pins("p", 5), 5, false, 50);

        let (index, removed) = pins.remove("p2").unwrap();

        assert_eq!(index, 2);
        assert_eq!(removed.pin_id, "p2");
        assert_eq!(pins.len(), 4);
        assert_eq!(pins.total(), 4);
        assert_eq!(pins.offset(), 4);
        let ids: Vec<_> = pins.iter().map(|p| p.pin_id.as_str()).collect();
        assert_eq!(ids, ["p0", "p1", "p3", "p4"]);

        assert!(pins.remove("missing").is_none());
        assert_eq!(pins.len(), 4);
    }

    #[test]
    fn test_pin_deserializes_server_record() {
        let json = r#"{
            "id": 7,
            "pin_id": "123",
            "file_id": "abcdef",
            "file_extension": "jpg",
            "pinterest_url": "https://pinterest.com/pin/123/",
            "original_url": "https://i.pinimg.com/originals/ab/cd/ef/abcdef.jpg",
            "source_date": null,
            "image_url": "/images/abcdef.jpg"
        }"#;
        let pin: Pin = serde_json::from_str(json).unwrap();

        assert_eq!(pin.pin_id, "123");
        assert_eq!(pin.image_url, "/images/abcdef.jpg");
        assert_eq!(pin.source_date, None);
        assert_eq!(pin.file_id.as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_sort_key_wire_names() {
        assert_eq!(serde_json::to_string(&SortKey::Random).unwrap(), "\"random\"");
        assert_eq!(SortKey::Oldest.as_str(), "oldest");
        assert_eq!(SortKey::default(), SortKey::Newest);
    }
}
