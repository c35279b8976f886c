/// Active ordering key
///
/// Changing the key is a hard barrier: the gallery throws its session away
/// and starts over.
use crate::state::SortKey;

#[derive(Debug, Clone, Default)]
pub struct SortController {
    active: SortKey,
}

impl SortController {
    pub fn new(active: SortKey) -> Self {
        Self { active }
    }

    pub fn active(&self) -> SortKey {
        self.active
    }

    /// Switch to `key`. Returns false when it already is the active key.
    pub fn change(&mut self, key: SortKey) -> bool {
        if key == self.active {
            return false;
        }
        log::info!("🔀 Sort changed: {} -> {}", self.active.as_str(), key.as_str());
        self.active = key;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_is_noop() {
        let mut sort = SortController::default();
        assert!(!sort.change(SortKey::Newest));
        assert!(sort.change(SortKey::Random));
        assert_eq!(sort.active(), SortKey::Random);
    }
}
