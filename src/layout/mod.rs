/// Grid layout module
///
/// - `masonry` - column geometry and shortest-column placement

pub mod masonry;

pub use masonry::{CardSlot, MasonryLayout};
