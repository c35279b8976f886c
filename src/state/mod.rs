/// State management module
///
/// This module holds the data the engine works on:
/// - Pins and the paginated collection (data.rs)
/// - The per-sort session context and height cache (session.rs)

pub mod data;
pub mod session;

pub use data::{Pin, PinCollection, SortKey};
pub use session::{HeightCache, ImageSize, Session, SessionToken};
