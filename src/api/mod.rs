/// Archive server API
///
/// - `client` - reqwest client for pages, deletion and image bytes
/// - `types` - JSON wire types

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{DeleteResponse, PinsPage};
