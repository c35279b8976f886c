/// Wire types of the archive server
use serde::Deserialize;

use crate::state::Pin;

/// One page from `GET /api/pins`
///
/// The server also echoes `offset`, `limit` and `sort`; those are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PinsPage {
    pub pins: Vec<Pin>,
    pub total: usize,
    pub has_more: bool,
}

/// Response of `DELETE /api/pins/{pin_id}`
///
/// `status` and `message` are informational and ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DeleteResponse {
    #[serde(default)]
    pub file_deleted: bool,
}

/// FastAPI error body (`{"detail": "..."}`)
#[derive(Deserialize, Debug)]
pub(crate) struct ErrorBody {
    pub detail: String,
}
