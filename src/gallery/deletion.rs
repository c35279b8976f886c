/// Pin deletion
///
/// The server is asked first; only a confirmed removal touches local state.
/// A failed removal leaves everything exactly as it was.

use std::collections::HashSet;

use crate::api::DeleteResponse;
use crate::error::ViewerError;
use crate::layout::MasonryLayout;
use crate::state::{Session, SessionToken};

/// A removal in flight
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTicket {
    pub session: SessionToken,
    pub pin_id: String,
    pub delete_file: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// Removed from the collection at this index
    Removed { index: usize },
    /// Server refused; nothing changed locally
    Failed(ViewerError),
    /// Confirmed, but the pin is no longer in the current collection
    Stale,
}

#[derive(Debug, Clone)]
pub struct DeletionController {
    delete_files: bool,
    pending: HashSet<String>,
}

impl DeletionController {
    pub fn new(delete_files: bool) -> Self {
        Self {
            delete_files,
            pending: HashSet::new(),
        }
    }

    pub fn is_pending(&self, pin_id: &str) -> bool {
        self.pending.contains(pin_id)
    }

    /// Start deleting a loaded pin. `None` if unknown or already underway.
    pub fn request(&mut self, session: &Session, pin_id: &str) -> Option<DeleteTicket> {
        session.pins.index_of(pin_id)?;
        if !self.pending.insert(pin_id.to_string()) {
            return None;
        }
        log::info!("🗑️  Deleting pin {}", pin_id);
        Some(DeleteTicket {
            session: session.token,
            pin_id: pin_id.to_string(),
            delete_file: self.delete_files,
        })
    }

    /// Apply the server's answer
    pub fn complete(
        &mut self,
        session: &mut Session,
        layout: &mut MasonryLayout,
        ticket: &DeleteTicket,
        result: Result<DeleteResponse, ViewerError>,
    ) -> DeleteOutcome {
        if ticket.session != session.token {
            log::debug!("Dropping delete result for ended session {:?}", ticket.session);
            return DeleteOutcome::Stale;
        }
        self.pending.remove(&ticket.pin_id);

        match result {
            Ok(response) => {
                let Some((index, _)) = session.pins.remove(&ticket.pin_id) else {
                    return DeleteOutcome::Stale;
                };
                layout.remove(index, &session.pins, &session.heights);
                log::info!(
                    "✅ Pin {} deleted (file removed: {}), {} left",
                    ticket.pin_id,
                    response.file_deleted,
                    session.pins.total()
                );
                DeleteOutcome::Removed { index }
            }
            Err(error) => {
                log::warn!("⚠️  Could not delete pin {}: {}", ticket.pin_id, error);
                DeleteOutcome::Failed(error)
            }
        }
    }

    /// Forget pending removals of an ended session
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
