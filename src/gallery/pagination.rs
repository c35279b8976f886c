/// Pagination coordinator
///
/// Hands out fetch tickets for the next page and applies the pages that come
/// back. Two sources can ask for data: the grid's bottom sentinel and the
/// full-screen viewer. Each source has at most one request in flight, and
/// the two never fetch the same range twice: a source asking for a range the
/// other is already fetching joins that request instead.

use std::collections::HashMap;

use crate::api::PinsPage;
use crate::error::ViewerError;
use crate::state::{Session, SessionToken, SortKey};

/// Who asked for the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    Grid,
    Carousel,
}

/// A page request in flight
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub session: SessionToken,
    pub source: TriggerSource,
    pub offset: usize,
    pub limit: usize,
    pub sort: SortKey,
}

/// Answer to a page request
#[derive(Debug, Clone, PartialEq)]
pub enum BatchRequest {
    /// Go fetch this
    Issued(FetchTicket),
    /// Another source is already fetching this range; released with it
    Joined,
    /// This source already has a request in flight
    Busy,
    /// The server has nothing more
    Exhausted,
}

/// What happened to a page that came back
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Pins were appended (possibly zero)
    Appended {
        appended: usize,
        released: Vec<TriggerSource>,
    },
    /// Request failed; pagination state is unchanged
    Failed {
        error: ViewerError,
        released: Vec<TriggerSource>,
    },
    /// The collection moved past the requested offset (e.g. a deletion
    /// landed while the page was in flight); result dropped
    Superseded { released: Vec<TriggerSource> },
    /// Issued by a session that no longer exists; result dropped
    Stale,
}

#[derive(Debug, Clone)]
pub struct PaginationCoordinator {
    batch_size: usize,
    /// Offset each source is waiting on
    in_flight: HashMap<TriggerSource, usize>,
}

impl PaginationCoordinator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            in_flight: HashMap::new(),
        }
    }

    pub fn is_in_flight(&self, source: TriggerSource) -> bool {
        self.in_flight.contains_key(&source)
    }

    /// Ask for the page after the currently loaded tail
    pub fn request_next_batch(&mut self, session: &Session, source: TriggerSource) -> BatchRequest {
        if self.in_flight.contains_key(&source) {
            return BatchRequest::Busy;
        }
        if !session.pins.has_more() {
            return BatchRequest::Exhausted;
        }

        let offset = session.pins.offset();
        if self.in_flight.values().any(|&pending| pending == offset) {
            self.in_flight.insert(source, offset);
            log::debug!("{:?} joined the in-flight request at offset {}", source, offset);
            return BatchRequest::Joined;
        }

        self.in_flight.insert(source, offset);
        log::debug!(
            "{:?} requests {} pins at offset {} ({})",
            source,
            self.batch_size,
            offset,
            session.sort.as_str()
        );
        BatchRequest::Issued(FetchTicket {
            session: session.token,
            source,
            offset,
            limit: self.batch_size,
            sort: session.sort,
        })
    }

    /// Apply a page that came back for `ticket`
    pub fn complete(
        &mut self,
        session: &mut Session,
        ticket: &FetchTicket,
        result: Result<PinsPage, ViewerError>,
    ) -> BatchOutcome {
        if ticket.session != session.token {
            log::debug!("Dropping page for ended session {:?}", ticket.session);
            return BatchOutcome::Stale;
        }

        let released = self.release(ticket.offset);

        if ticket.offset != session.pins.offset() {
            log::debug!(
                "Dropping page at offset {}; collection is now at {}",
                ticket.offset,
                session.pins.offset()
            );
            return BatchOutcome::Superseded { released };
        }

        match result {
            Ok(page) => {
                let appended = session
                    .pins
                    .append_batch(page.pins, page.total, page.has_more, ticket.limit);
                log::info!(
                    "📥 Loaded {} pins ({} of {}, more: {})",
                    appended,
                    session.pins.len(),
                    session.pins.total(),
                    session.pins.has_more()
                );
                BatchOutcome::Appended { appended, released }
            }
            Err(error) => {
                log::warn!("⚠️  Page at offset {} failed: {}", ticket.offset, error);
                BatchOutcome::Failed { error, released }
            }
        }
    }

    /// Free every source waiting on `offset`
    fn release(&mut self, offset: usize) -> Vec<TriggerSource> {
        let mut released: Vec<_> = self
            .in_flight
            .iter()
            .filter(|(_, &pending)| pending == offset)
            .map(|(&source, _)| source)
            .collect();
        released.sort_by_key(|source| *source == TriggerSource::Carousel);
        self.in_flight.retain(|_, pending| *pending != offset);
        released
    }

    /// Forget all in-flight requests; their results will come back stale
    pub fn force_clear(&mut self) {
        self.in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::test_pins;

    fn session() -> Session {
        Session::new(SessionToken::first(), SortKey::Newest)
    }

    fn page(prefix: &str, count: usize, total: usize, has_more: bool) -> PinsPage {
        PinsPage {
            pins: test_pins(prefix, count),
            total,
            has_more,
        }
    }

    fn issued(request: BatchRequest) -> FetchTicket {
        match request {
            BatchRequest::Issued(ticket) => ticket,
            other => panic!("expected a ticket, got {:?}", other),
        }
    }

    #[test]
    fn test_single_flight_per_source() {
        let mut coordinator = PaginationCoordinator::new(50);
        let session = session();

        let ticket = issued(coordinator.request_next_batch(&session, TriggerSource::Grid));
        assert_eq!(ticket.offset, 0);
        assert_eq!(ticket.limit, 50);
        assert_eq!(
            coordinator.request_next_batch(&session, TriggerSource::Grid),
            BatchRequest::Busy
        );
    }

    #[test]
    fn test_second_source_joins_same_range() {
        let mut coordinator = PaginationCoordinator::new(50);
        let mut session = session();

        let ticket = issued(coordinator.request_next_batch(&session, TriggerSource::Grid));
        assert_eq!(
            coordinator.request_next_batch(&session, TriggerSource::Carousel),
            BatchRequest::Joined
        );

        let outcome = coordinator.complete(&mut session, &ticket, Ok(page("a", 50, 120, true)));
        assert_eq!(
            outcome,
            BatchOutcome::Appended {
                appended: 50,
                released: vec![TriggerSource::Grid, TriggerSource::Carousel],
            }
        );
        assert!(!coordinator.is_in_flight(TriggerSource::Carousel));
    }

    #[test]
    fn test_offset_is_sum_of_batch_sizes() {
        let mut coordinator = PaginationCoordinator::new(50);
        let mut session = session();

        for (prefix, count) in [("a", 50), ("b", 50), ("c", 7)] {
            let ticket = issued(coordinator.request_next_batch(&session, TriggerSource::Grid));
            coordinator.complete(&mut session, &ticket, Ok(page(prefix, count, 107, count == 50)));
        }

        assert_eq!(session.pins.offset(), 107);
        assert_eq!(
            coordinator.request_next_batch(&session, TriggerSource::Grid),
            BatchRequest::Exhausted
        );
    }

    #[test]
    fn test_failure_leaves_cursor_alone() {
        let mut coordinator = PaginationCoordinator::new(50);
        let mut session = session();

        let ticket = issued(coordinator.request_next_batch(&session, TriggerSource::Grid));
        let outcome = coordinator.complete(
            &mut session,
            &ticket,
            Err(ViewerError::Network("connection refused".to_string())),
        );

        assert!(matches!(outcome, BatchOutcome::Failed { .. }));
        assert_eq!(session.pins.offset(), 0);
        assert!(session.pins.has_more());
        // The flag is released so the next scroll can retry
        assert!(matches!(
            coordinator.request_next_batch(&session, TriggerSource::Grid),
            BatchRequest::Issued(_)
        ));
    }

    #[test]
    fn test_result_from_old_session_is_stale() {
        let mut coordinator = PaginationCoordinator::new(50);
        let old = session();
        let ticket = issued(coordinator.request_next_batch(&old, TriggerSource::Grid));

        coordinator.force_clear();
        let mut fresh = old.successor(SortKey::Random);
        let fresh_ticket = issued(coordinator.request_next_batch(&fresh, TriggerSource::Grid));

        let outcome = coordinator.complete(&mut fresh, &ticket, Ok(page("old", 50, 120, true)));
        assert_eq!(outcome, BatchOutcome::Stale);
        assert_eq!(fresh.pins.len(), 0);
        // The fresh request is still tracked
        assert!(coordinator.is_in_flight(TriggerSource::Grid));

        coordinator.complete(&mut fresh, &fresh_ticket, Ok(page("new", 50, 120, true)));
        assert_eq!(fresh.pins.len(), 50);
    }

    #[test]
    fn test_moved_offset_supersedes_page() {
        let mut coordinator = PaginationCoordinator::new(2);
        let mut session = session();
        session.pins.append_batch(test_pins("a", 2), 10, true, 2);

        let ticket = issued(coordinator.request_next_batch(&session, TriggerSource::Grid));
        session.pins.remove("a0");

        let outcome = coordinator.complete(&mut session, &ticket, Ok(page("b", 2, 9, true)));
        assert_eq!(
            outcome,
            BatchOutcome::Superseded {
                released: vec![TriggerSource::Grid]
            }
        );
        assert_eq!(session.pins.len(), 1);
    }
}
