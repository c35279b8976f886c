/// The gallery engine
///
/// Owns the session and every controller that works on it:
/// - `pagination` - page requests, single-flight per trigger source
/// - `carousel` - full-screen viewer position
/// - `deletion` - confirmed removals
/// - `sort` - active ordering key
///
/// The engine never does I/O itself. Host events go in through the methods
/// below; asynchronous work comes out as `Request`s carrying the session
/// token they were issued under, and their results come back through the
/// matching `apply_*` method.

pub mod carousel;
pub mod deletion;
pub mod pagination;
pub mod sort;

use crate::api::{DeleteResponse, PinsPage};
use crate::config::AppConfig;
use crate::error::ViewerError;
use crate::layout::MasonryLayout;
use crate::signals::SentinelProbe;
use crate::state::{ImageSize, Pin, Session, SessionToken, SortKey};

use self::carousel::{CarouselController, Step};
use self::deletion::{DeleteOutcome, DeleteTicket, DeletionController};
use self::pagination::{BatchOutcome, BatchRequest, FetchTicket, PaginationCoordinator, TriggerSource};
use self::sort::SortController;

/// An image load in flight
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTicket {
    pub session: SessionToken,
    pub pin_id: String,
    pub image_url: String,
}

/// Asynchronous work the host should start
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Fetch(FetchTicket),
    LoadImage(ImageTicket),
    Delete(DeleteTicket),
}

/// What an engine call asks the host to do
#[derive(Debug, Default)]
pub struct Effects {
    pub requests: Vec<Request>,
    /// Pins that just got a card, in placement order
    pub placed: Vec<String>,
}

impl Effects {
    fn push(&mut self, request: Option<Request>) {
        self.requests.extend(request);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// Height recorded; `relaid` tells whether the grid moved
    Resolved { relaid: bool },
    /// Card keeps its estimated height
    Failed,
    Stale,
}

#[derive(Debug)]
pub struct Gallery {
    session: Session,
    layout: MasonryLayout,
    pagination: PaginationCoordinator,
    carousel: CarouselController,
    deletion: DeletionController,
    sort: SortController,
    sentinel: SentinelProbe,
    scroll_top: f32,
    viewport_height: f32,
    last_error: Option<ViewerError>,
}

impl Gallery {
    pub fn new(config: &AppConfig, container_width: f32, viewport_height: f32) -> Self {
        let sort = SortKey::default();
        Self {
            session: Session::new(SessionToken::first(), sort),
            layout: MasonryLayout::new(config.layout, container_width),
            pagination: PaginationCoordinator::new(config.batch_size),
            carousel: CarouselController::new(config.prefetch_distance),
            deletion: DeletionController::new(config.delete_image_files),
            sort: SortController::new(sort),
            sentinel: SentinelProbe::new(config.sentinel_margin),
            scroll_top: 0.0,
            viewport_height,
            last_error: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn layout(&self) -> &MasonryLayout {
        &self.layout
    }

    pub fn carousel(&self) -> &CarouselController {
        &self.carousel
    }

    pub fn sort(&self) -> SortKey {
        self.sort.active()
    }

    /// Last pagination failure, cleared by the next successful page
    pub fn last_error(&self) -> Option<&ViewerError> {
        self.last_error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pagination.is_in_flight(TriggerSource::Grid)
            || self.pagination.is_in_flight(TriggerSource::Carousel)
    }

    pub fn is_deleting(&self, pin_id: &str) -> bool {
        self.deletion.is_pending(pin_id)
    }

    /// Pin shown in the viewer, with its 1-based position and the total
    pub fn viewer_pin(&self) -> Option<(&Pin, usize, usize)> {
        if !self.carousel.is_open() {
            return None;
        }
        let index = self.carousel.view_index();
        let pin = self.session.pins.get(index)?;
        Some((pin, index + 1, self.session.pins.total()))
    }

    /// Kick off the first page of the session
    pub fn start(&mut self) -> Effects {
        let mut effects = Effects::default();
        effects.push(self.fetch(TriggerSource::Grid));
        effects
    }

    fn fetch(&mut self, source: TriggerSource) -> Option<Request> {
        match self.pagination.request_next_batch(&self.session, source) {
            BatchRequest::Issued(ticket) => Some(Request::Fetch(ticket)),
            BatchRequest::Joined | BatchRequest::Busy | BatchRequest::Exhausted => None,
        }
    }

    fn image_request(&mut self, index: usize) -> Option<Request> {
        let pin = self.session.pins.get(index)?;
        let (pin_id, image_url) = (pin.pin_id.clone(), pin.image_url.clone());
        if !self.session.claim_image(&pin_id) {
            return None;
        }
        Some(Request::LoadImage(ImageTicket {
            session: self.session.token,
            pin_id,
            image_url,
        }))
    }

    /// Content changed under a still viewport: re-check the sentinel.
    /// A failed page is only retried from `on_scroll`.
    fn pump_grid(&mut self, effects: &mut Effects) {
        self.sentinel
            .observe(self.scroll_top, self.viewport_height, self.layout.content_height());
        if self.sentinel.is_visible() && self.last_error.is_none() {
            effects.push(self.fetch(TriggerSource::Grid));
        }
    }

    /// The grid scrolled
    pub fn on_scroll(&mut self, scroll_top: f32, viewport_height: f32) -> Effects {
        self.scroll_top = scroll_top;
        self.viewport_height = viewport_height;

        let mut effects = Effects::default();
        let entered = self
            .sentinel
            .observe(scroll_top, viewport_height, self.layout.content_height());
        // After a failure, any scroll near the bottom retries
        if entered || (self.sentinel.is_visible() && self.last_error.is_some()) {
            effects.push(self.fetch(TriggerSource::Grid));
        }
        effects
    }

    /// The window settled on a new size
    pub fn on_resize(&mut self, container_width: f32, viewport_height: f32) -> Effects {
        self.viewport_height = viewport_height;
        self.layout
            .resize(container_width, &self.session.pins, &self.session.heights);

        let mut effects = Effects::default();
        self.pump_grid(&mut effects);
        effects
    }

    /// A page came back
    pub fn apply_batch(&mut self, ticket: &FetchTicket, result: Result<PinsPage, ViewerError>) -> Effects {
        let mut effects = Effects::default();

        match self.pagination.complete(&mut self.session, ticket, result) {
            BatchOutcome::Stale => {}
            BatchOutcome::Appended { appended, released } => {
                self.last_error = None;
                let placed = self.layout.append(&self.session.pins, &self.session.heights);
                log::debug!("Placed {} of {} new pins", placed.len(), appended);

                if released.contains(&TriggerSource::Carousel) {
                    self.carousel.page_landed(&self.session.pins);
                }
                self.viewer_settled(&mut effects);

                for index in placed {
                    if let Some(pin) = self.session.pins.get(index) {
                        effects.placed.push(pin.pin_id.clone());
                    }
                    let request = self.image_request(index);
                    effects.push(request);
                }
                self.pump_grid(&mut effects);
            }
            BatchOutcome::Failed { error, released } => {
                if released.contains(&TriggerSource::Carousel) {
                    self.carousel.page_failed();
                }
                self.last_error = Some(error);
            }
            BatchOutcome::Superseded { released } => {
                if released.contains(&TriggerSource::Carousel) && self.carousel.is_waiting() {
                    effects.push(self.fetch(TriggerSource::Carousel));
                }
                self.pump_grid(&mut effects);
            }
        }

        effects
    }

    /// An image finished loading (or failed to)
    pub fn apply_image(&mut self, ticket: &ImageTicket, result: Result<ImageSize, ViewerError>) -> (ImageOutcome, Effects) {
        let mut effects = Effects::default();
        if ticket.session != self.session.token || self.session.pins.index_of(&ticket.pin_id).is_none() {
            return (ImageOutcome::Stale, effects);
        }

        match result {
            Ok(size) => {
                self.session.heights.insert(&ticket.pin_id, size);
                let relaid = self
                    .layout
                    .correct(&ticket.pin_id, &self.session.pins, &self.session.heights);
                if relaid {
                    self.pump_grid(&mut effects);
                }
                (ImageOutcome::Resolved { relaid }, effects)
            }
            Err(error) => {
                log::warn!("⚠️  Image for pin {} unavailable: {}", ticket.pin_id, error);
                self.session.mark_image_failed(&ticket.pin_id);
                (ImageOutcome::Failed, effects)
            }
        }
    }

    /// Viewer position changed or data arrived under it: warm up images and
    /// fetch ahead when close to the tail
    fn viewer_settled(&mut self, effects: &mut Effects) {
        if !self.carousel.is_open() {
            return;
        }
        let current = self.image_request(self.carousel.view_index());
        effects.push(current);
        if let Some(next) = self.carousel.read_ahead(&self.session.pins) {
            let request = self.image_request(next);
            effects.push(request);
        }
        if self.carousel.should_prefetch(&self.session.pins) {
            effects.push(self.fetch(TriggerSource::Carousel));
        }
    }

    pub fn open_viewer(&mut self, index: usize) -> Effects {
        let mut effects = Effects::default();
        if self.carousel.open(index, &self.session.pins) {
            self.viewer_settled(&mut effects);
        }
        effects
    }

    pub fn open_pin(&mut self, pin_id: &str) -> Effects {
        match self.session.pins.index_of(pin_id) {
            Some(index) => self.open_viewer(index),
            None => Effects::default(),
        }
    }

    pub fn viewer_next(&mut self) -> Effects {
        let mut effects = Effects::default();
        match self.carousel.next(&self.session.pins) {
            Step::Moved(_) => self.viewer_settled(&mut effects),
            Step::Waiting => effects.push(self.fetch(TriggerSource::Carousel)),
            Step::Stay => {}
        }
        effects
    }

    pub fn viewer_prev(&mut self) -> Effects {
        let mut effects = Effects::default();
        if self.carousel.prev() {
            self.viewer_settled(&mut effects);
        }
        effects
    }

    pub fn close_viewer(&mut self) {
        self.carousel.close();
    }

    /// Ask the server to delete a pin
    pub fn request_delete(&mut self, pin_id: &str) -> Option<Request> {
        self.deletion
            .request(&self.session, pin_id)
            .map(Request::Delete)
    }

    /// The server answered a deletion
    pub fn apply_delete(
        &mut self,
        ticket: &DeleteTicket,
        result: Result<DeleteResponse, ViewerError>,
    ) -> (DeleteOutcome, Effects) {
        let mut effects = Effects::default();
        let outcome = self
            .deletion
            .complete(&mut self.session, &mut self.layout, ticket, result);

        if let DeleteOutcome::Removed { index } = outcome {
            self.carousel.pin_removed(index, &self.session.pins);
            self.viewer_settled(&mut effects);
            self.pump_grid(&mut effects);
        }
        (outcome, effects)
    }

    /// Switch ordering. Everything from the old session is dropped and the
    /// first page under the new key is requested right away.
    pub fn change_sort(&mut self, key: SortKey) -> Effects {
        if !self.sort.change(key) {
            return Effects::default();
        }

        self.session = self.session.successor(key);
        self.pagination.force_clear();
        self.deletion.clear();
        self.carousel.reset();
        self.sentinel.reset();
        self.layout.reset();
        self.layout.relayout(&self.session.pins, &self.session.heights);
        self.scroll_top = 0.0;
        self.last_error = None;

        log::info!("Session {:?} started ({})", self.session.token, key.as_str());
        self.start()
    }
}
