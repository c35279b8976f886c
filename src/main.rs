use env_logger::{Builder, Target};
use iced::keyboard::{self, key::Named, Key};
use iced::widget::image::Handle;
use iced::widget::{column, scrollable, stack};
use iced::{event, window, Element, Size, Subscription, Task, Theme};
use log::LevelFilter;
use rfd::{AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};
use std::collections::HashMap;
use std::time::{Duration, Instant};

mod api;
mod config;
mod error;
mod gallery;
mod images;
mod layout;
mod signals;
mod state;
mod ui;

use api::{ApiClient, DeleteResponse, PinsPage};
use config::AppConfig;
use error::ViewerError;
use gallery::deletion::{DeleteOutcome, DeleteTicket};
use gallery::pagination::FetchTicket;
use gallery::{Effects, Gallery, ImageOutcome, ImageTicket, Request};
use images::LoadedImage;
use signals::{DebounceTicket, Debouncer};
use state::SortKey;
use ui::FadeSchedule;

/// Window size before the first resize event arrives
const INITIAL_WINDOW: Size = Size::new(1280.0, 860.0);

/// Main application state
struct PinViewer {
    api: ApiClient,
    /// Layout, pagination and viewer engine
    gallery: Gallery,
    /// Decoded images of the current session, by pin id
    images: HashMap<String, Handle>,
    fades: FadeSchedule,
    resize: Debouncer<Size>,
    scroll_id: scrollable::Id,
    /// Status message to display to the user
    status: String,
    /// Frame clock for fade-in
    now: Instant,
    /// Decoded images are shrunk to this longest edge
    max_image_edge: u32,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// Raw resize event, debounced before it reaches the layout
    WindowResized(Size),
    ResizeSettled(DebounceTicket),
    Scrolled(scrollable::Viewport),
    PageLoaded(FetchTicket, Result<PinsPage, ViewerError>),
    ImageLoaded(ImageTicket, Result<LoadedImage, ViewerError>),
    SortChanged(SortKey),
    OpenPin(String),
    CloseViewer,
    Next,
    Prev,
    /// User clicked a delete affordance; confirmation pending
    DeletePin(String),
    DeleteConfirmed(String, bool),
    Deleted(DeleteTicket, Result<DeleteResponse, ViewerError>),
    AlertClosed,
    Tick(Instant),
}

impl PinViewer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();

        let api = ApiClient::new(&config).unwrap_or_else(|e| {
            log::error!("❌ {}; falling back to the default server", e);
            // The app cannot do anything without an HTTP client
            ApiClient::new(&AppConfig::default()).expect("Failed to create HTTP client")
        });

        let mut gallery = Gallery::new(
            &config,
            ui::grid_width(INITIAL_WINDOW.width),
            ui::grid_viewport_height(INITIAL_WINDOW.height),
        );
        let effects = gallery.start();

        let mut viewer = PinViewer {
            api,
            gallery,
            images: HashMap::new(),
            fades: FadeSchedule::new(
                Duration::from_millis(config.stagger_ms),
                Duration::from_millis(config.fade_ms),
            ),
            resize: Debouncer::new(config.resize_debounce()),
            scroll_id: scrollable::Id::unique(),
            status: "Connecting…".to_string(),
            now: Instant::now(),
            max_image_edge: config.max_image_edge,
        };

        log::info!("🎨 Pin viewer started");

        let measure = window::get_latest()
            .and_then(window::get_size)
            .map(Message::WindowResized);
        let startup = viewer.run(effects);

        (viewer, Task::batch([measure, startup]))
    }

    /// Turn engine effects into running tasks
    fn run(&mut self, effects: Effects) -> Task<Message> {
        if !effects.placed.is_empty() {
            self.now = Instant::now();
            self.fades.schedule(&effects.placed, self.now);
        }
        Task::batch(effects.requests.into_iter().map(|request| self.perform(request)))
    }

    fn perform(&self, request: Request) -> Task<Message> {
        let api = self.api.clone();
        let max_edge = self.max_image_edge;
        match request {
            Request::Fetch(ticket) => Task::perform(
                async move {
                    let result = api.fetch_pins(ticket.offset, ticket.limit, ticket.sort).await;
                    (ticket, result)
                },
                |(ticket, result)| Message::PageLoaded(ticket, result),
            ),
            Request::LoadImage(ticket) => Task::perform(
                async move {
                    let result = images::load_image(api, ticket.image_url.clone(), max_edge).await;
                    (ticket, result)
                },
                |(ticket, result)| Message::ImageLoaded(ticket, result),
            ),
            Request::Delete(ticket) => Task::perform(
                async move {
                    let result = api.delete_pin(&ticket.pin_id, ticket.delete_file).await;
                    (ticket, result)
                },
                |(ticket, result)| Message::Deleted(ticket, result),
            ),
        }
    }

    fn refresh_status(&mut self) {
        self.status = match self.gallery.last_error() {
            Some(error) => error.summary(),
            None => String::new(),
        };
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::WindowResized(size) => {
                let ticket = self.resize.push(size);
                let window = self.resize.window();
                Task::perform(tokio::time::sleep(window), move |_| {
                    Message::ResizeSettled(ticket)
                })
            }
            Message::ResizeSettled(ticket) => match self.resize.settle(ticket) {
                Some(size) => {
                    let effects = self.gallery.on_resize(
                        ui::grid_width(size.width),
                        ui::grid_viewport_height(size.height),
                    );
                    self.run(effects)
                }
                None => Task::none(),
            },
            Message::Scrolled(viewport) => {
                let effects = self
                    .gallery
                    .on_scroll(viewport.absolute_offset().y, viewport.bounds().height);
                self.run(effects)
            }
            Message::PageLoaded(ticket, result) => {
                let effects = self.gallery.apply_batch(&ticket, result);
                self.refresh_status();
                self.run(effects)
            }
            Message::ImageLoaded(ticket, result) => {
                let (handle, result) = match result {
                    Ok(loaded) => (Some(loaded.handle), Ok(loaded.size)),
                    Err(e) => (None, Err(e)),
                };
                let (outcome, effects) = self.gallery.apply_image(&ticket, result);
                if let (ImageOutcome::Resolved { .. }, Some(handle)) = (outcome, handle) {
                    self.images.insert(ticket.pin_id, handle);
                }
                self.run(effects)
            }
            Message::SortChanged(key) => {
                let token = self.gallery.session().token;
                let effects = self.gallery.change_sort(key);
                if self.gallery.session().token == token {
                    return Task::none();
                }

                self.images.clear();
                self.fades.clear();
                self.refresh_status();
                let to_top = scrollable::scroll_to(
                    self.scroll_id.clone(),
                    scrollable::AbsoluteOffset { x: 0.0, y: 0.0 },
                );
                Task::batch([to_top, self.run(effects)])
            }
            Message::OpenPin(pin_id) => {
                let effects = self.gallery.open_pin(&pin_id);
                self.run(effects)
            }
            Message::CloseViewer => {
                self.gallery.close_viewer();
                Task::none()
            }
            Message::Next => {
                let effects = self.gallery.viewer_next();
                self.run(effects)
            }
            Message::Prev => {
                let effects = self.gallery.viewer_prev();
                self.run(effects)
            }
            Message::DeletePin(pin_id) => {
                if self.gallery.is_deleting(&pin_id) {
                    return Task::none();
                }
                Task::perform(confirm_delete(pin_id.clone()), move |confirmed| {
                    Message::DeleteConfirmed(pin_id.clone(), confirmed)
                })
            }
            Message::DeleteConfirmed(pin_id, confirmed) => {
                if !confirmed {
                    return Task::none();
                }
                match self.gallery.request_delete(&pin_id) {
                    Some(request) => self.perform(request),
                    None => Task::none(),
                }
            }
            Message::Deleted(ticket, result) => {
                let (outcome, effects) = self.gallery.apply_delete(&ticket, result);
                let followup = self.run(effects);
                match outcome {
                    DeleteOutcome::Removed { .. } => {
                        self.images.remove(&ticket.pin_id);
                        followup
                    }
                    DeleteOutcome::Failed(error) => Task::batch([
                        followup,
                        Task::perform(show_alert(ticket.pin_id, error), |_| Message::AlertClosed),
                    ]),
                    DeleteOutcome::Stale => followup,
                }
            }
            Message::AlertClosed => Task::none(),
            Message::Tick(now) => {
                self.now = now;
                self.fades.prune(now);
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let grid = column![
            ui::grid::toolbar(&self.gallery, &self.status),
            ui::grid::view(
                &self.gallery,
                &self.images,
                &self.fades,
                self.now,
                self.scroll_id.clone(),
            ),
        ];

        match ui::viewer::view(&self.gallery, &self.images) {
            Some(overlay) => stack![grid, overlay].into(),
            None => grid.into(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            window::resize_events().map(|(_id, size)| Message::WindowResized(size)),
            event::listen_with(|event, status, _id| {
                if status == event::Status::Captured {
                    return None;
                }
                let iced::Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) = event else {
                    return None;
                };
                on_key_press(key)
            }),
        ];

        if self.fades.is_animating(self.now) {
            subscriptions.push(window::frames().map(Message::Tick));
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Escape closes the viewer, arrows navigate it
fn on_key_press(key: Key) -> Option<Message> {
    match key.as_ref() {
        Key::Named(Named::Escape) => Some(Message::CloseViewer),
        Key::Named(Named::ArrowLeft) => Some(Message::Prev),
        Key::Named(Named::ArrowRight) => Some(Message::Next),
        _ => None,
    }
}

/// Ask before deleting; the stored image goes too when configured
async fn confirm_delete(pin_id: String) -> bool {
    let answer = AsyncMessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Delete pin")
        .set_description(format!("Remove pin {} from the archive?", pin_id))
        .set_buttons(MessageButtons::OkCancel)
        .show()
        .await;
    matches!(answer, MessageDialogResult::Ok | MessageDialogResult::Yes)
}

async fn show_alert(pin_id: String, error: ViewerError) {
    AsyncMessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Delete failed")
        .set_description(format!("Could not delete pin {}: {}", pin_id, error))
        .set_buttons(MessageButtons::Ok)
        .show()
        .await;
}

fn init_logger() {
    Builder::new()
        .target(Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("pin_viewer", LevelFilter::Debug)
        .init();
}

fn main() -> iced::Result {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    iced::application("Pin Archive", PinViewer::update, PinViewer::view)
        .subscription(PinViewer::subscription)
        .theme(PinViewer::theme)
        .window_size(INITIAL_WINDOW)
        .centered()
        .run_with(PinViewer::new)
}
