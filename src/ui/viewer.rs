/// Full-screen viewer overlay
use chrono::DateTime;
use iced::widget::image::Handle;
use iced::widget::{button, center, column, container, image, opaque, row, text, Space};
use iced::{Alignment, Color, ContentFit, Element, Length, Theme};
use std::collections::HashMap;

use crate::gallery::Gallery;
use crate::state::Pin;
use crate::Message;

/// Archive date of a pin, if known
fn archived_on(pin: &Pin) -> Option<String> {
    let timestamp = pin.source_date?;
    DateTime::from_timestamp(timestamp, 0).map(|date| date.format("%Y-%m-%d").to_string())
}

/// The overlay, or `None` while the viewer is closed
pub fn view<'a>(gallery: &'a Gallery, images: &'a HashMap<String, Handle>) -> Option<Element<'a, Message>> {
    let (pin, position, total) = gallery.viewer_pin()?;
    let carousel = gallery.carousel();

    let picture: Element<'a, Message> = match images.get(&pin.pin_id) {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        None if gallery.session().image_failed(&pin.pin_id) => center(text("Image unavailable")).into(),
        None => center(text("Loading…")).into(),
    };

    let can_go_back = position > 1;
    let can_go_on = position < gallery.session().pins.len() || gallery.session().pins.has_more();

    let prev = button(text("‹").size(40))
        .style(button::text)
        .on_press_maybe(can_go_back.then_some(Message::Prev));
    let next_label = if carousel.is_waiting() { "…" } else { "›" };
    let next = button(text(next_label).size(40))
        .style(button::text)
        .on_press_maybe(can_go_on.then_some(Message::Next));

    let mut details = column![text(pin.pinterest_url.as_str()).size(14)].spacing(4);
    if let Some(date) = archived_on(pin) {
        details = details.push(text(format!("Archived {}", date)).size(12));
    }
    if let Some(original) = &pin.original_url {
        details = details.push(text(original.as_str()).size(12));
    }

    let header = row![
        text(format!("{} / {}", position, total)).size(16),
        Space::with_width(Length::Fill),
        button(text("Delete").size(14))
            .style(button::danger)
            .on_press_maybe(
                (!gallery.is_deleting(&pin.pin_id)).then(|| Message::DeletePin(pin.pin_id.clone()))
            ),
        button(text("Close").size(14))
            .style(button::secondary)
            .on_press(Message::CloseViewer),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let body = row![prev, picture, next]
        .spacing(12)
        .align_y(Alignment::Center)
        .height(Length::Fill);

    let overlay = container(column![header, body, details].spacing(12).padding(24))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.92).into()),
            text_color: Some(Color::WHITE),
            ..container::Style::default()
        });

    Some(opaque(overlay))
}
