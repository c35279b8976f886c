/// The masonry grid
///
/// Cards are laid out by the engine; this view just stacks each column's
/// slots top to bottom with the same gap the engine assumed, so the on-screen
/// positions match the computed ones.
use iced::widget::image::Handle;
use iced::widget::{button, column, container, image, mouse_area, row, scrollable, stack, text, Column, Row, Space};
use iced::{Alignment, Border, ContentFit, Element, Length, Theme};
use std::collections::HashMap;
use std::time::Instant;

use super::{FadeSchedule, GRID_PADDING, TOOLBAR_HEIGHT};
use crate::gallery::Gallery;
use crate::layout::CardSlot;
use crate::state::SortKey;
use crate::Message;

/// Toolbar: title, counts, sort selector, status
pub fn toolbar<'a>(gallery: &Gallery, status: &'a str) -> Element<'a, Message> {
    let pins = &gallery.session().pins;

    let mut sorts = Row::new().spacing(6);
    for key in SortKey::ALL {
        let style: fn(&Theme, button::Status) -> button::Style = if key == gallery.sort() {
            button::primary
        } else {
            button::secondary
        };
        sorts = sorts.push(
            button(text(key.to_string()).size(14))
                .style(style)
                .padding([4, 12])
                .on_press(Message::SortChanged(key)),
        );
    }

    let counts = if pins.is_empty() && gallery.is_loading() {
        "Loading…".to_string()
    } else {
        format!("{} of {} pins", pins.len(), pins.total())
    };

    container(
        row![
            text("Pin Archive").size(22),
            text(counts).size(14),
            Space::with_width(Length::Fill),
            text(status).size(14),
            sorts,
        ]
        .spacing(16)
        .align_y(Alignment::Center),
    )
    .padding([0, GRID_PADDING as u16])
    .height(Length::Fixed(TOOLBAR_HEIGHT))
    .center_y(Length::Fixed(TOOLBAR_HEIGHT))
    .into()
}

/// Scale every color of a container style by the card's fade-in opacity
fn faded(style: container::Style, opacity: f32) -> container::Style {
    container::Style {
        background: style.background.map(|background| background.scale_alpha(opacity)),
        text_color: style.text_color.map(|color| color.scale_alpha(opacity)),
        border: Border {
            color: style.border.color.scale_alpha(opacity),
            ..style.border
        },
        ..style
    }
}

/// One card: the image (or its placeholder) with view and delete affordances
fn card<'a>(
    slot: &CardSlot,
    width: f32,
    handle: Option<&Handle>,
    opacity: f32,
    failed: bool,
    deleting: bool,
) -> Element<'a, Message> {
    let height = Length::Fixed(slot.height);

    let body: Element<'a, Message> = match handle {
        Some(handle) if slot.resolved => image(handle.clone())
            .width(Length::Fixed(width))
            .height(height)
            .content_fit(ContentFit::Cover)
            .opacity(opacity)
            .into(),
        _ => {
            let label = if failed { "Image unavailable" } else { "" };
            container(text(label).size(12))
                .width(Length::Fixed(width))
                .height(height)
                .center_x(Length::Fixed(width))
                .center_y(height)
                .style(move |theme: &Theme| faded(container::rounded_box(theme), opacity))
                .into()
        }
    };

    let delete = if deleting {
        button(text("…").size(12)).style(button::secondary)
    } else {
        button(text("✕").size(12))
            .style(button::danger)
            .on_press(Message::DeletePin(slot.pin_id.clone()))
    };

    stack![
        mouse_area(body).on_press(Message::OpenPin(slot.pin_id.clone())),
        container(delete.padding([2, 6]))
            .width(Length::Fixed(width))
            .align_right(Length::Fixed(width))
            .padding(6),
    ]
    .into()
}

/// Bottom sentinel: its visibility drives grid pagination
fn sentinel<'a>(gallery: &Gallery) -> Element<'a, Message> {
    let pins = &gallery.session().pins;
    let label = match gallery.last_error() {
        Some(error) => format!("{} (scroll to retry)", error.summary()),
        None if gallery.is_loading() => "Loading more…".to_string(),
        None if !pins.has_more() && pins.is_empty() => "The archive is empty".to_string(),
        None if !pins.has_more() => "End of archive".to_string(),
        None => String::new(),
    };

    container(text(label).size(14))
        .width(Length::Fill)
        .center_x(Length::Fill)
        .padding(24)
        .into()
}

/// The scrollable grid
pub fn view<'a>(
    gallery: &'a Gallery,
    images: &'a HashMap<String, Handle>,
    fades: &FadeSchedule,
    now: Instant,
    scroll_id: scrollable::Id,
) -> Element<'a, Message> {
    let layout = gallery.layout();
    let session = gallery.session();
    let width = layout.column_width();

    let mut columns = Row::new().spacing(layout.gap());
    for slots in layout.columns() {
        let mut lane = Column::new().spacing(layout.gap()).width(Length::Fixed(width));
        for index in slots {
            let slot = &layout.slots()[index];
            lane = lane.push(card(
                slot,
                width,
                images.get(&slot.pin_id),
                fades.opacity(&slot.pin_id, now),
                session.image_failed(&slot.pin_id),
                gallery.is_deleting(&slot.pin_id),
            ));
        }
        columns = columns.push(lane);
    }

    scrollable(
        column![columns, sentinel(gallery)]
            .padding(GRID_PADDING)
            .width(Length::Fill),
    )
    .id(scroll_id)
    .on_scroll(Message::Scrolled)
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}
