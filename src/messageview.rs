use docstorecl::model::Record;
use iced::widget::{column, container, text, Column};
use iced::{theme, Color, Element, Length};

use crate::board::format_timestamp;

const TIMESTAMP_SIZE: u16 = 12;

/// A widget that shows one message and when it was sent.
pub struct RecordWidget<'a> {
    record: &'a Record,
}

impl<'a> RecordWidget<'a> {
    pub fn new(record: &'a Record) -> Self {
        Self { record }
    }
}

impl<'a, Message: 'a> From<RecordWidget<'a>> for Element<'a, Message> {
    fn from(rw: RecordWidget<'a>) -> Self {
        container({
            column![
                text(&rw.record.text).shaping(text::Shaping::Advanced),
                text(format_timestamp(rw.record.created_at))
                    .size(TIMESTAMP_SIZE)
                    .style(theme::Text::Color(Color::from_rgba8(0xff, 0xff, 0xff, 0.5))),
            ]
            .spacing(8)
            .width(Length::Fill)
        })
        .padding(16)
        .width(Length::Fill)
        .style(theme::Container::Box)
        .into()
    }
}

/// The records of the current page, in feed order.
pub fn record_list<'a, Message: 'a>(records: &'a [Record]) -> Element<'a, Message> {
    if records.is_empty() {
        return container(text("No messages yet").style(theme::Text::Color(Color::from_rgba8(
            0xff, 0xff, 0xff, 0.5,
        ))))
        .width(Length::Fill)
        .center_x()
        .into();
    }

    Column::with_children(records.iter().map(|record| RecordWidget::new(record).into()))
        .spacing(16)
        .width(Length::Fill)
        .into()
}
