//! Sidebar listing the configured boards with how much each one holds.

use iced::widget::{button, column, scrollable, text, Column};
use iced::{theme, Element, Length};

use crate::board::Board;

const TITLE_SIZE: u16 = 16;
const STATUS_SIZE: u16 = 11;

/// One line under a board's title. Only the shown board is listening, the
/// others keep the counts of their last snapshot.
pub fn board_status(board: &Board) -> String {
    let count = board.feed().len();
    let noun = if count == 1 { "message" } else { "messages" };

    if !board.feed().is_live() {
        return format!("{count} {noun}, paused");
    }
    match board.total_pages() {
        0 | 1 => format!("{count} {noun}"),
        pages => format!("{count} {noun} on {pages} pages"),
    }
}

/// Emits the index of the board that was clicked.
pub fn board_list<'a>(
    boards: impl IntoIterator<Item = &'a Board>,
    selected: usize,
) -> Element<'a, usize> {
    let entries = boards.into_iter().enumerate().map(|(i, board)| {
        let style = if i == selected {
            theme::Button::Primary
        } else {
            theme::Button::Text
        };

        let label = column![
            text(&board.config().title).size(TITLE_SIZE),
            text(board_status(board)).size(STATUS_SIZE),
        ]
        .spacing(2);

        Element::from({
            button(label)
                .on_press(i)
                .style(style)
                .width(Length::Fill)
                .padding([6, 10])
        })
    });

    scrollable(Column::with_children(entries).spacing(6).width(Length::Fill))
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use docstorecl::client::listener::on_snapshot;
    use docstorecl::client::memory::MemoryStore;
    use docstorecl::model::{Record, RecordId, Snapshot};

    use super::*;
    use crate::config::{BoardConfig, Config};

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record {
                id: RecordId::new(format!("r{i}")),
                text: format!("message {i}"),
                created_at: None,
            })
            .collect()
    }

    #[test]
    fn test_board_status() {
        let store = MemoryStore::new();
        let config = BoardConfig {
            page_size: NonZeroUsize::new(2).unwrap(),
            ..Config::default().boards.remove(0)
        };
        let mut board = Board::new(config);
        assert_eq!(board_status(&board), "0 messages, paused");

        let (registration, _listening) =
            on_snapshot(&store, &board.query(), &board.config().fields, |_, _| {});
        board.mount(registration.id());
        assert_eq!(board_status(&board), "0 messages");

        board.apply_snapshot(registration.id(), Snapshot::new(records(1), None));
        assert_eq!(board_status(&board), "1 message");

        board.apply_snapshot(registration.id(), Snapshot::new(records(5), None));
        assert_eq!(board_status(&board), "5 messages on 3 pages");

        board.unmount();
        assert_eq!(board_status(&board), "5 messages, paused");
    }
}
