use std::sync::Arc;

use docstorecl::client::Client;
use docstorecl::model::RecordId;
use iced::font::Weight;
use iced::widget::{button, column, container, scrollable, text, text_editor, Row};
use iced::{theme, Alignment, Command, Element, Font, Length, Subscription, Theme};
use iced_aw::floating_element::Anchor;
use iced_aw::FloatingElement;

use crate::board::{AckToken, Board, ACK_DURATION};
use crate::config::{BoardConfig, PaginationStyle};
use crate::listen::{self, FeedMessage};
use crate::messageview::record_list;
use crate::utils::sleep;

const TITLE_SIZE: u16 = 25;
const HEADING_SIZE: u16 = 22;
const EDITOR_HEIGHT: u16 = 160;
const ACK_TEXT: &str = "Thank you for your message!";

#[derive(Debug, Clone)]
pub enum BoardMessage {
    Editor(text_editor::Action),
    SendInitiated,
    SentSuccessfully(RecordId),
    SendError(Arc<docstorecl::Error>),
    AckExpired(AckToken),
    PageSelected(usize),
    NextPage,
    PrevPage,
    Feed(FeedMessage),
}

/// The form and the paged message list of one board.
pub struct BoardScreen {
    board: Board,
    editor: text_editor::Content,
}

impl BoardScreen {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            board: Board::new(config),
            editor: text_editor::Content::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Called when the screen is hidden and its subscription dropped.
    pub fn unmount(&mut self) {
        self.board.unmount();
    }

    pub fn update(&mut self, message: BoardMessage, store: &Client) -> Command<BoardMessage> {
        match message {
            BoardMessage::Editor(action) => {
                self.editor.perform(action);
                self.board.edit(self.editor.text());
            }
            BoardMessage::SendInitiated => {
                let Some(submission) = self.board.begin_submit(store) else {
                    return Command::none();
                };

                return Command::perform(submission, |res| match res {
                    Ok(id) => BoardMessage::SentSuccessfully(id),
                    Err(e) => BoardMessage::SendError(Arc::new(e)),
                });
            }
            BoardMessage::SentSuccessfully(id) => {
                let token = self.board.submit_succeeded(&id);
                self.editor = text_editor::Content::new();
                return Command::perform(sleep(ACK_DURATION), move |()| {
                    BoardMessage::AckExpired(token)
                });
            }
            BoardMessage::SendError(err) => self.board.submit_failed(&*err),
            BoardMessage::AckExpired(token) => self.board.ack_expired(token),
            BoardMessage::PageSelected(page) => {
                self.board.go_to(page);
            }
            BoardMessage::NextPage => {
                self.board.next_page();
            }
            BoardMessage::PrevPage => {
                self.board.prev_page();
            }
            BoardMessage::Feed(FeedMessage::Attached(id)) => {
                self.board.mount(id);
            }
            BoardMessage::Feed(FeedMessage::Snapshot(id, snapshot)) => {
                log::debug!("{id} delivered {} records", snapshot.len());
                self.board.apply_snapshot(id, snapshot);
            }
            BoardMessage::Feed(FeedMessage::Detached(id)) => {
                if self.board.feed().listener() == Some(id) {
                    self.board.unmount();
                }
            }
        }

        Command::none()
    }

    fn pagination(&self) -> Element<'_, BoardMessage> {
        let page = self.board.page();
        let style = self.board.config().pagination;
        let arrows = style == PaginationStyle::Arrows;

        let mut controls = Row::new().spacing(8).align_items(Alignment::Center);

        if arrows {
            controls = controls.push({
                button("Prev")
                    .on_press_maybe(Some(BoardMessage::PrevPage).filter(|_| page.current > 1))
                    .style(theme::Button::Secondary)
                    .padding([8, 16])
            });
        }

        for n in 1..=page.total_pages {
            controls = controls.push({
                button(text(n))
                    .on_press_maybe({
                        Some(BoardMessage::PageSelected(n)).filter(|_| !arrows || n != page.current)
                    })
                    .style({
                        if n == page.current {
                            theme::Button::Primary
                        } else {
                            theme::Button::Secondary
                        }
                    })
                    .padding([8, 16])
            });
        }

        if arrows {
            controls = controls.push({
                button("Next")
                    .on_press_maybe({
                        Some(BoardMessage::NextPage).filter(|_| page.current < page.total_pages)
                    })
                    .style(theme::Button::Secondary)
                    .padding([8, 16])
            });
        }

        container(controls).width(Length::Fill).center_x().into()
    }

    pub fn view(&self, theme: &Theme) -> Element<'_, BoardMessage> {
        let config = self.board.config();

        let header = container({
            text(&config.title).size(TITLE_SIZE).font(Font {
                weight: Weight::Bold,
                ..Font::DEFAULT
            })
        })
        .width(Length::Fill)
        .center_x()
        .padding(10);

        let form = column![
            container({
                text_editor(&self.editor)
                    .on_action(BoardMessage::Editor)
                    .padding(10)
            })
            .height(EDITOR_HEIGHT),
            button(container("Send").center_x().width(Length::Fill))
                .width(Length::Fill)
                .padding(12)
                .on_press_maybe(Some(BoardMessage::SendInitiated).filter(|_| self.board.can_submit())),
        ]
        .spacing(10);

        let content = column![
            header,
            form,
            text("Messages").size(HEADING_SIZE).font(Font {
                weight: Weight::Medium,
                ..Font::DEFAULT
            }),
            record_list(self.board.page().items),
            self.pagination(),
        ]
        .spacing(20)
        .padding(24)
        .max_width(640);

        let body = container(scrollable(container(content).width(Length::Fill).center_x()))
            .width(Length::Fill)
            .height(Length::Fill);

        if !self.board.is_acknowledged() {
            return body.into();
        }

        let banner = container(text(ACK_TEXT).style(theme.palette().success))
            .padding(16)
            .style(theme::Container::Box);

        FloatingElement::new(body, banner)
            .anchor(Anchor::NorthEast)
            .offset(16.0)
            .into()
    }

    pub fn subscription(&self, key: usize, store: &Client) -> Subscription<BoardMessage> {
        let config = self.board.config();
        listen::feed(key, store.clone(), config.query(), config.fields.clone())
            .map(BoardMessage::Feed)
    }
}
