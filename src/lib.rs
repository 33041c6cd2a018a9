use board_screen::{BoardMessage, BoardScreen};
use config::{Config, StoreSettings};
use docstorecl::client::firestore::Firestore;
use docstorecl::client::memory::MemoryStore;
use docstorecl::client::Client;
use docstorecl::errors::ErrorWithCauses;
use docstorecl::platform;
use iced::widget::{self, container, row};
use iced::{
    executor, theme, Application, Color, Command, Element, Length, Renderer, Subscription, Theme,
};

use crate::board_select::board_list;

pub mod board;
pub mod board_screen;
pub mod board_select;
pub mod config;
pub mod feed;
pub mod listen;
pub mod messageview;
pub mod paginator;
pub mod utils;

const SIDEBAR_WIDTH: f32 = 200.0;

const USER_AGENT: &str = concat!("adviceboard/v", env!("CARGO_PKG_VERSION"));

/// Builds the configured store, falling back to an in-memory one.
pub fn make_store(settings: &StoreSettings) -> Client {
    match settings {
        StoreSettings::Memory => MemoryStore::new().into(),
        StoreSettings::Firestore(firestore) => {
            let res = Firestore::new(
                firestore.clone().into(),
                USER_AGENT.to_string(),
                platform::sleep_with(utils::sleep),
            );
            match res {
                Ok(store) => store.into(),
                Err(e) => {
                    log::error!(
                        "could not set up Firestore, keeping messages in memory: {}",
                        ErrorWithCauses(e)
                    );
                    MemoryStore::new().into()
                }
            }
        }
    }
}

pub struct AdviceBoard {
    store: Client,
    screens: Vec<BoardScreen>,
    selected_board: usize,
}

#[derive(Debug, Clone)]
pub enum Message {
    BoardSelected(usize),
    Board(usize, BoardMessage),
}

impl Application for AdviceBoard {
    type Executor = executor::Default;

    type Message = Message;

    type Theme = Theme;

    type Flags = ();

    fn new((): Self::Flags) -> (Self, Command<Self::Message>) {
        let config = Config::load();
        let store = make_store(&config.store);
        log::debug!("store: {store:?}");

        (
            Self {
                store,
                screens: config.boards.into_iter().map(BoardScreen::new).collect(),
                selected_board: 0,
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        match self.screens.get(self.selected_board) {
            Some(screen) => format!("{} - adviceboard", screen.board().config().title),
            None => String::from("adviceboard"),
        }
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        match message {
            Message::BoardSelected(idx)
                if idx != self.selected_board && idx < self.screens.len() =>
            {
                if let Some(screen) = self.screens.get_mut(self.selected_board) {
                    screen.unmount();
                }
                self.selected_board = idx;
            }
            Message::Board(idx, BoardMessage::Feed(_)) if idx != self.selected_board => {
                log::debug!("dropping feed message for hidden board {idx}");
            }
            Message::Board(idx, msg) => {
                if let Some(screen) = self.screens.get_mut(idx) {
                    return screen
                        .update(msg, &self.store)
                        .map(move |msg| Message::Board(idx, msg));
                }
            }
            _ => {}
        }

        Command::none()
    }

    fn view(&self) -> Element<'_, Self::Message, Self::Theme, Renderer> {
        let idx = self.selected_board;
        let Some(screen) = self.screens.get(idx) else {
            return container("No boards configured")
                .center_x()
                .center_y()
                .width(Length::Fill)
                .height(Length::Fill)
                .into();
        };

        let board = screen
            .view(&self.theme())
            .map(move |msg| Message::Board(idx, msg));

        if self.screens.len() < 2 {
            return board;
        }

        let sidebar = container(board_list(self.screens.iter().map(BoardScreen::board), idx))
            .width(Length::Fixed(SIDEBAR_WIDTH))
            .height(Length::Fill)
            .padding(10)
            .style(|t: &Theme| {
                use iced::widget::container::StyleSheet;
                let color = match t.extended_palette().is_dark {
                    true => Color::from_rgba8(255, 255, 255, 0.05),
                    false => Color::from_rgba8(0, 0, 0, 0.05),
                };
                widget::container::Appearance {
                    background: Some(iced::Background::Color(color)),
                    ..t.appearance(&theme::Container::Transparent)
                }
            });

        row![
            Element::from(sidebar).map(Message::BoardSelected),
            board,
        ]
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn subscription(&self) -> Subscription<Self::Message> {
        let idx = self.selected_board;
        match self.screens.get(idx) {
            Some(screen) => screen
                .subscription(idx, &self.store)
                .map(move |msg| Message::Board(idx, msg)),
            None => Subscription::none(),
        }
    }

    fn theme(&self) -> iced::Theme {
        iced::Theme::Dark
    }
}
