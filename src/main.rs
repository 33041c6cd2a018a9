use adviceboard::AdviceBoard;
use iced::{Application, Settings};

fn main() -> Result<(), iced::Error> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    #[cfg(target_arch = "wasm32")]
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        eprintln!("could not set up logging: {e}");
    }

    AdviceBoard::run(Settings::default())
}
