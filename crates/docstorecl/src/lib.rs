pub mod client;
pub mod errors;
pub mod model;
pub mod platform;
pub use errors::Error;
