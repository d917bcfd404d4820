pub mod banner;
pub mod collaborator;
pub mod config;
pub mod consts;
pub mod error;
pub mod grid;
pub mod logging;
pub mod relay;
pub mod server;

pub use error::{RelayError, Result};
pub use relay::Relay;
