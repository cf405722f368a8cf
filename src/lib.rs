pub mod classify;
pub mod config;
pub mod dispatch;
mod error;
pub mod http;
pub mod identify;
pub mod normalize;
pub mod payload;
pub mod platform;
pub mod playback;
pub mod record;
pub mod redirect;
pub mod resolver;
pub mod scrape;

pub use error::{EngineError, Result};
