#[macro_use]
mod macros;

pub mod canvas;
pub mod clients;
pub mod config;
pub mod deserializers;
pub mod error;
pub mod gallery;
pub mod interview;
pub mod json_text;
pub mod merge;
pub mod need;
pub mod notify;
pub mod prompts;
pub mod server;
pub mod session;
pub mod transcript;

pub use error::{NeedCanvasError, Result};
