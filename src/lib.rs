pub mod api;
pub mod config;
pub mod errors;
pub mod generator;
pub mod layout;
pub mod manifest;
pub mod preview;
pub mod utils;
pub mod vfs;

pub use api::{generate, preview, KamaeError};
pub use config::{AssetStrategy, Settings};
