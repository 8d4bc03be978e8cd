//! Client core for the AI filter app
//!
//! Uploads a photo and a style name to the filter backend with a cached bearer
//! token and returns the URL of the generated image.

pub mod app;
pub mod auth;
pub mod clock;
pub mod error;
pub mod models;
pub mod notify;
pub mod retry;
pub mod upload;

pub use error::{Error, ErrorKind, Result};
