//! Items API
//! A small HTTP API showing path, query, body, cookie, header and upload handling.
//! Exports all modules for use as a library crate and from integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod validation;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, Settings};
pub use error::{ApiError, ApiResult};
pub use models::{CreateItemRequest, Image, Item, ModelName, User};
pub use routes::build_router;
pub use validation::{ErrorDetail, ErrorKind, Loc};
