use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod password;
pub mod service;
pub(crate) mod extractors;

pub use service::{Auth, AuthError};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
