pub mod config;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use videogen_common::Dispatcher;

pub use config::Config;
pub use routes::{router, AppState};

pub fn app(dispatcher: Arc<Dispatcher>) -> Router {
    router(AppState { dispatcher })
}
