use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::error::SliceError;
use crate::mailer::Mailer;

/// Shared application state available in all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

pub mod auth;
pub mod cart;
pub mod health;
pub mod menu;
pub mod order;

/// Parse a numeric path id. Ids that cannot parse can never match a row.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<i32, SliceError> {
    raw.trim()
        .parse()
        .map_err(|_| SliceError::NotFound(not_found.to_string()))
}
