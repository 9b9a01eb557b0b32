pub mod auth;
pub mod files;
pub mod invoices;
pub mod readings;
pub mod settings;
pub mod shops;

use crate::middleware::AppState;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/shops", shops::routes())
        .nest("/readings", readings::routes())
        .nest("/invoices", invoices::routes())
        .nest("/settings", settings::routes())
        .nest("/files", files::routes())
}
