mod routes;
mod webhook;

pub use routes::webhook_routes;
pub use webhook::AppState;
