// HTTP layer - axum routes and response mapping.

pub mod admin_routes;
pub mod app_state;
pub mod public_routes;
pub mod response;

pub use admin_routes::admin_routes;
pub use app_state::AppState;
pub use public_routes::public_routes;
