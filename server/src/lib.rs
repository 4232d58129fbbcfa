pub mod api;
pub mod logging;
pub mod state;

pub use api::build_router;
pub use state::AppState;
