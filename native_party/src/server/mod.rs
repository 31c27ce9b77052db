pub mod http;
pub mod run;
pub mod state;
pub mod ws;

// Export commonly used types and functions
pub use run::{build_router, run_server};
pub use state::AppState;
