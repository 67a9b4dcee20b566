//! Adapters implementing application ports.

mod api_client;
mod system_clock;

pub use api_client::{ApiClient, ApiError};
pub use system_clock::SystemClock;
