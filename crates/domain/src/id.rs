//! ID generation utilities.

use uuid::Uuid;

/// Generates a fresh login correlation state (UUID v4).
///
/// Each login attempt gets its own value; it is consumed by the callback.
#[must_use]
pub fn generate_state() -> String {
    Uuid::new_v4().to_string()
}
