//! Credential pairs, redacted secrets, and the explicit token lifecycle state.

pub mod credential;
pub mod secret;
pub mod state;

pub use credential::*;
pub use secret::*;
pub use state::*;
