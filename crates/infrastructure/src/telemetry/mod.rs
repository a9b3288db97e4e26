//! Log subscriber setup
//!
//! Console logging via `tracing-subscriber`, human-readable or JSON.

mod logging;

pub use logging::{LoggingError, effective_filter, init_logging};
