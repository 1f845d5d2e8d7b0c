//! Handler wrappers.

mod logging;
#[cfg(feature = "timeout")]
mod timeout;

pub use logging::LoggingHandler;
#[cfg(feature = "timeout")]
pub use timeout::{TimeoutError, TimeoutHandler};
