//! Moon phase lookup.
//!
//! The lookup is best-effort: callers get a [`MoonPhaseReading`] no matter
//! what happens on the wire, falling back to the "Unknown Phase" sentinel.
//!
//! [`MoonPhaseReading`]: dreammap_core::MoonPhaseReading

pub mod moon_client;
pub mod response;
pub mod source;

pub use moon_client::{MoonClientConfig, MoonPhaseClient};
pub use response::AstronomyResponse;
pub use source::MoonPhaseSource;
