pub mod identity;
pub mod metrics;
pub mod tracing;

pub use identity::{Identity, Role};
