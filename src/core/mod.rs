/*!
 * Core Module
 * Error taxonomy, engine-wide limits and synchronization primitives
 */

pub mod errors;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use errors::{PdpError, Result, SerializableError};
