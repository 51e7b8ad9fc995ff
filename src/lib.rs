/*!
 * PDP Library
 * Policy decision point: typed attribute values, policy trees with
 * combining algorithms, tagged transactional storage and the
 * stage/upload/apply control plane
 */

pub mod config;
pub mod content;
pub mod core;
pub mod document;
pub mod expr;
pub mod monitoring;
pub mod policy;
pub mod server;
pub mod storage;
pub mod value;
pub mod wire;

// Re-exports
pub use config::PdpConfig;
pub use content::{LocalContent, LocalContentStorage};
pub use core::{PdpError, SerializableError};
pub use expr::{AttributeAssignment, Context};
pub use monitoring::init_tracing;
pub use policy::{Effect, Evaluable, Response};
pub use server::{Pdp, ServerError, ServerResult};
pub use storage::PolicyStorage;
pub use value::{AttributeValue, Symbols, ValueType};
