/*!
 * Server Module
 * Decision entry point and the stage/upload/apply control plane
 */

mod errors;
mod pdp;
mod staging;

pub use errors::{ServerError, ServerResult};
pub use pdp::Pdp;
pub use staging::{StagedItem, StagedKind, StagedMode, StagingQueue};
