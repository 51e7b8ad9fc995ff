/*!
 * Storage Module
 * Tagged policy storage and the update protocol shared with content
 */

mod errors;
mod policy;
mod transaction;
mod update;

pub use errors::{StorageError, StorageResult};
pub use policy::PolicyStorage;
pub use transaction::{PolicyTransaction, PolicyUpdate};
pub use update::{Command, Update, UpdateOp};
