/*!
 * Content Module
 * Local content consulted by selectors
 *
 * Content is versioned independently of policy: each content carries its own
 * tag and is replaced wholesale or through a committed transaction.
 */

mod errors;
mod item;
mod storage;
mod transaction;

pub use errors::{ContentError, ContentResult};
pub use item::{parse_key, ContentItem, ContentNode, NetworkTable};
pub use storage::{LocalContent, LocalContentStorage};
pub use transaction::{ContentEntity, ContentTransaction, ContentUpdate};
