/*!
 * Document Module
 * JSON front end for policies, content, updates and requests
 *
 * Documents are parsed into owned engine types before anything touches live
 * storage, so a rejected document never affects decisions.
 */

mod content;
mod errors;
mod policy;
mod request;
mod schema;
mod value;

pub use content::{parse_content, parse_content_update};
pub use errors::{DocumentError, DocumentResult};
pub use policy::{parse_policy, parse_policy_update};
pub use request::parse_request;

use crate::content::LocalContent;
use crate::storage::PolicyStorage;
use std::path::Path;

/// Read and parse a policy document from disk
pub fn load_policy_file(path: impl AsRef<Path>) -> DocumentResult<PolicyStorage> {
    parse_policy(&read(path.as_ref())?, None)
}

/// Read and parse a content document from disk
pub fn load_content_file(path: impl AsRef<Path>) -> DocumentResult<LocalContent> {
    parse_content(&read(path.as_ref())?, None)
}

fn read(path: &Path) -> DocumentResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| DocumentError::Io {
        path: path.display().to_string(),
        source,
    })
}
