/*!
 * Wire Module
 * Compact binary encoding of decision requests and responses
 */

mod errors;
mod message;
mod value;

pub use errors::{WireError, WireResult};
pub use message::{decode_request, decode_response, encode_request, encode_response, WireResponse};
pub use value::{decode_value, encode_value, kind_code};
