/*!
 * System Limits and Constants
 *
 * Centralized location for engine-wide limits and thresholds.
 * Organized by domain for maintainability and discoverability.
 *
 * - Wire-format constraints are marked with [WIRE]
 * - DNS constraints are marked with [DNS]
 */

use std::time::Duration;

// =============================================================================
// VALUE MODEL LIMITS
// =============================================================================

/// Maximum length of a single domain label in bytes
/// [DNS] RFC 1035 section 2.3.4
pub const MAX_DOMAIN_LABEL_LEN: usize = 63;

/// Maximum length of a domain name in wire format, including length octets
/// [DNS] RFC 1035 section 2.3.4
pub const MAX_DOMAIN_WIRE_LEN: usize = 255;

/// Maximum number of labels a wire-format name can carry
/// [DNS] 255 bytes of one-octet labels plus length octets
pub const MAX_DOMAIN_LABELS: usize = 127;

/// Maximum number of flags in a flags type (widest storage is u64)
pub const MAX_FLAGS: usize = 64;

/// Number of collection elements rendered by `AttributeValue::describe`
pub const DESCRIBE_COLLECTION_LIMIT: usize = 5;

// =============================================================================
// WIRE LIMITS
// =============================================================================

/// Maximum byte length of an encoded string or identifier
/// [WIRE] Lengths are carried as u16
pub const MAX_WIRE_STRING_LEN: usize = u16::MAX as usize;

/// Maximum number of elements in an encoded collection or tuple list
/// [WIRE] Counts are carried as u16
pub const MAX_WIRE_COLLECTION_LEN: usize = u16::MAX as usize;

// =============================================================================
// CONTROL PLANE LIMITS
// =============================================================================

/// Default capacity of the staging queue
/// Bounds memory held by uploads that were never applied
pub const DEFAULT_MAX_STAGED: usize = 64;

/// Default upper bound for a single staged document (64MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Decisions slower than this are logged at warn level
pub const DEFAULT_SLOW_DECISION: Duration = Duration::from_millis(10);
