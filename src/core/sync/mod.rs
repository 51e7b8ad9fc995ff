/*!
 * Synchronization Primitives
 *
 * Snapshot-based sharing of the live policy and content storage:
 * readers load an `Arc` without blocking, writers publish a new value.
 */

mod rcu;

pub use rcu::RcuCell;
