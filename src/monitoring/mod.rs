/*!
 * Monitoring
 * Structured tracing for decisions and control-plane operations
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, DecisionSpan, OperationSpan};
