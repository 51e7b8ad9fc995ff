/*!
 * Tracing
 * Structured tracing for decisions and control-plane operations
 *
 * Features:
 * - Trace ID per decision for request correlation
 * - JSON-formatted logs for structured parsing
 * - Slow decision warnings with the effect that was returned
 */

use crate::policy::Effect;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured tracing
///
/// The level comes from RUST_LOG (default: info). `use_json` switches to
/// JSON output with full span events.
pub fn init_tracing(use_json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries decisions, so logs go to stderr
    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::FULL),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span around one decision
///
/// Logs completion at debug level, or a warning when the decision took
/// longer than the slow threshold.
pub struct DecisionSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
    slow: Duration,
    effect: Option<Effect>,
    obligations: usize,
}

impl DecisionSpan {
    pub fn new(attributes: usize, slow: Duration) -> Self {
        let trace_id = generate_trace_id();
        let span = span!(
            Level::DEBUG,
            "decision",
            trace_id = %trace_id,
            attributes = attributes,
            effect = tracing::field::Empty,
            obligations = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
            slow,
            effect: None,
            obligations: 0,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Enter the span while the decision is evaluated
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    pub fn record_outcome(&mut self, effect: Effect, obligations: usize) {
        self.span.record("effect", effect.name());
        self.span.record("obligations", obligations);
        self.effect = Some(effect);
        self.obligations = obligations;
    }
}

impl Drop for DecisionSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let effect = self.effect.map(Effect::name).unwrap_or("unknown");
        let _entered = self.span.enter();

        if duration > self.slow {
            warn!(
                trace_id = %self.trace_id,
                effect,
                obligations = self.obligations,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow decision"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                effect,
                obligations = self.obligations,
                duration_us = duration.as_micros() as u64,
                "decision completed"
            );
        }
    }
}

/// Span around a control-plane operation (stage, upload, apply, abort)
///
/// Success is logged at info level, failure at warn.
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
    request_id: u32,
    error: Option<String>,
}

impl OperationSpan {
    pub fn new(operation: &'static str, request_id: u32) -> Self {
        let span = span!(
            Level::INFO,
            "operation",
            operation = operation,
            request_id = request_id,
            subject = tracing::field::Empty,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            operation,
            request_id,
            error: None,
        }
    }

    /// Record the policy or content the operation works on
    pub fn record_subject(&self, subject: &str) {
        self.span.record("subject", subject);
    }

    pub fn record_error(&mut self, error: &dyn std::fmt::Display) {
        let message = error.to_string();
        self.span.record("error", message.as_str());
        self.error = Some(message);
    }

    /// Record the outcome of `result` and pass it through
    pub fn finish<T, E: std::fmt::Display>(mut self, result: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &result {
            self.record_error(err);
        }
        result
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration_us = self.start.elapsed().as_micros() as u64;
        let _entered = self.span.enter();
        match &self.error {
            None => {
                self.span.record("result", "success");
                info!(
                    operation = self.operation,
                    request_id = self.request_id,
                    duration_us,
                    "operation completed"
                );
            }
            Some(error) => {
                self.span.record("result", "error");
                warn!(
                    operation = self.operation,
                    request_id = self.request_id,
                    duration_us,
                    error = %error,
                    "operation failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique() {
        assert_ne!(generate_trace_id(), generate_trace_id());
    }

    #[test]
    fn test_decision_span_records_outcome() {
        let mut span = DecisionSpan::new(2, Duration::from_millis(10));
        assert_eq!(span.trace_id().len(), 36);
        span.record_outcome(Effect::Permit, 1);
        assert_eq!(span.effect, Some(Effect::Permit));
    }

    #[test]
    fn test_operation_span_passes_result_through() {
        let ok: Result<u32, String> = OperationSpan::new("apply", 1).finish(Ok(3));
        assert_eq!(ok, Ok(3));
        let err: Result<u32, String> = OperationSpan::new("apply", 2).finish(Err("bad".into()));
        assert_eq!(err, Err("bad".to_string()));
    }
}
