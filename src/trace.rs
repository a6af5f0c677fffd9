//! Diagnostic tracing hooks.
//!
//! Filters never log through a global on their own. They hold a [`Tracer`]
//! which defaults to [`NoopTracer`]; use [`LogTracer`] to route messages to
//! the `log` facade.

use std::fmt;

/// Sink for advisory diagnostic messages.
///
/// Tracing never affects matching results.
pub trait Tracer: Send + Sync {
    /// Emit one trace message.
    fn trace(&self, args: fmt::Arguments<'_>);
}

/// Tracer that discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn trace(&self, _args: fmt::Arguments<'_>) {}
}

/// Tracer that forwards messages to `log::debug!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: "ipfilter", "{}", args);
    }
}

impl<F> Tracer for F
where
    F: Fn(&str) + Send + Sync,
{
    fn trace(&self, args: fmt::Arguments<'_>) {
        self(&args.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_tracer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracer = move |msg: &str| sink.lock().unwrap().push(msg.to_string());

        tracer.trace(format_args!("parsed {} networks", 2));

        assert_eq!(seen.lock().unwrap().as_slice(), ["parsed 2 networks"]);
    }

    #[test]
    fn test_noop_and_log_tracers() {
        NoopTracer.trace(format_args!("dropped"));
        LogTracer.trace(format_args!("forwarded"));
    }
}
