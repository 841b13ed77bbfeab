//! Run context: the structured logging handle threaded through every call.
//!
//! Components never log through an ambient logger. They receive a
//! `&RunContext` and emit events with `parent: ctx.span()`, so every line
//! carries the run id and the flow it belongs to.

use tracing::Span;

/// Identity and log span of one pipeline run (or one flow within it).
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    flow: &'static str,
    span: Span,
}

impl RunContext {
    /// Root context for a run.
    pub fn new(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        let span = tracing::info_span!("run", run_id = %run_id);
        Self {
            run_id,
            flow: "main",
            span,
        }
    }

    /// Context that records nothing. Used by tests and one-off calls.
    pub fn detached() -> Self {
        Self {
            run_id: "detached".into(),
            flow: "detached",
            span: Span::none(),
        }
    }

    /// Child context for a named flow, nested under this one.
    pub fn child(&self, flow: &'static str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "flow", flow = flow);
        Self {
            run_id: self.run_id.clone(),
            flow,
            span,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn flow(&self) -> &'static str {
        self.flow
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
