//! Observability utilities.

mod logging;
mod tracing;

pub use logging::{init_tracing, LogFormat, DEFAULT_LOG_FILTER};
pub use tracing::{
    LoggingTracingEmitter, NoOpTracingEmitter, PipelineSpanAttributes, SpanTimer,
    StageSpanAttributes, TracingEmitter,
};
