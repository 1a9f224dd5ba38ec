//! Log hook for runner output.
//!
//! Every line the runner produces flows through [`forward_line`], which
//! drops statement-execution traces (lines prefixed `Executing`) before
//! they reach the sink. All other lines are forwarded untouched.

use sea_orm::Statement;

/// Prefix of statement-execution trace lines.
const EXECUTION_TRACE_PREFIX: &str = "Executing";

/// Forwards a log line to the sink unless it is an execution trace.
pub fn forward_line<F: FnMut(&str)>(line: &str, sink: &mut F) {
    if !line.starts_with(EXECUTION_TRACE_PREFIX) {
        sink(line);
    }
}

/// Emits a runner log line through the filtered hook.
pub fn log_line(line: &str) {
    forward_line(line, &mut |l| tracing::info!(target: "tidemark", "{l}"));
}

/// Traces an executed statement. The resulting line carries the
/// `Executing` prefix and is therefore suppressed by the hook.
pub(crate) fn trace_statement(stmt: &Statement) {
    log_line(&format!("Executing: {}", stmt.sql));
}
