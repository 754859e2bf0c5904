//! Output formatting shared by the tool adapters
//!
//! Truncation of tool output handed to the agent, and the boxed console
//! trace printed for every tool invocation.

use std::io::Write;

/// Width of the trace box rule
const TRACE_WIDTH: usize = 38;

/// Cap `text` at `max` characters
///
/// Text within the limit is returned unchanged. Longer text keeps its first
/// `max` characters followed by a marker carrying the original length.
/// Lengths are counted in `char`s, so multi-byte text is never split.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!(
            "{}\n... (truncated, {} chars total)",
            &text[..cut],
            text.chars().count()
        ),
    }
}

/// Shorten `text` to `max` characters, appending `...` when cut
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Render the boxed trace block for a tool invocation
pub fn render_invocation<S: AsRef<str>>(name: &str, lines: &[S]) -> String {
    let rule = TRACE_WIDTH.saturating_sub(name.chars().count()).max(1);
    let mut block = format!("\n  ┌─ {} {}\n", name, "─".repeat(rule));
    for line in lines {
        block.push_str("  │ ");
        block.push_str(line.as_ref());
        block.push('\n');
    }
    block.push_str("  └");
    block.push_str(&"─".repeat(TRACE_WIDTH));
    block.push('\n');
    block
}

/// Print the trace block for a tool invocation to stdout
///
/// Write failures are ignored; the trace is advisory.
pub fn log_invocation<S: AsRef<str>>(name: &str, lines: &[S]) {
    let block = render_invocation(name, lines);
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(block.as_bytes());
    let _ = stdout.flush();
}
