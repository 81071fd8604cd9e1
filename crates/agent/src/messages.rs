//! Message builder and prompt rendering.
//!
//! [`build_messages`] is pure: the system prompt is rendered beforehand by
//! [`render_system_prompt`], which is the only place the clock is read.

use chrono::{DateTime, Local};
use mcpagent_core::message::{HistoryEntry, Message};
use mcpagent_core::metadata::LoopMetadata;

/// Default system prompt. `{date_long}` and `{date_iso}` are substituted
/// on every call.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
Role
You are a tool-using assistant. Aim for correctness, brevity and reproducibility.

Context
- System date/time: {date_long} (ISO {date_iso})
- You have access to tools discovered at runtime.
- Never invent or print credentials or tokens.

Rules
1) Do not guess. If something is unknown, say so and propose the next best tool or query.
2) Ask for missing parameters only when strictly necessary; otherwise state a minimal assumption and proceed.
3) After each tool call, interpret its output and continue until you can answer.
4) If a tool fails, retry once with a safe adjustment; otherwise explain the failure briefly.
5) Keep answers concise.
";

/// Render a system prompt template for the given instant.
pub fn render_system_prompt(template: Option<&str>, now: DateTime<Local>) -> String {
    let template = template.unwrap_or(DEFAULT_SYSTEM_PROMPT);
    template
        .replace("{date_long}", &now.format("%A, %B %-d, %Y %H:%M").to_string())
        .replace("{date_iso}", &now.to_rfc3339_opts(chrono::SecondsFormat::Secs, false))
}

/// Assemble `[System, ...history, User(question)]`.
///
/// With `exclude_last`, the chronologically last history entry is dropped
/// first; the remainder is then cut to its newest `max_history` entries
/// (`None` keeps everything).
pub fn build_messages(
    history: &[HistoryEntry],
    system_prompt: &str,
    question: &str,
    max_history: Option<usize>,
    exclude_last: bool,
) -> Vec<Message> {
    let history = if exclude_last && !history.is_empty() {
        &history[..history.len() - 1]
    } else {
        history
    };
    let start = max_history.map_or(0, |n| history.len().saturating_sub(n));
    let kept = &history[start..];

    let mut messages = Vec::with_capacity(kept.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(kept.iter().map(HistoryEntry::to_message));
    messages.push(Message::user(question));
    messages
}

/// Prompt for answering from a finished loop's tool results alone.
pub fn final_answer_messages(system_prompt: &str, question: &str, metadata: &LoopMetadata) -> Vec<Message> {
    let mut summary: Vec<String> = Vec::with_capacity(metadata.len());
    for (index, (name, params, result)) in metadata.entries().enumerate() {
        let outcome = if metadata.is_failure(index) {
            format!("ERROR: {}", result["error"].as_str().unwrap_or_default())
        } else {
            result.to_string()
        };
        summary.push(format!("- Tool `{name}` called with args {params} returned:\n{outcome}"));
    }
    let summary = if summary.is_empty() {
        "No tools were used.".to_string()
    } else {
        summary.join("\n")
    };

    vec![
        Message::system(system_prompt),
        Message::user(format!(
            "The user asked:\n{question}\n\n\
             You have already executed the following tools:\n{summary}\n\n\
             Using ONLY these results, now generate the best possible final answer. \
             Do not call or mention tools in your answer.\n"
        )),
    ]
}
