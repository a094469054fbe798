// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `AskUserQuestion`: only meaningfully interactive in an attended session.
//! In non-interactive (headless) mode it auto-answers with the first option
//! and tells the caller to surface a warning, rather than blocking forever.

pub struct AskResult {
    pub answer: String,
    pub warning: Option<String>,
}

/// Resolve an `AskUserQuestion` call. `interactive_answer` is `Some` when an
/// attended frontend (the daemon's UDS client, a TUI) has already supplied a
/// reply; in headless mode it is `None` and the first option is chosen.
pub fn ask(question: &str, options: &[String], interactive_answer: Option<String>) -> AskResult {
    match interactive_answer {
        Some(answer) => AskResult { answer, warning: None },
        None => {
            let answer = options.first().cloned().unwrap_or_default();
            AskResult {
                warning: Some(format!(
                    "non-interactive mode: auto-answered \"{question}\" with \"{answer}\""
                )),
                answer,
            }
        }
    }
}

#[cfg(test)]
#[path = "ask_tests.rs"]
mod tests;
