// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON schema definitions for the built-in Tools API, shaped the way an
//! LLM function-calling request expects them. `AskUserQuestion` is kept
//! separate since it is only offered to interactive agents.

use forge_gateway::ToolSpec;
use serde_json::json;

pub fn definition_for(name: &str) -> Option<ToolSpec> {
    let (description, parameters) = match name {
        "InstallPackage" => (
            "Install a package using the project's package manager",
            json!({
                "type": "object",
                "properties": {
                    "package_name": {"type": "string", "description": "Name of package to install"}
                },
                "required": ["package_name"],
            }),
        ),
        "InitProject" => (
            "Initialize a new project structure",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Project path (default .)"}
                },
            }),
        ),
        "Read" => (
            "Read file content. Tool results are capped at 8000 chars — for large \
             files, use offset and limit to read specific line ranges instead of the \
             whole file. Use Grep to find line numbers first, then Read with offset.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Path to file"},
                    "offset": {"type": "integer", "description": "Start reading from this line number (1-indexed). Optional."},
                    "limit": {"type": "integer", "description": "Maximum number of lines to return. Optional."},
                },
                "required": ["file_path"],
            }),
        ),
        "Write" => (
            "Write content to file",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Path to file"},
                    "content": {"type": "string", "description": "Content to write"},
                },
                "required": ["file_path", "content"],
            }),
        ),
        "ReadFiles" => (
            "Read multiple files at once. Returns JSON dict of path->content.",
            json!({
                "type": "object",
                "properties": {
                    "file_paths": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of file paths to read",
                    }
                },
                "required": ["file_paths"],
            }),
        ),
        "Edit" => (
            "Edit a file by replacing an exact string match. old_string must appear \
             exactly once. Safer than Write for small changes.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Path to file"},
                    "old_string": {"type": "string", "description": "Exact string to find and replace (must be unique in file)"},
                    "new_string": {"type": "string", "description": "Replacement string"},
                },
                "required": ["file_path", "old_string", "new_string"],
            }),
        ),
        "Bash" => (
            "Run bash command",
            json!({
                "type": "object",
                "properties": {
                    "command": {"type": "string", "description": "Command to run"},
                    "workdir": {"type": "string", "description": "Working directory"},
                },
                "required": ["command"],
            }),
        ),
        "Glob" => (
            "List files matching pattern",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Glob pattern"},
                    "workdir": {"type": "string", "description": "Working directory"},
                },
                "required": ["pattern"],
            }),
        ),
        "Grep" => (
            "Search file contents for a literal pattern. Returns matching lines.",
            json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Pattern to search for"},
                    "path": {"type": "string", "description": "Directory to search in (default .)"},
                    "include": {"type": "string", "description": "File glob filter (e.g. '*.rs')"},
                },
                "required": ["pattern"],
            }),
        ),
        "AskUserQuestion" => (
            "Ask user a question",
            json!({
                "type": "object",
                "properties": {
                    "question": {"type": "string", "description": "The question to ask"},
                    "options": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Options",
                    },
                },
                "required": ["question"],
            }),
        ),
        _ => return None,
    };

    Some(ToolSpec {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    })
}

/// Build the tool definitions list for `tool_names`, skipping `AskUserQuestion`
/// unless `interactive` is set.
pub fn build_definitions(tool_names: &[&str], interactive: bool) -> Vec<ToolSpec> {
    tool_names
        .iter()
        .filter(|name| interactive || **name != "AskUserQuestion")
        .filter_map(|name| definition_for(name))
        .collect()
}

#[cfg(test)]
#[path = "tool_defs_tests.rs"]
mod tests;
