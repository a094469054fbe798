// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties the per-tool modules together into the dispatch surface the Agent
//! Loop calls: parse arguments, check `allowed_tools`, run the tool, render
//! a string result. Never panics and never returns a `Result` the caller
//! has to propagate — every outcome, including malformed JSON and access
//! denials, becomes text the LLM can read and react to.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;

use crate::access::AccessControl;
use crate::ask::{self, AskResult};
use crate::bash;
use crate::error::ToolError;
use crate::fs_tools;
use crate::project;
use crate::search;

/// Outcome of a dispatch attempt against the built-in Tools API.
pub enum Dispatch {
    /// The call was handled (successfully or not); this is the final text
    /// to append as the tool result.
    Handled(String),
    /// `tool_name` is not one of the built-ins; try MCP clients next.
    UnknownTool,
}

pub struct Tools {
    pub access: AccessControl,
    pub allowed_tools: Option<HashSet<String>>,
    pub workdir: PathBuf,
    pub subprocess_timeout: Duration,
}

impl Tools {
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            access: AccessControl::new(),
            allowed_tools: None,
            workdir,
            subprocess_timeout: Duration::from_secs(forge_core::constants::SUBPROCESS_TIMEOUT_SECS),
        }
    }

    pub fn with_access(mut self, access: AccessControl) -> Self {
        self.access = access;
        self
    }

    pub fn with_allowed_tools(mut self, tools: HashSet<String>) -> Self {
        self.allowed_tools = Some(tools);
        self
    }

    fn is_allowed(&self, name: &str) -> bool {
        match &self.allowed_tools {
            Some(set) => set.contains(name),
            None => true,
        }
    }

    /// The tool names this instance will actually dispatch, for building
    /// the LLM-facing tool definitions list.
    pub fn exposed_tool_names(&self) -> Vec<&'static str> {
        ALL_TOOL_NAMES
            .iter()
            .copied()
            .filter(|name| self.is_allowed(name))
            .collect()
    }

    /// Resolve `path` relative to this instance's workdir unless already absolute.
    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.workdir.join(p)
        }
    }

    /// Dispatch a single tool call by name against raw JSON arguments.
    pub async fn dispatch(&self, name: &str, arguments_json: &str) -> Dispatch {
        if !ALL_TOOL_NAMES.contains(&name) {
            return Dispatch::UnknownTool;
        }
        if !self.is_allowed(name) {
            return Dispatch::Handled(
                ToolError::AccessDenied(format!("{name} is not available to this agent")).to_tool_result(),
            );
        }

        let args: Value = match serde_json::from_str(arguments_json) {
            Ok(v) => v,
            Err(e) => {
                return Dispatch::Handled(
                    ToolError::BadArguments(format!("malformed JSON arguments: {e}")).to_tool_result(),
                )
            }
        };

        Dispatch::Handled(self.run(name, &args).await)
    }

    async fn run(&self, name: &str, args: &Value) -> String {
        match name {
            "Read" => self.run_read(args).await,
            "Write" => self.run_write(args).await,
            "Edit" => self.run_edit(args).await,
            "ReadFiles" => self.run_read_files(args).await,
            "Bash" => self.run_bash(args).await,
            "Glob" => self.run_glob(args),
            "Grep" => self.run_grep(args).await,
            "InstallPackage" => self.run_install_package(args).await,
            "InitProject" => self.run_init_project(args).await,
            "AskUserQuestion" => self.run_ask(args),
            other => ToolError::UnknownTool(other.to_string()).to_tool_result(),
        }
    }

    async fn run_read(&self, args: &Value) -> String {
        let Some(path) = args.get("file_path").and_then(Value::as_str) else {
            return ToolError::BadArguments("file_path is required".to_string()).to_tool_result();
        };
        let offset = args.get("offset").and_then(Value::as_u64).map(|n| n as usize);
        let limit = args.get("limit").and_then(Value::as_u64).map(|n| n as usize);
        match fs_tools::read(&self.resolve(path), offset, limit).await {
            Ok(content) => content,
            Err(e) => e.to_tool_result(),
        }
    }

    async fn run_write(&self, args: &Value) -> String {
        let (Some(path), Some(content)) = (
            args.get("file_path").and_then(Value::as_str),
            args.get("content").and_then(Value::as_str),
        ) else {
            return ToolError::BadArguments("file_path and content are required".to_string()).to_tool_result();
        };
        match fs_tools::write(&self.access, &self.resolve(path), content).await {
            Ok(()) => "OK".to_string(),
            Err(e) => e.to_tool_result(),
        }
    }

    async fn run_edit(&self, args: &Value) -> String {
        let (Some(path), Some(old), Some(new)) = (
            args.get("file_path").and_then(Value::as_str),
            args.get("old_string").and_then(Value::as_str),
            args.get("new_string").and_then(Value::as_str),
        ) else {
            return ToolError::BadArguments("file_path, old_string, and new_string are required".to_string())
                .to_tool_result();
        };
        match fs_tools::edit(&self.access, &self.resolve(path), old, new).await {
            Ok(()) => "OK".to_string(),
            Err(e) => e.to_tool_result(),
        }
    }

    async fn run_read_files(&self, args: &Value) -> String {
        let Some(paths) = args.get("file_paths").and_then(Value::as_array) else {
            return ToolError::BadArguments("file_paths is required".to_string()).to_tool_result();
        };
        let resolved: Vec<String> = paths
            .iter()
            .filter_map(Value::as_str)
            .map(|p| self.resolve(p).to_string_lossy().into_owned())
            .collect();
        let map: BTreeMap<String, String> = fs_tools::read_files(&resolved).await;
        serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_string())
    }

    async fn run_bash(&self, args: &Value) -> String {
        let Some(command) = args.get("command").and_then(Value::as_str) else {
            return ToolError::BadArguments("command is required".to_string()).to_tool_result();
        };
        let workdir = args
            .get("workdir")
            .and_then(Value::as_str)
            .map(|w| self.resolve(w))
            .unwrap_or_else(|| self.workdir.clone());
        match bash::run(command, Some(&workdir), self.subprocess_timeout).await {
            Ok(result) => result.render(),
            Err(e) => e.to_tool_result(),
        }
    }

    fn run_glob(&self, args: &Value) -> String {
        let Some(pattern) = args.get("pattern").and_then(Value::as_str) else {
            return ToolError::BadArguments("pattern is required".to_string()).to_tool_result();
        };
        let workdir = args.get("workdir").and_then(Value::as_str).map(|w| self.resolve(w));
        let workdir = workdir.as_deref().unwrap_or(&self.workdir);
        match search::glob(pattern, Some(workdir)) {
            Ok(matches) => matches.join("\n"),
            Err(e) => e.to_tool_result(),
        }
    }

    async fn run_grep(&self, args: &Value) -> String {
        let Some(pattern) = args.get("pattern").and_then(Value::as_str) else {
            return ToolError::BadArguments("pattern is required".to_string()).to_tool_result();
        };
        let path = args.get("path").and_then(Value::as_str).map(|p| self.resolve(p));
        let path = path.as_deref().unwrap_or(&self.workdir);
        let include = args.get("include").and_then(Value::as_str);
        match search::grep(pattern, Some(path), include).await {
            Ok(matches) => {
                if matches.is_empty() {
                    "no matches".to_string()
                } else {
                    matches.iter().map(search::GrepMatch::render).collect::<Vec<_>>().join("\n")
                }
            }
            Err(e) => e.to_tool_result(),
        }
    }

    async fn run_install_package(&self, args: &Value) -> String {
        let Some(package_name) = args.get("package_name").and_then(Value::as_str) else {
            return ToolError::BadArguments("package_name is required".to_string()).to_tool_result();
        };
        match project::install_package(&self.workdir, package_name, self.subprocess_timeout).await {
            Ok(result) => result.render(),
            Err(e) => e.to_tool_result(),
        }
    }

    async fn run_init_project(&self, args: &Value) -> String {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .map(|p| self.resolve(p))
            .unwrap_or_else(|| self.workdir.clone());
        match project::init_project(&path, self.subprocess_timeout).await {
            Ok(result) => result.render(),
            Err(e) => e.to_tool_result(),
        }
    }

    fn run_ask(&self, args: &Value) -> String {
        let Some(question) = args.get("question").and_then(Value::as_str) else {
            return ToolError::BadArguments("question is required".to_string()).to_tool_result();
        };
        let options: Vec<String> = args
            .get("options")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        let AskResult { answer, warning } = ask::ask(question, &options, None);
        match warning {
            Some(w) => {
                tracing::warn!(question, answer = %answer, warning = %w, "auto-answered AskUserQuestion");
                format!("{answer}\n[{w}]")
            }
            None => answer,
        }
    }
}

const ALL_TOOL_NAMES: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "ReadFiles",
    "Bash",
    "Glob",
    "Grep",
    "InstallPackage",
    "InitProject",
    "AskUserQuestion",
];

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
