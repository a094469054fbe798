// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PlanTask: runs a planning agent against the user's request and parses
//! its free-text response into the structured config the rest of the
//! workflow consumes — acceptance criteria, setup commands, quality
//! thresholds, and the module ownership graph.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::Regex;
use serde_json::{json, Value};

use forge_agent::{Agent, AgentConfig};
use forge_core::{validate_module_graph, ModuleSpec, Stage, TaskOutcome, TaskResult};

use crate::services::EngineServices;

const EARS_TAG_RE: &str = r"(?m)^\s*-\s*\[(UBIQ|EVENT|STATE|UNWNT|OPTNL|COMPLX)\]\s*(.+)$";

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PlanConfig {
    pub setup_commands: Vec<String>,
    pub quality_threshold: f64,
    pub test_command: Option<String>,
    pub lint_command: Option<String>,
    pub coverage_command: Option<String>,
}

impl PlanConfig {
    fn with_default_threshold() -> Self {
        Self {
            quality_threshold: crate::quality::PASS_SCORE_THRESHOLD,
            ..Default::default()
        }
    }
}

/// Extract the text following a `HEADER:` line up to the next all-caps
/// `HEADER:`-style line or end of input.
fn extract_block<'a>(raw: &'a str, header: &str) -> Option<&'a str> {
    let start = raw.find(&format!("{header}:"))? + header.len() + 1;
    let rest = &raw[start..];
    let end = Regex::new(r"(?m)^[A-Z_]+:\s*$").ok()?.find(rest).map(|m| m.start()).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn parse_setup_commands(raw: &str) -> Vec<String> {
    let Some(block) = extract_block(raw, "SETUP_COMMANDS") else {
        return Vec::new();
    };
    let bullet_re = Regex::new(r"^(?:[-*]\s+|\d+\.\s+)(.+)$").expect("static pattern");
    block
        .lines()
        .filter_map(|line| bullet_re.captures(line.trim()).map(|c| c[1].trim().to_string()))
        .collect()
}

fn parse_acceptance_criteria(raw: &str) -> Vec<String> {
    let re = Regex::new(EARS_TAG_RE).expect("static pattern");
    re.captures_iter(raw).map(|c| format!("[{}] {}", &c[1], c[2].trim())).collect()
}

fn parse_quality_config(raw: &str) -> PlanConfig {
    let mut config = PlanConfig::with_default_threshold();
    let Some(block) = extract_block(raw, "QUALITY_CONFIG") else {
        return config;
    };
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().to_string();
        match key {
            "quality_threshold" => {
                if let Ok(v) = value.parse() {
                    config.quality_threshold = v;
                }
            }
            "test_command" => config.test_command = Some(value),
            "lint_command" => config.lint_command = Some(value),
            "coverage_command" => config.coverage_command = Some(value),
            _ => {}
        }
    }
    config
}

/// Parse a `MODULES:` block of `id|name|owned_files(,-sep)|test_files(,-sep)|deps(,-sep)`
/// lines into module specs; absent block means a single implicit module
/// owning the whole project.
fn parse_modules(raw: &str) -> Vec<ModuleSpec> {
    let Some(block) = extract_block(raw, "MODULES") else {
        return Vec::new();
    };
    block
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().trim_start_matches(['-', '*']).trim().split('|').collect();
            if parts.len() < 2 {
                return None;
            }
            let split_list = |s: &str| -> Vec<String> {
                s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
            };
            Some(ModuleSpec {
                id: parts[0].trim().to_string(),
                name: parts.get(1).unwrap_or(&"").trim().to_string(),
                owned_files: parts.get(2).map(|s| split_list(s)).unwrap_or_default(),
                test_files: parts.get(3).map(|s| split_list(s)).unwrap_or_default(),
                deps: parts.get(4).map(|s| split_list(s)).unwrap_or_default(),
            })
        })
        .collect()
}

pub async fn execute(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    let user_input = stage.context.get_str("user_input").unwrap_or_default().to_string();
    let project_root = stage
        .context
        .get_str("project_root")
        .map(PathBuf::from)
        .unwrap_or_else(|| services.project_root.clone());

    let agent_name = stage.context.get_str("agent_name").unwrap_or("manager-spec").to_string();
    let config = AgentConfig::new(
        agent_name,
        "You plan software changes. Describe acceptance criteria as EARS-tagged bullets \
         (- [UBIQ]/[EVENT]/[STATE]/[UNWNT]/[OPTNL]/[COMPLX] ...), list setup commands under \
         a SETUP_COMMANDS: heading, quality overrides under a QUALITY_CONFIG: heading, and \
         module ownership under a MODULES: heading as id|name|owned_files|test_files|deps.",
        "primary",
    );

    let mut agent = Agent::new(config, services.gateway.clone(), services.bus.clone(), project_root.clone(), Vec::new()).await;
    let raw_output = match agent.run(&user_input).await {
        Ok(text) => text,
        Err(err) => {
            if let Some(transient) = crate::tasks::transient_from_agent_error(&err) {
                return Err(transient);
            }
            return Ok(TaskResult::failed_continue(format!("planning agent failed: {err}")));
        }
    };

    let plan_config = parse_quality_config(&raw_output);
    let mut plan_config = PlanConfig {
        setup_commands: parse_setup_commands(&raw_output),
        ..plan_config
    };
    if plan_config.quality_threshold <= 0.0 {
        plan_config.quality_threshold = crate::quality::PASS_SCORE_THRESHOLD;
    }
    let acceptance_criteria = parse_acceptance_criteria(&raw_output);
    let modules = parse_modules(&raw_output);

    if !modules.is_empty() {
        if let Err(err) = validate_module_graph(&modules) {
            return Ok(TaskResult::failed_continue(format!("invalid module graph: {err}")));
        }
    }

    let mut outputs = BTreeMap::new();
    outputs.insert("plan_config".to_string(), serde_json::to_value(&plan_config).unwrap_or(Value::Null));
    outputs.insert("acceptance_criteria".to_string(), json!(acceptance_criteria));
    outputs.insert(
        "modules".to_string(),
        serde_json::to_value(&modules).unwrap_or(Value::Null),
    );
    outputs.insert("project_root".to_string(), json!(project_root.display().to_string()));
    outputs.insert("raw_plan".to_string(), json!(raw_output));

    Ok(TaskResult::success_with(outputs))
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
