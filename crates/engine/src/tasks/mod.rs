// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage Task dispatch: one flat function table keyed by `stage_type`,
//! matching the dispatch style already used for gateway backends — no
//! trait object per task, just a match over a small closed set of names.

pub mod implement;
pub mod mutation;
pub mod plan;
pub mod quality_task;
pub mod repair;
pub mod review;
pub mod setup;
pub mod validate;
pub mod validate_helpers;
pub mod watchdog;
pub mod write_tests;

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use forge_core::{ErrorClass, Stage, StageContext, TaskOutcome, TaskResult, TransientError};

use crate::services::EngineServices;

/// Fallback retry delay when a gateway status error carries no `Retry-After`.
const DEFAULT_TRANSIENT_RETRY_SECS: u64 = 10;

/// Run the Task implementation selected by `stage.stage_type`.
pub async fn execute_stage(stage: &Stage, services: &EngineServices) -> TaskOutcome {
    match stage.stage_type.as_str() {
        "plan" => plan::execute(stage, services).await,
        "setup" => setup::execute(stage, services).await,
        "write_tests" => write_tests::execute(stage, services).await,
        "implement" => implement::execute(stage, services).await,
        "validate" => validate::execute(stage, services).await,
        "repair" => repair::execute(stage, services).await,
        "mutation" => mutation::execute(stage, services).await,
        "quality" => quality_task::execute(stage, services).await,
        "review" => review::execute(stage, services).await,
        "watchdog" => watchdog::execute(stage, services).await,
        other => Ok(TaskResult::terminal(format!("unknown stage type: {other}"))),
    }
}

/// Classify an agent failure as transient (worth a queued retry at the
/// workflow level) or permanent. `AgentError` wraps exactly one failure kind
/// today — a gateway error — so this just forwards `GatewayError::class()`.
pub fn transient_from_agent_error(err: &forge_agent::AgentError) -> Option<TransientError> {
    let forge_agent::AgentError::Gateway(gateway_err) = err;
    match gateway_err.class() {
        ErrorClass::Connection | ErrorClass::Server | ErrorClass::RateLimit => {
            let retry_after = gateway_err
                .retry_after_secs()
                .map(Duration::from_secs)
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TRANSIENT_RETRY_SECS));
            Some(TransientError::new(retry_after, gateway_err.to_string()))
        }
        ErrorClass::Auth | ErrorClass::Permanent => None,
    }
}

/// True while `_jump_count` (read from `context`, defaulting to 0) is still
/// below `max_jumps`. Must be checked before every jump decision: the
/// counter itself is only ever incremented by [`increment_jump_count`].
pub fn check_jump_limit(context: &StageContext, max_jumps: u32) -> bool {
    context.get_u32("_jump_count").unwrap_or(0) < max_jumps
}

/// Bump the jump counter in a set of jump overrides. Must be called after
/// [`forge_core::build_jump_overrides`] copies the allow-listed keys from
/// the source context (never before) so a stale copied value can't
/// clobber the increment.
pub fn increment_jump_count(overrides: &mut BTreeMap<String, Value>, current_context: &StageContext) -> u32 {
    let next = current_context.get_u32("_jump_count").unwrap_or(0) + 1;
    overrides.insert("_jump_count".to_string(), Value::from(next));
    next
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
