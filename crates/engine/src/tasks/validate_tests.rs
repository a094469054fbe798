// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use super::*;
use forge_core::{EngineConfig, EventBus, FakeClock, StageContext};
use forge_gateway::Gateway;
use forge_storage::Store;

fn stage_with_context(ctx: StageContext) -> Stage {
    let mut stage = Stage::new("validate", "validate", "Validate");
    stage.context = ctx;
    stage
}

fn services() -> EngineServices {
    let home = tempfile::tempdir().unwrap();
    let bus = EventBus::new();
    let clock = FakeClock::new(1_000);
    let gateway = Gateway::new(home.path(), bus.clone(), clock.clone()).unwrap();
    let store = Store::open_in_memory().unwrap();
    EngineServices::new(Arc::new(gateway), bus, Arc::new(store), EngineConfig::default(), home.path().to_path_buf(), clock)
}

#[tokio::test]
async fn first_failure_jumps_to_repair_with_incremented_repair_attempt() {
    let mut ctx = StageContext::new();
    ctx.set("repair_attempt", 0u64);
    ctx.set("_jump_count", 0u64);
    let stage = stage_with_context(ctx);

    let outcome = handle_failure(&stage, &services(), RunOutcome { failure_type: Some("test"), output: "boom".to_string() }, 0, 5, 0, 2)
        .await
        .unwrap();

    match outcome {
        TaskResult::JumpTo { target_ref, context_overrides } => {
            assert_eq!(target_ref, "repair");
            assert_eq!(context_overrides.get("repair_attempt").and_then(Value::as_u64), Some(1));
            assert_eq!(context_overrides.get("_jump_count").and_then(Value::as_u64), Some(1));
            assert_eq!(context_overrides.get("tests_passed").and_then(Value::as_bool), Some(false));
        }
        other => panic!("expected JumpTo, got {other:?}"),
    }
}

#[tokio::test]
async fn exhausting_max_attempts_without_reimplementation_budget_fails_continue() {
    let mut ctx = StageContext::new();
    ctx.set("repair_attempt", 5u64);
    let stage = stage_with_context(ctx);

    let outcome = handle_failure(&stage, &services(), RunOutcome { failure_type: Some("test"), output: "still broken".to_string() }, 5, 5, 2, 2)
        .await
        .unwrap();

    match outcome {
        TaskResult::FailedContinue { outputs, .. } => {
            assert_eq!(outputs.get("repeated_failure").and_then(Value::as_bool), Some(true));
        }
        other => panic!("expected FailedContinue, got {other:?}"),
    }
}

#[tokio::test]
async fn exhausting_max_attempts_with_reimplementation_budget_jumps_to_implement() {
    let stage = stage_with_context(StageContext::new());

    let outcome = handle_failure(&stage, &services(), RunOutcome { failure_type: Some("test"), output: "still broken".to_string() }, 5, 5, 0, 2)
        .await
        .unwrap();

    match outcome {
        TaskResult::JumpTo { target_ref, context_overrides } => {
            assert_eq!(target_ref, "implement");
            assert_eq!(context_overrides.get("reimplementation_count").and_then(Value::as_u64), Some(1));
            assert_eq!(context_overrides.get("repair_attempt").and_then(Value::as_u64), Some(0));
        }
        other => panic!("expected JumpTo, got {other:?}"),
    }
}

#[tokio::test]
async fn jump_limit_reached_short_circuits_before_any_command_runs() {
    let mut ctx = StageContext::new();
    ctx.set("_jump_count", 50u64);
    let stage = stage_with_context(ctx);

    assert!(!crate::tasks::check_jump_limit(&stage.context, 50));
}
