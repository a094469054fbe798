// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the standard ten-stage pipeline DAG for a user request: plan,
//! setup, write_tests, implement, validate, mutation, repair, quality,
//! review, watchdog. `repair` has no requisites of its own — it is reached
//! only by a `jump_to` from `validate` or `quality`, per the jump-based
//! back-edge design. `watchdog` likewise has no requisites: it runs
//! alongside `plan` from the first dispatch pass, observing the event bus
//! independently of the linear chain.

use std::path::Path;

use forge_core::{Stage, Workflow, WorkflowId};

/// Construct the standard pipeline for `request`, rooted at `project_root`.
pub fn standard_workflow(id: WorkflowId, request: &str, project_root: &Path) -> Workflow {
    let mut workflow = Workflow::new(id);

    let mut plan = Stage::new("plan", "plan", "Plan");
    plan.context.set("user_input", request.to_string());
    plan.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(plan);

    let mut setup = Stage::new("setup", "setup", "Setup").requires(["plan"]);
    setup.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(setup);

    let mut write_tests = Stage::new("write_tests", "write_tests", "Write tests").requires(["setup"]);
    write_tests.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(write_tests);

    let mut implement = Stage::new("implement", "implement", "Implement").requires(["write_tests"]);
    implement.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(implement);

    let mut validate = Stage::new("validate", "validate", "Validate").requires(["implement"]);
    validate.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(validate);

    let mut mutation = Stage::new("mutation", "mutation", "Mutation testing").requires(["validate"]);
    mutation.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(mutation);

    let mut repair = Stage::new("repair", "repair", "Repair");
    repair.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(repair);

    let mut quality = Stage::new("quality", "quality", "Quality gate").requires(["validate", "mutation"]);
    quality.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(quality);

    let mut review = Stage::new("review", "review", "Review").requires(["quality"]);
    review.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(review);

    let mut watchdog = Stage::new("watchdog", "watchdog", "Watchdog");
    watchdog.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(watchdog);

    workflow
}

/// A single-stage workflow that only runs the planner, for the `plan`
/// command — no implementation, tests, or validation.
pub fn plan_only_workflow(id: WorkflowId, request: &str, project_root: &Path) -> Workflow {
    let mut workflow = Workflow::new(id);
    let mut plan = Stage::new("plan", "plan", "Plan");
    plan.context.set("user_input", request.to_string());
    plan.context.set("project_root", project_root.display().to_string());
    workflow.add_stage(plan);
    workflow
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
