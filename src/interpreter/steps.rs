//! Merging of incoming thinking-step updates.
//!
//! Later frames refine earlier steps rather than replacing them. A step
//! is located by identity (id if present, else title); its status moves
//! forward through the lattice only, and its description entries merge by
//! the same rule, recursively. An `Error` anywhere in a step's
//! description forces the step itself to `Error`.

use crate::models::{StepStatus, ThinkingStep};

/// Merge a batch of incoming steps into the accumulated list.
pub fn merge_steps(existing: &mut Vec<ThinkingStep>, incoming: Vec<ThinkingStep>) {
    for step in incoming {
        match existing.iter_mut().find(|e| e.same_identity(&step)) {
            Some(found) => merge_step(found, step),
            None => existing.push(normalized(step)),
        }
    }
    for step in existing.iter_mut() {
        propagate_child_errors(step);
    }
}

/// Merge one incoming update into an existing step.
fn merge_step(existing: &mut ThinkingStep, incoming: ThinkingStep) {
    if existing.id.is_none() {
        existing.id = incoming.id.clone();
    }
    // Status-only updates omit the title; never blank an existing one
    if !incoming.title.is_empty() {
        existing.title = incoming.title;
    }
    existing.status = existing.status.advance(incoming.status);
    merge_steps(&mut existing.description, incoming.description);
}

/// Apply the child-error rule to a freshly appended step as well.
fn normalized(mut step: ThinkingStep) -> ThinkingStep {
    propagate_child_errors(&mut step);
    step
}

fn propagate_child_errors(step: &mut ThinkingStep) {
    if step
        .description
        .iter()
        .any(|child| child.status == StepStatus::Error)
    {
        step.status = StepStatus::Error;
    }
}
