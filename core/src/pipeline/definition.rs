// src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its construction.

use crate::core::context::Handler;
use crate::core::step::{SkipCondition, StepDef};
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;

/// Step tuple accepted by [`Pipeline::new`]: `(name, optional, skip_if)`.
pub type StepSpec<'a, TData> = (&'a str, bool, Option<SkipCondition<TData>>);

/// An ordered set of named steps over a root data type `TData`.
///
/// Handlers return `Result<_, Err>`; framework failures (missing handlers and the like) reach
/// the caller through `Err: From<FlowError>`.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from its step list. Step names must be unique.
  pub fn new(name: &str, step_defs: &[StepSpec<'_, TData>]) -> FlowResult<Self> {
    let mut steps: Vec<StepDef<TData>> = Vec::with_capacity(step_defs.len());
    for (step_name, optional, skip_if) in step_defs {
      if steps.iter().any(|s| s.name == *step_name) {
        return Err(FlowError::DuplicateStep {
          step_name: (*step_name).to_string(),
        });
      }
      steps.push(StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      });
    }

    Ok(Self {
      name: name.to_string(),
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|s| s.name.as_str())
  }

  pub(crate) fn ensure_step_exists(&self, step_name: &str) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      Ok(())
    } else {
      Err(FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
    }
  }

  pub(crate) fn has_handlers(&self, step_name: &str) -> bool {
    [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name).is_some_and(|handlers| !handlers.is_empty()))
  }
}
