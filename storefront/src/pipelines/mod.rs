// storefront/src/pipelines/mod.rs

//! Defines and registers the workflow pipelines used by the storefront.

use crate::errors::AppError;
use storefront_flow::{FlowRegistry, FlowResult};

pub mod contexts;
pub mod login_pipeline;
pub mod registration_pipeline;

/// Registers every pipeline with the registry. Called once while building `AppState`.
pub fn register_all_pipelines(flows: &FlowRegistry<AppError>) -> FlowResult<()> {
  tracing::info!("Registering workflow pipelines...");
  flows.register_pipeline(registration_pipeline::build_registration_pipeline()?);
  flows.register_pipeline(login_pipeline::build_login_pipeline()?);
  tracing::info!("All application pipelines registered.");
  Ok(())
}
