// storefront/src/state.rs

use crate::config::AppConfig;
use crate::errors::Result;
use crate::pipelines;
use crate::services::image_store::ImageStore;
use crate::store::Repository;
use std::sync::Arc;
use storefront_flow::FlowRegistry;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Repository>,
  pub images: Arc<dyn ImageStore>,
  pub flows: Arc<FlowRegistry<crate::errors::AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the collaborators together and registers every workflow pipeline.
  pub fn new(store: Arc<dyn Repository>, images: Arc<dyn ImageStore>, config: AppConfig) -> Result<Self> {
    let flows = FlowRegistry::new();
    pipelines::register_all_pipelines(&flows)?;
    Ok(Self {
      store,
      images,
      flows: Arc::new(flows),
      config: Arc::new(config),
    })
  }
}
