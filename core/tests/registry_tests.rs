// tests/registry_tests.rs
mod common;

use common::*;
use storefront_flow::{ContextData, FlowError, FlowRegistry, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct AlphaContext {
  val: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct BetaContext {
  num: i32,
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  let mut alpha = Pipeline::<AlphaContext, TestError>::new("alpha", &[("alpha_task", false, None)]).unwrap();
  alpha
    .on("alpha_task", |ctx: ContextData<AlphaContext>| async move {
      ctx.write().val = "alpha_processed".to_string();
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
    .unwrap();
  registry.register_pipeline(alpha);

  let mut beta = Pipeline::<BetaContext, TestError>::new("beta", &[("beta_task", false, None)]).unwrap();
  beta
    .on("beta_task", |ctx: ContextData<BetaContext>| async move {
      ctx.write().num = 100;
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
    .unwrap();
  registry.register_pipeline(beta);

  assert!(registry.is_registered::<AlphaContext>());
  assert!(registry.is_registered::<BetaContext>());

  let ctx_alpha = ContextData::new(AlphaContext::default());
  assert_eq!(registry.run(ctx_alpha.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx_alpha.read().val, "alpha_processed");

  let ctx_beta = ContextData::new(BetaContext::default());
  assert_eq!(registry.run(ctx_beta.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx_beta.read().num, 100);
}

#[tokio::test]
async fn unregistered_context_type_is_reported() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  #[derive(Clone, Debug, Default)]
  struct UnregisteredContext;

  let result = registry.run(ContextData::new(UnregisteredContext)).await;

  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("NotRegistered"));
      assert!(s.contains("UnregisteredContext"));
    }
    other => panic!("Expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn handler_errors_surface_as_registry_error() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let mut pipeline = Pipeline::<AlphaContext, TestError>::new("failing", &[("explode", false, None)]).unwrap();
  pipeline
    .on("explode", |_ctx: ContextData<AlphaContext>| async move {
      Err::<PipelineControl, _>(TestError::Handler("boom".to_string()))
    })
    .unwrap();
  registry.register_pipeline(pipeline);

  let result = registry.run(ContextData::new(AlphaContext::default())).await;
  assert_eq!(result.unwrap_err(), TestError::Handler("boom".to_string()));
}

#[tokio::test]
async fn anyhow_errors_convert_into_flow_errors() {
  let wrapped: FlowError = anyhow::anyhow!("disk full").into();
  assert!(matches!(wrapped, FlowError::HandlerError { .. }));

  let round_trip: FlowError = anyhow::Error::new(FlowError::StepNotFound {
    step_name: "x".to_string(),
  })
  .into();
  assert!(matches!(round_trip, FlowError::StepNotFound { .. }));
}
