// src/lib.rs

//! Async step pipelines.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step can carry `before`, `on` and
//! `after` handlers, can be optional, and can be skipped by a condition evaluated against the
//! shared [`ContextData`]. A [`FlowRegistry`] keeps one pipeline per context type so callers can
//! run a flow by handing over its context.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
