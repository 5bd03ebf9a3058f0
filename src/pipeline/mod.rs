//! Request pipelines: an ordered chain of steps per HTTP method, sharing one
//! mutable [`RequestContext`]. The first step to set a response ends the chain.

pub mod context;
pub mod error;
pub mod executor;
pub mod responses;
pub mod step;
pub mod steps;

pub use context::RequestContext;
pub use error::PipelineError;
pub use executor::Pipeline;
pub use step::{PipelineStep, StepBox};
