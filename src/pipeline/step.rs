use async_trait::async_trait;

use crate::pipeline::context::RequestContext;
use crate::pipeline::error::PipelineError;

/// One link of a request pipeline. A step either mutates the context and
/// returns, letting the executor move on, or sets a terminal response.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Step name for logging and debugging
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError>;
}

pub type StepBox = Box<dyn PipelineStep>;
