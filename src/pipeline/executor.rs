// Ordered step runner with short-circuit semantics

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use crate::pipeline::context::RequestContext;
use crate::pipeline::responses::internal_failure;
use crate::pipeline::step::StepBox;
use crate::types::FrontendResponse;

/// A fixed, statically ordered list of steps for one request method
pub struct Pipeline {
    name: &'static str,
    steps: Vec<StepBox>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn register_step(&mut self, step: StepBox) {
        tracing::debug!("Registered step '{}' in pipeline '{}'", step.name(), self.name);
        self.steps.push(step);
    }

    pub fn with_step(mut self, step: StepBox) -> Self {
        self.register_step(step);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs steps in order until one sets a response. Step errors and panics
    /// become a 500; a chain that ends without a response is also a 500.
    pub async fn run(&self, ctx: &mut RequestContext) -> FrontendResponse {
        tracing::debug!(
            "Pipeline '{}' starting: {} {} - {}",
            self.name,
            ctx.method,
            ctx.frontend_request.path,
            ctx.trace_id()
        );

        for step in &self.steps {
            if ctx.is_terminal() {
                break;
            }

            let step_start = Instant::now();
            let outcome = AssertUnwindSafe(step.execute(ctx)).catch_unwind().await;
            let elapsed = step_start.elapsed();

            match outcome {
                Ok(Ok(())) => {
                    tracing::debug!("Step: {} completed in {:?}", step.name(), elapsed);
                    if let Some(response) = &ctx.frontend_response {
                        tracing::debug!(
                            "Step: {} short-circuited with status {} - {}",
                            step.name(),
                            response.status_code,
                            ctx.trace_id()
                        );
                    }
                }
                Ok(Err(error)) => {
                    tracing::error!(
                        "Step: {} failed in {:?}: {} - {}",
                        step.name(),
                        elapsed,
                        error,
                        ctx.trace_id()
                    );
                    let response = internal_failure("An unexpected error occurred", ctx.trace_id());
                    ctx.respond(response);
                }
                Err(_panic) => {
                    tracing::error!("Step: {} panicked - {}", step.name(), ctx.trace_id());
                    let response = internal_failure("An unexpected error occurred", ctx.trace_id());
                    ctx.respond(response);
                }
            }
        }

        match ctx.frontend_response.take() {
            Some(response) => {
                tracing::debug!(
                    "Pipeline '{}' finished with status {} in {:?}",
                    self.name,
                    response.status_code,
                    ctx.execution_time()
                );
                response
            }
            None => {
                tracing::error!(
                    "Pipeline '{}' ended without a response - {}",
                    self.name,
                    ctx.trace_id()
                );
                internal_failure("The request was not handled", ctx.trace_id())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::PipelineError;
    use crate::pipeline::step::PipelineStep;
    use crate::types::{FrontendRequest, RequestMethod};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl PipelineStep for Counting {
        fn name(&self) -> &'static str {
            "Counting"
        }

        async fn execute(&self, _ctx: &mut RequestContext) -> Result<(), PipelineError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Respond(u16);

    #[async_trait]
    impl PipelineStep for Respond {
        fn name(&self) -> &'static str {
            "Respond"
        }

        async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
            ctx.respond(FrontendResponse::new(self.0, None));
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl PipelineStep for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        async fn execute(&self, _ctx: &mut RequestContext) -> Result<(), PipelineError> {
            Err(PipelineError::Internal("boom".into()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl PipelineStep for Panicking {
        fn name(&self) -> &'static str {
            "Panicking"
        }

        async fn execute(&self, _ctx: &mut RequestContext) -> Result<(), PipelineError> {
            panic!("unexpected")
        }
    }

    fn context() -> RequestContext {
        RequestContext::new(FrontendRequest::new(RequestMethod::Get, "/ed-fi/schools"))
    }

    #[tokio::test]
    async fn test_short_circuit_skips_later_steps() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("test")
            .with_step(Box::new(Counting(counter.clone())))
            .with_step(Box::new(Respond(404)))
            .with_step(Box::new(Counting(counter.clone())));

        let response = pipeline.run(&mut context()).await;
        assert_eq!(response.status_code, 404);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_step_error_becomes_500() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("test")
            .with_step(Box::new(Failing))
            .with_step(Box::new(Counting(counter.clone())));

        let mut ctx = context();
        let trace = ctx.trace_id().0.clone();
        let response = pipeline.run(&mut ctx).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body.unwrap()["correlationId"], trace);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let pipeline = Pipeline::new("test").with_step(Box::new(Panicking));
        let response = pipeline.run(&mut context()).await;
        assert_eq!(response.status_code, 500);
    }

    #[tokio::test]
    async fn test_missing_response_becomes_500() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new("test").with_step(Box::new(Counting(counter)));
        let response = pipeline.run(&mut context()).await;
        assert_eq!(response.status_code, 500);
    }
}
