//! The HTTP step as the workflow engine sees it: resolve, then execute.

use stepcall_api::ClientConfigError;
use stepcall_types::{RuntimeParams, StepInput, StepResponse};
use tracing::info;

use crate::{error::StepError, executor::RequestExecutor, input::InputResolver};

/// Composes input resolution and request execution.
#[derive(Clone)]
pub struct HttpStep {
    resolver: InputResolver,
    executor: RequestExecutor,
}

impl HttpStep {
    pub fn new(resolver: InputResolver, executor: RequestExecutor) -> Self {
        Self { resolver, executor }
    }

    /// Default resolver plus an executor configured from the environment.
    pub fn from_env() -> Result<Self, ClientConfigError> {
        Ok(Self::new(InputResolver::default(), RequestExecutor::from_env()?))
    }

    /// Resolve `input` against `params` and perform the call.
    pub fn run(&self, input: &StepInput, params: &RuntimeParams) -> Result<StepResponse, StepError> {
        let resolved = self.resolver.resolve(input, params)?;
        self.executor.execute(&resolved)
    }

    /// Like [`run`](Self::run), and store the response under `step_id` so later
    /// steps can reference `${{ <step_id>.body... }}`.
    ///
    /// On error `params` is left unchanged.
    pub fn run_and_record(&self, step_id: &str, input: &StepInput, params: &mut RuntimeParams) -> Result<StepResponse, StepError> {
        let response = self.run(input, params)?;
        info!(step = %step_id, status = response.status, "http step completed");
        params.insert(step_id.to_string(), response.clone().into_value());
        Ok(response)
    }
}
