use crate::runtime::WorkflowRuntime;
use lambda_runtime::LambdaEvent;
use model::invocation::InvocationContext;
use model::{Error, IncomingEvent, InvocationResponse, WorkflowResult};

pub mod config;
pub mod runtime;
pub mod steps;

/// Handles one Lambda invocation, designed for use with `lambda_runtime::run()`.
///
/// ```ignore
/// use lambda_runtime::{service_fn, LambdaEvent};
/// use model::{Error, IncomingEvent};
/// use workflow::invocation_fn;
/// use workflow::runtime::WorkflowRuntime;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let runtime: WorkflowRuntime = build_runtime().await?;
///
///     lambda_runtime::run(service_fn(|event: LambdaEvent<IncomingEvent>| {
///         invocation_fn(&runtime, event)
///     }))
///     .await
/// }
/// ```
pub async fn invocation_fn(
    runtime: &WorkflowRuntime,
    event: LambdaEvent<IncomingEvent>,
) -> Result<InvocationResponse, Error> {
    let ctx: InvocationContext = InvocationContext::from(&event.context);
    let result: WorkflowResult = runtime.run(&event.payload, &ctx).await?;

    InvocationResponse::ok(&result)
}
