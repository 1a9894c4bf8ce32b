use lambda_runtime::Context;
use serde::Serialize;

const MISSING_VALUE: &str = "unknown";

/// This id is used for tracing and log correlation.
pub trait InvocationId {
    fn invocation_id(&self) -> &str;
}

/// Identifies a single run of the workflow.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InvocationContext {
    request_id: String,
    function_arn: String,
    region: String,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>, function_arn: impl Into<String>) -> Self {
        let function_arn: String = function_arn.into();
        // arn:aws:lambda:<region>:<account>:function:<name>
        let region: String = function_arn
            .split(':')
            .nth(3)
            .filter(|region| !region.is_empty())
            .unwrap_or(MISSING_VALUE)
            .to_string();

        InvocationContext {
            request_id: request_id.into(),
            function_arn,
            region,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn function_arn(&self) -> &str {
        &self.function_arn
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl From<&Context> for InvocationContext {
    fn from(context: &Context) -> Self {
        InvocationContext::new(
            context.request_id.clone(),
            context.invoked_function_arn.clone(),
        )
    }
}

impl InvocationId for InvocationContext {
    fn invocation_id(&self) -> &str {
        &self.request_id
    }
}
