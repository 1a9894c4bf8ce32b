use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The steps of the workflow, in the order they run.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Compute,
    Storage,
    MessageProcessing,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Compute => "compute",
            StepName::Storage => "storage",
            StepName::MessageProcessing => "message_processing",
        }
    }
}

impl Display for StepName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
