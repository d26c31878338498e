use core::fmt;
use strum::Display;

/// The step at which an expression failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExpressionStage {
    Parse,
    Compile,
    Evaluate,
}

/// A failure confined to a single expression.
///
/// These never abort a run; they are reported in the `error` field of the expression's result.
/// Only the message is displayed, matching what a policy author sees from the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError {
    stage: ExpressionStage,
    message: String,
}

impl ExpressionError {
    #[must_use]
    pub fn new(stage: ExpressionStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ExpressionStage::Parse, message)
    }

    #[must_use]
    pub fn compile(message: impl Into<String>) -> Self {
        Self::new(ExpressionStage::Compile, message)
    }

    #[must_use]
    pub fn evaluate(message: impl Into<String>) -> Self {
        Self::new(ExpressionStage::Evaluate, message)
    }

    #[must_use]
    pub const fn stage(&self) -> ExpressionStage {
        self.stage
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl core::error::Error for ExpressionError {}
