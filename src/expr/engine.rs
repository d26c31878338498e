use super::{Bindings, ExpressionError};
use crate::document::Document;
use core::fmt::Debug;

const LOG_TARGET: &str = "      expr";

/// An expression language the evaluation pipeline can run policy expressions with.
///
/// The pipeline depends only on this contract, so any engine able to parse, compile and
/// evaluate expressions against named bindings can be substituted, including scripted test
/// doubles.
pub trait ExpressionEngine {
    /// Parsed but not yet compiled expression
    type Ast;

    /// Compiled expression, ready for evaluation
    type Program;

    /// Values produced by evaluation and accepted as bindings
    type Value: Clone + Debug;

    /// Declare a policy variable so expressions may refer to it as `variables.<name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name cannot be declared, for example because it is not a valid
    /// identifier or is already declared.
    fn declare_variable(&mut self, name: &str) -> Result<(), ExpressionError>;

    /// Parse source text.
    ///
    /// # Errors
    ///
    /// Returns an error describing the syntax problem.
    fn parse(&self, expression: &str) -> Result<Self::Ast, ExpressionError>;

    /// Compile a parsed expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is rejected by the engine's checks.
    fn compile(&self, ast: Self::Ast) -> Result<Self::Program, ExpressionError>;

    /// Evaluate a compiled expression against `bindings`.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails at runtime.
    fn evaluate(&self, program: &Self::Program, bindings: &Bindings<Self::Value>) -> Result<Self::Value, ExpressionError>;

    /// Convert a decoded input document into an engine value.
    fn import(&self, document: &Document) -> Self::Value;

    /// Convert an engine value into a document for reporting.
    ///
    /// Values without a natural document form, including any internal error or unknown markers,
    /// must come out as plain strings.
    fn export(&self, value: &Self::Value) -> Document;

    /// Whether `value` is exactly the boolean `true`.
    fn is_true(&self, value: &Self::Value) -> bool;

    /// Whether `value` is an engine-level unknown or error marker rather than an ordinary value.
    fn is_unknown_or_error(&self, _value: &Self::Value) -> bool {
        false
    }

    /// Parse, compile and evaluate `expression` in one go.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever step failed first.
    fn evaluate_source(&self, expression: &str, bindings: &Bindings<Self::Value>) -> Result<Self::Value, ExpressionError> {
        let ast = self.parse(expression).inspect_err(|e| log::debug!(target: LOG_TARGET, "Parse: {e}"))?;
        let program = self.compile(ast).inspect_err(|e| log::debug!(target: LOG_TARGET, "Program: {e}"))?;
        self.evaluate(&program, bindings)
            .inspect_err(|e| log::debug!(target: LOG_TARGET, "Eval: {e}"))
    }
}
