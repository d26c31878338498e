//! A test double standing in for a real expression language.

use super::{Bindings, ExpressionEngine, ExpressionError, ExpressionStage, VARIABLES};
use crate::document::Document;
use core::cell::RefCell;
use std::collections::HashMap;

/// Marker value the scripted engine treats as an engine-level unknown.
pub(crate) const UNKNOWN: &str = "$unknown";

/// Engine whose behavior is scripted per expression source.
///
/// Scripted expressions return their canned value or fail at the scripted stage. Any other
/// source is parsed as a JSON literal if possible and otherwise resolved as a dotted path such
/// as `object.spec.replicas` or `variables.replicas` against the bindings.
#[derive(Debug, Default)]
pub(crate) struct ScriptedEngine {
    script: HashMap<String, Result<Document, ExpressionError>>,
    rejected_declarations: Vec<String>,
    declared: Vec<String>,
    evaluated: RefCell<Vec<String>>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn returning(mut self, expression: &str, value: Document) -> Self {
        let _ = self.script.insert(expression.to_string(), Ok(value));
        self
    }

    pub(crate) fn failing(mut self, expression: &str, stage: ExpressionStage, message: &str) -> Self {
        let _ = self.script.insert(expression.to_string(), Err(ExpressionError::new(stage, message)));
        self
    }

    pub(crate) fn returning_unknown(self, expression: &str) -> Self {
        self.returning(expression, Document::String(UNKNOWN.to_string()))
    }

    pub(crate) fn rejecting_declaration(mut self, name: &str) -> Self {
        self.rejected_declarations.push(name.to_string());
        self
    }

    pub(crate) fn declared(&self) -> &[String] {
        &self.declared
    }

    /// Every expression evaluated so far, in order.
    pub(crate) fn evaluated(&self) -> Vec<String> {
        self.evaluated.borrow().clone()
    }

    fn resolve(path: &str, bindings: &Bindings<Document>) -> Result<Document, ExpressionError> {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();

        let mut current = if root == VARIABLES {
            let name = segments.next().unwrap_or_default();
            match bindings.variable(name) {
                Some(Ok(value)) => value.clone(),
                Some(Err(e)) => return Err(e.clone()),
                None => return Err(ExpressionError::evaluate(format!("No such key: {name}"))),
            }
        } else {
            bindings
                .input(root)
                .cloned()
                .ok_or_else(|| ExpressionError::evaluate(format!("Undeclared reference to '{root}'")))?
        };

        for segment in segments {
            current = current
                .get(segment)
                .cloned()
                .ok_or_else(|| ExpressionError::evaluate(format!("No such key: {segment}")))?;
        }

        Ok(current)
    }

    fn scripted_failure(&self, expression: &str, stage: ExpressionStage) -> Result<(), ExpressionError> {
        match self.script.get(expression) {
            Some(Err(e)) if e.stage() == stage => Err(e.clone()),
            _ => Ok(()),
        }
    }
}

impl ExpressionEngine for ScriptedEngine {
    type Ast = String;
    type Program = String;
    type Value = Document;

    fn declare_variable(&mut self, name: &str) -> Result<(), ExpressionError> {
        if self.rejected_declarations.iter().any(|rejected| rejected == name) {
            return Err(ExpressionError::compile(format!("rejected declaration '{name}'")));
        }

        self.declared.push(name.to_string());
        Ok(())
    }

    fn parse(&self, expression: &str) -> Result<String, ExpressionError> {
        self.scripted_failure(expression, ExpressionStage::Parse)?;
        Ok(expression.to_string())
    }

    fn compile(&self, ast: String) -> Result<String, ExpressionError> {
        self.scripted_failure(&ast, ExpressionStage::Compile)?;
        Ok(ast)
    }

    fn evaluate(&self, program: &String, bindings: &Bindings<Document>) -> Result<Document, ExpressionError> {
        self.evaluated.borrow_mut().push(program.clone());

        match self.script.get(program) {
            Some(outcome) => outcome.clone(),
            None => serde_json::from_str(program).or_else(|_| Self::resolve(program, bindings)),
        }
    }

    fn import(&self, document: &Document) -> Document {
        document.clone()
    }

    fn export(&self, value: &Document) -> Document {
        if self.is_unknown_or_error(value) {
            Document::String("unknown".to_string())
        } else {
            value.clone()
        }
    }

    fn is_true(&self, value: &Document) -> bool {
        *value == Document::Bool(true)
    }

    fn is_unknown_or_error(&self, value: &Document) -> bool {
        value.as_str() == Some(UNKNOWN)
    }
}
