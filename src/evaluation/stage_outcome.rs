use crate::expr::ExpressionError;

/// The engine's outcome for a single policy item.
#[derive(Debug, Clone)]
pub struct ItemOutcome<V> {
    /// Variable or match condition name, validation ordinal, or audit annotation key
    pub name: String,

    /// Source text, reported for validations and audit annotations only
    pub expression: Option<String>,

    pub outcome: Result<V, ExpressionError>,

    /// Violation message, for validations that did not hold
    pub message: Option<V>,
}

impl<V> ItemOutcome<V> {
    #[must_use]
    pub fn new(name: impl Into<String>, outcome: Result<V, ExpressionError>) -> Self {
        Self {
            name: name.into(),
            expression: None,
            outcome,
            message: None,
        }
    }

    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

/// Everything the evaluation stages produced, still in the engine's own value type.
#[derive(Debug, Clone)]
pub struct StageOutcome<V> {
    pub variables: Vec<ItemOutcome<V>>,
    pub match_conditions: Vec<ItemOutcome<V>>,

    /// Whether every match condition evaluated to exactly `true`
    pub conditions_met: bool,

    /// Empty when `conditions_met` is false
    pub validations: Vec<ItemOutcome<V>>,

    /// Empty when `conditions_met` is false
    pub audit_annotations: Vec<ItemOutcome<V>>,
}

impl<V> Default for StageOutcome<V> {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            match_conditions: Vec::new(),
            conditions_met: true,
            validations: Vec::new(),
            audit_annotations: Vec::new(),
        }
    }
}
