use super::ExpressionError;

/// Binding name of the object from the incoming request.
pub const OBJECT: &str = "object";

/// Binding name of the policy's parameter resource.
pub const PARAMS: &str = "params";

/// Binding name of the namespace the object belongs to.
pub const NAMESPACE_OBJECT: &str = "namespaceObject";

/// Prefix under which policy variables are visible, as in `variables.replicas`.
pub const VARIABLES: &str = "variables";

/// The named values an expression is evaluated against.
///
/// Input documents are bound once when a run starts. Policy variables are then bound one at a
/// time as they are evaluated, keeping the engine's outcome as-is: a variable that failed keeps
/// its error so that later expressions consistently see the same entry.
#[derive(Debug, Clone)]
pub struct Bindings<V> {
    inputs: Vec<(String, V)>,
    variables: Vec<(String, Result<V, ExpressionError>)>,
}

impl<V> Bindings<V> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inputs: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Bind an input document, replacing any earlier binding with the same name.
    pub fn bind_input(&mut self, name: impl Into<String>, value: V) {
        upsert(&mut self.inputs, name.into(), value);
    }

    /// Bind the outcome of evaluating the policy variable `name`.
    pub fn bind_variable(&mut self, name: impl Into<String>, outcome: Result<V, ExpressionError>) {
        upsert(&mut self.variables, name.into(), outcome);
    }

    #[must_use]
    pub fn input(&self, name: &str) -> Option<&V> {
        lookup(&self.inputs, name)
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Result<V, ExpressionError>> {
        lookup(&self.variables, name)
    }

    /// Input bindings in the order they were first bound.
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &V)> {
        self.inputs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Variable bindings in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Result<V, ExpressionError>)> {
        self.variables.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }
}

impl<V> Default for Bindings<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, name: String, value: T) {
    if let Some(entry) = entries.iter_mut().find(|(existing, _)| *existing == name) {
        entry.1 = value;
    } else {
        entries.push((name, value));
    }
}

fn lookup<'a, T>(entries: &'a [(String, T)], name: &str) -> Option<&'a T> {
    entries.iter().find(|(existing, _)| existing == name).map(|(_, value)| value)
}
