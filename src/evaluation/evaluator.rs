use super::{EvaluationResults, ItemOutcome, StageOutcome};
use crate::Result;
use crate::document::Document;
use crate::expr::{Bindings, ExpressionEngine, NAMESPACE_OBJECT, OBJECT, PARAMS};
use crate::matching::matches_constraints;
use crate::policy::{Validation, ValidatingAdmissionPolicy};
use crate::request::{AdmissionInputs, RequestContext};
use ohno::app_err;

const LOG_TARGET: &str = "      eval";

/// Evaluates a single policy against a single admission request.
///
/// An evaluator owns its policy, request context and engine, so independent evaluators can run
/// on different threads without sharing anything.
#[derive(Debug)]
pub struct AdmissionPolicyEvaluator<E> {
    policy: ValidatingAdmissionPolicy,
    context: RequestContext,
    engine: E,
}

impl<E: ExpressionEngine> AdmissionPolicyEvaluator<E> {
    /// Decode the raw inputs and prepare `engine` for the policy.
    ///
    /// # Errors
    ///
    /// Returns an error if any input cannot be decoded or a policy variable cannot be declared.
    pub fn new(inputs: &AdmissionInputs<'_>, engine: E) -> Result<Self> {
        let policy = ValidatingAdmissionPolicy::from_text(inputs.policy)?;
        let context = RequestContext::decode(inputs)?;
        Self::from_parts(policy, context, engine)
    }

    /// Prepare `engine` for an already decoded policy and request.
    ///
    /// # Errors
    ///
    /// Returns an error if a policy variable cannot be declared.
    pub fn from_parts(policy: ValidatingAdmissionPolicy, context: RequestContext, mut engine: E) -> Result<Self> {
        for variable in &policy.spec.variables {
            engine
                .declare_variable(&variable.name)
                .map_err(|e| app_err!("could not initialize variable {}: {e}", variable.name))?;
        }

        Ok(Self { policy, context, engine })
    }

    #[must_use]
    pub const fn policy(&self) -> &ValidatingAdmissionPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }

    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Whether the policy's resource rules apply to the request's object.
    #[must_use]
    pub fn check_match_constraints(&self) -> bool {
        matches_constraints(&self.context.object, &self.policy.spec.match_constraints.resource_rules)
    }

    /// Run the four evaluation stages, regardless of the match constraints.
    #[must_use]
    pub fn evaluate(&self) -> StageOutcome<E::Value> {
        let spec = &self.policy.spec;
        let mut bindings = self.seed_bindings();
        let mut outcome = StageOutcome::default();

        for variable in &spec.variables {
            let result = self.engine.evaluate_source(&variable.expression, &bindings);
            bindings.bind_variable(variable.name.clone(), result.clone());
            outcome.variables.push(ItemOutcome::new(&variable.name, result));
        }

        for condition in &spec.match_conditions {
            let result = self.engine.evaluate_source(&condition.expression, &bindings);
            outcome.match_conditions.push(ItemOutcome::new(&condition.name, result));
        }

        outcome.conditions_met = outcome
            .match_conditions
            .iter()
            .all(|condition| condition.outcome.as_ref().is_ok_and(|value| self.engine.is_true(value)));

        if !outcome.conditions_met {
            log::info!(target: LOG_TARGET, "Match conditions of '{}' not met, skipping validations", self.policy.display_name());
            return outcome;
        }

        for (index, validation) in spec.validations.iter().enumerate() {
            let result = self.engine.evaluate_source(&validation.expression, &bindings);
            let message = match &result {
                Ok(value) if !self.engine.is_true(value) => self.violation_message(validation, &bindings),
                _ => None,
            };

            let mut item = ItemOutcome::new((index + 1).to_string(), result).with_expression(&validation.expression);
            item.message = message;
            outcome.validations.push(item);
        }

        for annotation in &spec.audit_annotations {
            let result = self.engine.evaluate_source(&annotation.value_expression, &bindings);
            outcome
                .audit_annotations
                .push(ItemOutcome::new(&annotation.key, result).with_expression(&annotation.value_expression));
        }

        outcome
    }

    /// Check the match constraints and, when they apply, evaluate and report everything.
    #[must_use]
    pub fn run(&self) -> EvaluationResults {
        if !self.check_match_constraints() {
            log::info!(target: LOG_TARGET, "Policy '{}' does not apply to the object", self.policy.display_name());
            return EvaluationResults::default();
        }

        let outcome = self.evaluate();
        let results = EvaluationResults::from_outcome(&outcome, &self.engine);
        log::info!(target: LOG_TARGET, "Policy '{}' evaluated: {}", self.policy.display_name(), results.verdict());
        results
    }

    fn seed_bindings(&self) -> Bindings<E::Value> {
        let mut bindings = Bindings::new();
        bindings.bind_input(OBJECT, self.engine.import(&self.context.object));
        bindings.bind_input(PARAMS, self.engine.import(&self.context.params));
        bindings.bind_input(NAMESPACE_OBJECT, self.engine.import(&self.context.namespace_object));
        bindings
    }

    fn violation_message(&self, validation: &Validation, bindings: &Bindings<E::Value>) -> Option<E::Value> {
        if let Some(message) = validation.message.as_deref().filter(|message| !message.is_empty()) {
            return Some(self.engine.import(&Document::String(message.to_string())));
        }

        let expression = validation.message_expression.as_deref().filter(|expression| !expression.is_empty())?;
        match self.engine.evaluate_source(expression, bindings) {
            Ok(value) if !self.engine.is_unknown_or_error(&value) => Some(value),
            Ok(value) => {
                log::debug!(target: LOG_TARGET, "Message expression '{expression}' produced {value:?}, ignoring");
                None
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Message expression '{expression}' failed: {e}");
                None
            }
        }
    }
}
