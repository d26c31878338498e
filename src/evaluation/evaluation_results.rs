use super::{EvalResult, ItemOutcome, StageOutcome, Verdict};
use crate::expr::ExpressionEngine;
use serde::{Deserialize, Serialize};

/// The complete, reportable outcome of a run.
///
/// Empty lists and a missing error are left out when serialized; `matchConstraints` is always
/// present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResults {
    /// Why the run could not start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<EvalResult>,

    /// Whether the policy's resource rules apply to the object
    #[serde(default)]
    pub match_constraints: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_conditions: Vec<EvalResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<EvalResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_annotations: Vec<EvalResult>,
}

impl EvaluationResults {
    /// Results for a run that could not start.
    #[must_use]
    pub fn failure(error: &ohno::AppError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// Results for a run whose match constraints applied.
    #[must_use]
    pub fn from_outcome<E: ExpressionEngine>(outcome: &StageOutcome<E::Value>, engine: &E) -> Self {
        Self {
            error: None,
            variables: export_items(&outcome.variables, engine),
            match_constraints: true,
            match_conditions: export_items(&outcome.match_conditions, engine),
            validations: export_items(&outcome.validations, engine),
            audit_annotations: export_items(&outcome.audit_annotations, engine),
        }
    }

    /// Overall reading of the results.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.error.is_some() {
            Verdict::Error
        } else if !self.match_constraints {
            Verdict::NotMatched
        } else if !self.match_conditions.iter().all(EvalResult::is_true) {
            Verdict::ConditionsNotMet
        } else if self.validations.iter().all(EvalResult::is_true) {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }

    /// Serialize to a JSON document.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "error": format!("failed to serialize evaluation results: {e}"),
                "matchConstraints": self.match_constraints,
            })
            .to_string()
        })
    }
}

fn export_items<E: ExpressionEngine>(items: &[ItemOutcome<E::Value>], engine: &E) -> Vec<EvalResult> {
    items.iter().map(|item| EvalResult::from_item(item, engine)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExpressionError;
    use crate::expr::scripted_engine::ScriptedEngine;
    use serde_json::json;

    fn passing(name: &str) -> EvalResult {
        EvalResult {
            name: name.to_string(),
            result: Some(json!(true)),
            ..EvalResult::default()
        }
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        assert_eq!(EvaluationResults::default().to_json(), r#"{"matchConstraints":false}"#);
    }

    #[test]
    fn test_failure_reports_only_the_error() {
        let results = EvaluationResults::failure(&ohno::app_err!("failed to parse object YAML: bad indent"));
        let parsed: serde_json::Value = serde_json::from_str(&results.to_json()).unwrap();

        assert!(parsed["error"].as_str().unwrap().contains("failed to parse object YAML: bad indent"));
        assert_eq!(parsed["matchConstraints"], json!(false));
        assert!(parsed.get("variables").is_none());
        assert_eq!(results.verdict(), Verdict::Error);
    }

    #[test]
    fn test_from_outcome_exports_values() {
        let engine = ScriptedEngine::new();
        let outcome = StageOutcome {
            variables: vec![
                ItemOutcome::new("replicas", Ok(json!(3))),
                ItemOutcome::new("broken", Err(ExpressionError::evaluate("No such key: spec"))),
            ],
            validations: vec![{
                let mut item = ItemOutcome::new("1", Ok(json!(false))).with_expression("object.spec.replicas > 5");
                item.message = Some(json!("too few replicas"));
                item
            }],
            audit_annotations: vec![ItemOutcome::new("level", Ok(json!("$unknown"))).with_expression("params.level")],
            ..StageOutcome::default()
        };

        let results = EvaluationResults::from_outcome(&outcome, &engine);
        let parsed: serde_json::Value = serde_json::from_str(&results.to_json()).unwrap();

        assert_eq!(
            parsed,
            json!({
                "variables": [
                    {"name": "replicas", "result": 3},
                    {"name": "broken", "error": "No such key: spec"},
                ],
                "matchConstraints": true,
                "validations": [
                    {"name": "1", "expression": "object.spec.replicas > 5", "result": false, "message": "too few replicas"},
                ],
                "auditAnnotations": [
                    {"name": "level", "expression": "params.level", "result": "unknown"},
                ],
            })
        );
        assert_eq!(results.verdict(), Verdict::Invalid);
    }

    #[test]
    fn test_null_results_are_kept() {
        let result = EvalResult {
            name: "nothing".to_string(),
            result: Some(serde_json::Value::Null),
            ..EvalResult::default()
        };

        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"name":"nothing","result":null}"#);
    }

    #[test]
    fn test_verdicts() {
        let mut results = EvaluationResults {
            match_constraints: true,
            match_conditions: vec![passing("first")],
            validations: vec![passing("1")],
            ..EvaluationResults::default()
        };
        assert_eq!(results.verdict(), Verdict::Valid);

        results.validations.push(EvalResult {
            name: "2".to_string(),
            error: Some("no such key".to_string()),
            ..EvalResult::default()
        });
        assert_eq!(results.verdict(), Verdict::Invalid);

        results.match_conditions.push(EvalResult {
            name: "second".to_string(),
            result: Some(json!(false)),
            ..EvalResult::default()
        });
        assert_eq!(results.verdict(), Verdict::ConditionsNotMet);

        results.match_constraints = false;
        assert_eq!(results.verdict(), Verdict::NotMatched);
        assert_eq!(Verdict::ConditionsNotMet.to_string(), "conditions-not-met");
    }

    #[test]
    fn test_results_deserialize() {
        let results: EvaluationResults =
            serde_json::from_str(r#"{"matchConstraints":true,"validations":[{"name":"1","result":true}]}"#).unwrap();

        assert!(results.match_constraints);
        assert_eq!(results.validations, vec![passing("1")]);
    }
}
