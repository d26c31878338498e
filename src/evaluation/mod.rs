//! Staged evaluation of a policy and shaping of the results.
//!
//! A run first checks the policy's resource rules against the object. When they apply, the
//! policy's expressions are evaluated in four strictly ordered stages:
//!
//! 1. Variables, each bound for every expression that follows it
//! 2. Match conditions, all of which must be exactly `true`
//! 3. Validations, with violation messages
//! 4. Audit annotations
//!
//! Stages 3 and 4 are skipped entirely when a match condition does not hold. A failing
//! expression only affects its own result.

mod eval_result;
mod evaluation_results;
mod evaluator;
mod stage_outcome;
mod verdict;

pub use eval_result::EvalResult;
pub use evaluation_results::EvaluationResults;
pub use evaluator::AdmissionPolicyEvaluator;
pub use stage_outcome::{ItemOutcome, StageOutcome};
pub use verdict::Verdict;
