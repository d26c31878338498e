//! Offline evaluation of Kubernetes `ValidatingAdmissionPolicy` objects.
//!
//! Given a policy and the resources of an admission request, this crate decides whether the
//! policy's resource rules apply and, when they do, runs the policy's CEL expressions the way
//! the API server would: variables first, then match conditions, then validations and audit
//! annotations. Every outcome, including failures, is reported as data in an
//! [`EvaluationResults`] record.
//!
//! # Module Organization
//!
//! - [`document`]: Decoding YAML/JSON text into generic value trees
//! - [`policy`]: The typed policy model
//! - [`request`]: The six raw inputs and the decoded request context
//! - [`matching`]: Resource-rule matching against the target object
//! - [`expr`]: The expression engine contract and its CEL implementation
//! - [`evaluation`]: Staged evaluation and result shaping
//! - [`config`]: Engine options and logging configuration
//!
//! # Example
//!
//! ```
//! use admission_policy_eval::{AdmissionInputs, evaluate_admission};
//!
//! let policy = r"
//! spec:
//!   matchConstraints:
//!     resourceRules:
//!       - apiGroups: ['apps']
//!         apiVersions: ['v1']
//!         resources: ['deployments']
//!   validations:
//!     - expression: object.spec.replicas > 0
//!       message: replicas must be positive
//! ";
//!
//! let object = r"
//! apiVersion: apps/v1
//! kind: Deployment
//! spec:
//!   replicas: 0
//! ";
//!
//! let results = evaluate_admission(&AdmissionInputs {
//!     policy,
//!     object,
//!     ..AdmissionInputs::default()
//! });
//!
//! assert!(results.match_constraints);
//! assert_eq!(results.validations[0].message, Some("replicas must be positive".into()));
//! ```

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod config;
pub mod document;
pub mod evaluation;
pub mod expr;
pub mod matching;
pub mod policy;
pub mod request;

pub use config::{Config, LogLevel, init_logging};
pub use evaluation::{AdmissionPolicyEvaluator, EvalResult, EvaluationResults, Verdict};
pub use expr::{CelEngine, EngineOptions, ExpressionEngine};
pub use request::AdmissionInputs;

/// Evaluate a policy against an admission request using the default engine options.
///
/// A fresh engine is built for every call, so concurrent calls share nothing. Setup failures
/// such as undecodable inputs are reported through [`EvaluationResults::error`]. No logger is
/// installed; hosts that want log output set one up themselves or call [`init_logging`].
#[must_use]
pub fn evaluate_admission(inputs: &AdmissionInputs<'_>) -> EvaluationResults {
    evaluate_with_engine(inputs, CelEngine::default())
}

/// Evaluate a policy against an admission request using the settings from `config`.
///
/// The engine is built from `config.engine`, and `config.log_level` is handed to
/// [`init_logging`], which leaves an already installed logger in place.
#[must_use]
pub fn evaluate_admission_with(inputs: &AdmissionInputs<'_>, config: &Config) -> EvaluationResults {
    init_logging(config.log_level);
    evaluate_with_engine(inputs, CelEngine::new(config.engine))
}

fn evaluate_with_engine(inputs: &AdmissionInputs<'_>, engine: CelEngine) -> EvaluationResults {
    match AdmissionPolicyEvaluator::new(inputs, engine) {
        Ok(evaluator) => evaluator.run(),
        Err(e) => {
            log::info!("unable to prepare policy evaluation: {e}");
            EvaluationResults::failure(&e)
        }
    }
}

/// Evaluate six raw YAML or JSON documents and return the results as a JSON document.
///
/// This is the boundary used by embedding hosts: it never fails, and any problem is reported in
/// the `error` field of the returned document.
#[must_use]
pub fn admission_eval(policy: &str, object: &str, old_object: &str, request: &str, params: &str, namespace: &str) -> String {
    let inputs = AdmissionInputs {
        policy,
        object,
        old_object,
        request,
        params,
        namespace,
    };

    evaluate_admission(&inputs).to_json()
}
