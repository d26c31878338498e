//! Typed model of a `ValidatingAdmissionPolicy` document.
//!
//! Only the parts of the Kubernetes object that drive evaluation are modeled; any other fields
//! in the document are ignored. Lists that are missing or explicitly `null` decode as empty.

use crate::Result;
use ohno::app_err;
use serde::{Deserialize, Deserializer, Serialize};

/// A `ValidatingAdmissionPolicy` as decoded from YAML or JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatingAdmissionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub metadata: ObjectMeta,

    #[serde(default, deserialize_with = "nullable")]
    pub spec: PolicySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The evaluated portion of a policy: which resources it applies to and what it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    #[serde(default, deserialize_with = "nullable")]
    pub match_constraints: MatchResources,

    /// Named expressions evaluated first, in declaration order
    #[serde(default, deserialize_with = "nullable")]
    pub variables: Vec<Variable>,

    /// Expressions that must all evaluate to `true` for validations to run
    #[serde(default, deserialize_with = "nullable")]
    pub match_conditions: Vec<MatchCondition>,

    #[serde(default, deserialize_with = "nullable")]
    pub validations: Vec<Validation>,

    #[serde(default, deserialize_with = "nullable")]
    pub audit_annotations: Vec<AuditAnnotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResources {
    /// An empty rule list matches nothing
    #[serde(default, deserialize_with = "nullable")]
    pub resource_rules: Vec<ResourceRule>,
}

/// A filter describing the API groups, versions and resources a policy applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRule {
    #[serde(default, deserialize_with = "nullable")]
    pub api_groups: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub api_versions: Vec<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Variable {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchCondition {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default)]
    pub expression: String,

    /// Static message reported when the validation fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Expression producing the message when no static message is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditAnnotation {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub value_expression: String,
}

impl ValidatingAdmissionPolicy {
    /// Decode a policy from YAML or JSON text.
    ///
    /// Blank text and an explicit `null` document both produce an empty policy, which matches
    /// no resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or JSON or does not have the shape of a policy.
    pub fn from_text(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let policy: Option<Self> = serde_yaml::from_str(text).map_err(|e| app_err!("failed to parse policy YAML: {e}"))?;
        Ok(policy.unwrap_or_default())
    }

    /// The policy's name for diagnostics.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Treat an explicit `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
