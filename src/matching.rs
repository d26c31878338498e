//! Resource-rule matching.
//!
//! A policy applies to an object when any of its resource rules lists the object's API group,
//! its API version, and the plural form of its kind. Membership is exact for groups and
//! versions and case-insensitive for resources; wildcards carry no special meaning.

use crate::document::{Document, field};
use crate::policy::ResourceRule;

const LOG_TARGET: &str = "  matching";

/// Decide whether any of `rules` applies to `object`.
///
/// Objects without a string `apiVersion` and `kind` never match, and neither does anything when
/// `rules` is empty. Rules are tried in order and the first match wins.
#[must_use]
pub fn matches_constraints(object: &Document, rules: &[ResourceRule]) -> bool {
    let (Some(api_version), Some(kind)) = (field(object, "apiVersion"), field(object, "kind")) else {
        return false;
    };

    let (Some(api_version), Some(kind)) = (api_version.as_str(), kind.as_str()) else {
        log::debug!(target: LOG_TARGET, "apiVersion and kind must be strings, found {api_version} and {kind}");
        return false;
    };

    let (group, version) = split_api_version(api_version);
    let plural = pluralize(kind);

    rules.iter().any(|rule| rule_matches(rule, group, version, &plural))
}

/// Split an `apiVersion` into its group and version.
///
/// Core-group objects such as `v1` have no group and are reported under the empty group name.
#[must_use]
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) if !group.is_empty() => (group, version),
        _ => ("", api_version),
    }
}

/// Derive the resource name for a kind.
///
/// This is a fixed heuristic rather than real English pluralization: a trailing `y` becomes
/// `ies` and everything else gains an `s`, so `Day` becomes `Daies`.
#[must_use]
pub fn pluralize(kind: &str) -> String {
    kind.strip_suffix('y')
        .map_or_else(|| format!("{kind}s"), |stem| format!("{stem}ies"))
}

/// Check a single rule, stopping at the first axis that does not match.
#[must_use]
pub fn rule_matches(rule: &ResourceRule, group: &str, version: &str, plural: &str) -> bool {
    if !rule.api_groups.iter().any(|g| g == group) {
        log::debug!(target: LOG_TARGET, "Group {group:?} NOT matched");
        return false;
    }

    if !rule.api_versions.iter().any(|v| v == version) {
        log::debug!(target: LOG_TARGET, "Version {version:?} NOT matched");
        return false;
    }

    let plural = plural.to_lowercase();
    if !rule.resources.iter().any(|r| r.to_lowercase() == plural) {
        log::debug!(target: LOG_TARGET, "Resource kind {plural:?} NOT matched");
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(groups: &[&str], versions: &[&str], resources: &[&str]) -> ResourceRule {
        ResourceRule {
            api_groups: groups.iter().map(ToString::to_string).collect(),
            api_versions: versions.iter().map(ToString::to_string).collect(),
            resources: resources.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("Policy"), "Policies");
        assert_eq!(pluralize("Pod"), "Pods");
        assert_eq!(pluralize("Proxy"), "Proxies");
        assert_eq!(pluralize("Day"), "Daies");
        assert_eq!(pluralize("Deployment"), "Deployments");
        assert_eq!(pluralize("Ingress"), "Ingresss");
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(split_api_version("apps/v1"), ("apps", "v1"));
        assert_eq!(split_api_version("v1"), ("", "v1"));
        assert_eq!(split_api_version("networking.k8s.io/v1beta1"), ("networking.k8s.io", "v1beta1"));
        assert_eq!(split_api_version("/v1"), ("", "/v1"));
    }

    #[test]
    fn test_deployment_matches_apps_rule() {
        let object = json!({"apiVersion": "apps/v1", "kind": "Deployment"});
        let rules = [rule(&["apps"], &["v1"], &["deployments"])];
        assert!(matches_constraints(&object, &rules));
    }

    #[test]
    fn test_pod_matches_core_group_rule() {
        let object = json!({"apiVersion": "v1", "kind": "Pod"});
        let rules = [rule(&[""], &["v1"], &["pods"])];
        assert!(matches_constraints(&object, &rules));
    }

    #[test]
    fn test_empty_rules_never_match() {
        let object = json!({"apiVersion": "v1", "kind": "Pod"});
        assert!(!matches_constraints(&object, &[]));
    }

    #[test]
    fn test_missing_or_null_identity_never_matches() {
        let rules = [rule(&[""], &["v1"], &["pods"])];

        assert!(!matches_constraints(&json!({"kind": "Pod"}), &rules));
        assert!(!matches_constraints(&json!({"apiVersion": "v1"}), &rules));
        assert!(!matches_constraints(&json!({"apiVersion": null, "kind": "Pod"}), &rules));
        assert!(!matches_constraints(&json!({"apiVersion": "v1", "kind": null}), &rules));
        assert!(!matches_constraints(&Document::Null, &rules));
    }

    #[test]
    fn test_non_string_identity_never_matches() {
        let rules = [rule(&[""], &["v1"], &["pods"])];
        assert!(!matches_constraints(&json!({"apiVersion": 1, "kind": "Pod"}), &rules));
        assert!(!matches_constraints(&json!({"apiVersion": "v1", "kind": ["Pod"]}), &rules));
    }

    #[test]
    fn test_every_axis_must_match() {
        let object = json!({"apiVersion": "apps/v1", "kind": "Deployment"});

        assert!(!matches_constraints(&object, &[rule(&["batch"], &["v1"], &["deployments"])]));
        assert!(!matches_constraints(&object, &[rule(&["apps"], &["v1beta1"], &["deployments"])]));
        assert!(!matches_constraints(&object, &[rule(&["apps"], &["v1"], &["statefulsets"])]));
    }

    #[test]
    fn test_resources_compare_case_insensitively() {
        let object = json!({"apiVersion": "apps/v1", "kind": "Deployment"});
        assert!(matches_constraints(&object, &[rule(&["apps"], &["v1"], &["Deployments"])]));
        assert!(matches_constraints(&object, &[rule(&["apps"], &["v1"], &["DEPLOYMENTS"])]));
    }

    #[test]
    fn test_groups_and_versions_compare_exactly() {
        let object = json!({"apiVersion": "apps/v1", "kind": "Deployment"});
        assert!(!matches_constraints(&object, &[rule(&["Apps"], &["v1"], &["deployments"])]));
        assert!(!matches_constraints(&object, &[rule(&["apps"], &["V1"], &["deployments"])]));
    }

    #[test]
    fn test_wildcards_are_literal() {
        let object = json!({"apiVersion": "apps/v1", "kind": "Deployment"});
        assert!(!matches_constraints(&object, &[rule(&["*"], &["*"], &["*"])]));
    }

    #[test]
    fn test_later_rule_can_match() {
        let object = json!({"apiVersion": "v1", "kind": "ConfigMap"});
        let rules = [
            rule(&["apps"], &["v1"], &["deployments"]),
            rule(&[""], &["v1"], &["configmaps"]),
        ];
        assert!(matches_constraints(&object, &rules));
    }

    #[test]
    fn test_heuristic_plural_is_what_matches() {
        let object = json!({"apiVersion": "example.com/v1", "kind": "Day"});
        assert!(!matches_constraints(&object, &[rule(&["example.com"], &["v1"], &["days"])]));
        assert!(matches_constraints(&object, &[rule(&["example.com"], &["v1"], &["daies"])]));
    }
}
