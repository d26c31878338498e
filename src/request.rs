//! The raw admission inputs and the decoded request context.

use crate::Result;
use crate::document::{Document, decode_document, decode_object};

/// The six textual inputs of an evaluation, each YAML or JSON.
///
/// Blank inputs are treated as `null`, so callers only need to fill in the documents they have.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionInputs<'a> {
    pub policy: &'a str,

    /// The object from the incoming request; `null` for DELETE requests
    pub object: &'a str,

    /// The existing object; `null` for CREATE requests
    pub old_object: &'a str,

    /// Attributes of the admission request
    pub request: &'a str,

    /// The parameter resource referred to by the policy binding
    pub params: &'a str,

    /// The namespace the object belongs to; `null` for cluster-scoped objects
    pub namespace: &'a str,
}

/// Decoded per-request documents.
///
/// Only `object`, `params` and `namespace_object` are made available to expressions. The old
/// object and the request attributes are decoded, so malformed input is still reported, but
/// are not bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub object: Document,
    pub old_object: Document,
    pub request: Document,
    pub params: Document,
    pub namespace_object: Document,
}

impl RequestContext {
    /// Decode the request documents out of `inputs`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first input that cannot be decoded, or that is not a mapping
    /// where a Kubernetes resource is expected.
    pub fn decode(inputs: &AdmissionInputs<'_>) -> Result<Self> {
        Ok(Self {
            object: decode_object("object", inputs.object)?,
            old_object: decode_object("oldObject", inputs.old_object)?,
            request: decode_document("request", inputs.request)?,
            params: decode_object("params", inputs.params)?,
            namespace_object: decode_object("namespace", inputs.namespace)?,
        })
    }
}
