//! Expression evaluation using CEL
//!
//! This module defines the contract the evaluation pipeline relies on, [`ExpressionEngine`],
//! together with its production implementation, [`CelEngine`], built on the `cel-interpreter`
//! crate.
//!
//! # Implementation Model
//!
//! An engine turns source text into a result in three steps: `parse`, `compile` and
//! `evaluate`. Evaluation happens against a [`Bindings`] environment holding the request
//! documents (`object`, `params`, `namespaceObject`) plus one `variables.<name>` entry per
//! policy variable. Variable entries are recorded whether or not the variable evaluated
//! successfully, and it is up to the engine to decide what a failed entry looks like to later
//! expressions.
//!
//! Engines also convert between the decoded input [`Document`](crate::document::Document)
//! trees and their own values, so that request documents can be bound and results can be
//! reported.
//!
//! Engines are configured once per run through [`EngineOptions`] and are not shared between
//! runs.

mod bindings;
mod cel_engine;
mod engine;
mod engine_options;
mod expression_error;

#[cfg(test)]
pub(crate) mod scripted_engine;

pub use bindings::{Bindings, NAMESPACE_OBJECT, OBJECT, PARAMS, VARIABLES};
pub use cel_engine::CelEngine;
pub use engine::ExpressionEngine;
pub use engine_options::EngineOptions;
pub use expression_error::{ExpressionError, ExpressionStage};
