//! CEL engine built on `cel-interpreter`.

use super::{Bindings, EngineOptions, ExpressionEngine, ExpressionError, NAMESPACE_OBJECT, OBJECT, PARAMS, VARIABLES};
use crate::document::Document;
use cel_interpreter::extractors::{Arguments, This};
use cel_interpreter::objects::{Key, Map};
use cel_interpreter::{Context, ExecutionError, FunctionContext, Program, ResolveResult, Value};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

const LOG_TARGET: &str = "       cel";

/// Names that are always bound and so cannot be reused by policy variables.
const BUILTIN_DECLARATIONS: [&str; 3] = [OBJECT, PARAMS, NAMESPACE_OBJECT];

/// Evaluates policy expressions with the Common Expression Language.
///
/// Policy variables are exposed as the entries of a `variables` map, so `variables.replicas`
/// is ordinary member access. A variable whose expression failed has no entry in that map, and
/// any expression reading it fails with the interpreter's own missing-key error.
///
/// `cel-interpreter` parses source text straight into an executable program and has no
/// separate type-checking pass, so compilation never fails. It also has no unknown or error
/// values: every failure is reported as an error instead.
///
/// Numeric comparisons across ints, uints and doubles always work. Optional types are not
/// available, whatever [`EngineOptions::optional_types`] says.
#[derive(Debug, Clone)]
pub struct CelEngine {
    options: EngineOptions,
    declarations: Vec<String>,
}

impl CelEngine {
    #[must_use]
    pub fn new(options: EngineOptions) -> Self {
        if !options.cross_type_numeric_comparisons {
            log::debug!(target: LOG_TARGET, "cel-interpreter always compares ints, uints and doubles; cross_type_numeric_comparisons is ignored");
        }

        if options.optional_types {
            log::debug!(target: LOG_TARGET, "cel-interpreter has no optional types; `.?` and `[?]` are parse errors");
        }

        Self {
            options,
            declarations: BUILTIN_DECLARATIONS.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn build_context(&self, bindings: &Bindings<Value>) -> Context<'static> {
        let mut context = Context::default();

        for (name, value) in bindings.inputs() {
            context.add_variable_from_value(name, value.clone());
        }

        let variables: HashMap<Arc<String>, Value> = bindings
            .variables()
            .filter_map(|(name, outcome)| outcome.as_ref().ok().map(|value| (Arc::new(name.to_string()), value.clone())))
            .collect();
        context.add_variable_from_value(VARIABLES, Value::Map(Map::from(variables)));

        if self.options.extended_strings {
            add_string_extensions(&mut context);
        }

        context
    }
}

impl Default for CelEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl ExpressionEngine for CelEngine {
    type Ast = Program;
    type Program = Program;
    type Value = Value;

    fn declare_variable(&mut self, name: &str) -> Result<(), ExpressionError> {
        if self.options.eager_validation {
            if !is_identifier(name) {
                return Err(ExpressionError::compile(format!("invalid identifier '{name}'")));
            }

            if self.declarations.iter().any(|declared| declared == name) {
                return Err(ExpressionError::compile(format!("overlapping identifier for name '{name}'")));
            }
        }

        self.declarations.push(name.to_string());
        Ok(())
    }

    fn parse(&self, expression: &str) -> Result<Program, ExpressionError> {
        Program::compile(expression).map_err(|e| ExpressionError::parse(e.to_string()))
    }

    fn compile(&self, ast: Program) -> Result<Program, ExpressionError> {
        Ok(ast)
    }

    fn evaluate(&self, program: &Program, bindings: &Bindings<Value>) -> Result<Value, ExpressionError> {
        let context = self.build_context(bindings);
        program.execute(&context).map_err(|e| ExpressionError::evaluate(e.to_string()))
    }

    fn import(&self, document: &Document) -> Value {
        document_to_value(document)
    }

    fn export(&self, value: &Value) -> Document {
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(*b),
            Value::Int(i) => Document::from(*i),
            Value::UInt(u) => Document::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f).map_or_else(|| Document::String(f.to_string()), Document::Number),
            Value::String(s) => Document::String(s.to_string()),
            Value::Bytes(bytes) => Document::String(String::from_utf8_lossy(bytes).into_owned()),
            Value::List(items) => Document::Array(items.iter().map(|item| self.export(item)).collect()),
            Value::Map(map) => {
                // CEL maps are unordered; sort so reports are stable from run to run
                let mut entries: Vec<_> = map.map.iter().map(|(key, item)| (key_to_string(key), self.export(item))).collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                Document::Object(entries.into_iter().collect())
            }
            Value::Timestamp(ts) => {
                if self.options.utc_time_zone {
                    Document::String(ts.with_timezone(&Utc).to_rfc3339())
                } else {
                    Document::String(ts.to_rfc3339())
                }
            }
            Value::Duration(d) => Document::String(format_duration(d.num_seconds(), d.subsec_nanos())),
            other => Document::String(format!("unsupported value: {other:?}")),
        }
    }

    fn is_true(&self, value: &Value) -> bool {
        matches!(value, Value::Bool(true))
    }
}

fn document_to_value(document: &Document) -> Value {
    match document {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::Float)
            }
        }
        Document::String(s) => Value::String(Arc::new(s.clone())),
        Document::Array(items) => Value::List(Arc::new(items.iter().map(document_to_value).collect())),
        Document::Object(fields) => {
            let map: HashMap<Arc<String>, Value> = fields
                .iter()
                .map(|(key, item)| (Arc::new(key.clone()), document_to_value(item)))
                .collect();
            Value::Map(Map::from(map))
        }
    }
}

fn key_to_string(key: &Key) -> String {
    match key {
        Key::String(s) => s.to_string(),
        Key::Int(i) => i.to_string(),
        Key::Uint(u) => u.to_string(),
        Key::Bool(b) => b.to_string(),
    }
}

/// Render a duration the way protobuf JSON does, e.g. `90s` or `-1.5s`.
fn format_duration(seconds: i64, nanos: i32) -> String {
    let sign = if seconds < 0 || nanos < 0 { "-" } else { "" };
    let seconds = seconds.unsigned_abs();
    let nanos = nanos.unsigned_abs();

    if nanos == 0 {
        format!("{sign}{seconds}s")
    } else {
        let fraction = format!("{nanos:09}");
        format!("{sign}{seconds}.{}s", fraction.trim_end_matches('0'))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c == '_' || c.is_ascii_alphabetic()) && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Namespace object that `strings.quote(...)` is called on.
const STRINGS_NAMESPACE: &str = "strings";

fn add_string_extensions(context: &mut Context<'_>) {
    context.add_variable_from_value(STRINGS_NAMESPACE, Value::Map(Map::from(HashMap::<Arc<String>, Value>::new())));

    context.add_function("charAt", char_at);
    context.add_function("indexOf", index_of);
    context.add_function("join", join);
    context.add_function("lastIndexOf", last_index_of);
    context.add_function("lowerAscii", lower_ascii);
    context.add_function("quote", quote);
    context.add_function("replace", replace);
    context.add_function("reverse", reverse);
    context.add_function("split", split);
    context.add_function("substring", substring);
    context.add_function("trim", trim);
    context.add_function("upperAscii", upper_ascii);
}

/// The arguments of a call, without the receiver when it was written as a plain function call.
fn call_args<'a>(ftx: &FunctionContext<'_>, args: &'a [Value]) -> &'a [Value] {
    if ftx.this.is_some() { args } else { args.get(1..).unwrap_or_default() }
}

fn position(index: usize) -> Value {
    Value::Int(i64::try_from(index).unwrap_or(i64::MAX))
}

/// Converts a code point index, accepting `0..=len`.
fn code_point_index(ftx: &FunctionContext<'_>, index: i64, len: usize) -> Result<usize, ExecutionError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i <= len)
        .ok_or_else(|| ftx.error(format!("index out of range: {index}")))
}

fn find_from(text: &[char], needle: &[char], start: usize) -> Option<usize> {
    (start..=text.len().checked_sub(needle.len())?).find(|i| text[*i..*i + needle.len()] == *needle)
}

fn char_at(ftx: &FunctionContext<'_>, This(this): This<Arc<String>>, index: i64) -> ResolveResult {
    let chars: Vec<char> = this.chars().collect();
    let index = code_point_index(ftx, index, chars.len())?;
    Ok(Value::String(Arc::new(chars.get(index).map(ToString::to_string).unwrap_or_default())))
}

fn index_of(ftx: &FunctionContext<'_>, This(this): This<Arc<String>>, Arguments(args): Arguments) -> ResolveResult {
    let (needle, offset) = match call_args(ftx, &args) {
        [Value::String(needle)] => (Arc::clone(needle), 0),
        [Value::String(needle), Value::Int(offset)] => (Arc::clone(needle), *offset),
        _ => return Err(ftx.error("expected indexOf(string) or indexOf(string, int)")),
    };

    if needle.is_empty() {
        return Ok(Value::Int(offset));
    }

    let text: Vec<char> = this.chars().collect();
    let needle: Vec<char> = needle.chars().collect();
    let start = code_point_index(ftx, offset, text.len())?;
    Ok(find_from(&text, &needle, start).map_or(Value::Int(-1), position))
}

fn last_index_of(ftx: &FunctionContext<'_>, This(this): This<Arc<String>>, Arguments(args): Arguments) -> ResolveResult {
    let (needle, offset) = match call_args(ftx, &args) {
        [Value::String(needle)] => (Arc::clone(needle), None),
        [Value::String(needle), Value::Int(offset)] => (Arc::clone(needle), Some(*offset)),
        _ => return Err(ftx.error("expected lastIndexOf(string) or lastIndexOf(string, int)")),
    };

    let text: Vec<char> = this.chars().collect();
    if needle.is_empty() {
        return Ok(offset.map_or_else(|| position(text.len()), Value::Int));
    }

    let needle: Vec<char> = needle.chars().collect();
    let last = match offset {
        Some(offset) => {
            let last = code_point_index(ftx, offset, text.len())?;
            if last == text.len() {
                return Err(ftx.error(format!("index out of range: {offset}")));
            }
            last
        }
        None => text.len().saturating_sub(1),
    };

    let Some(latest_start) = text.len().checked_sub(needle.len()) else {
        return Ok(Value::Int(-1));
    };

    Ok((0..=last.min(latest_start))
        .rev()
        .find(|i| text[*i..*i + needle.len()] == *needle)
        .map_or(Value::Int(-1), position))
}

fn join(ftx: &FunctionContext<'_>, This(this): This<Arc<Vec<Value>>>, Arguments(args): Arguments) -> ResolveResult {
    let separator = match call_args(ftx, &args) {
        [] => Arc::new(String::new()),
        [Value::String(separator)] => Arc::clone(separator),
        _ => return Err(ftx.error("expected join() or join(string)")),
    };

    let parts = this
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.as_str()),
            other => Err(ftx.error(format!("join requires a list of strings, found {other:?}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Value::String(Arc::new(parts.join(separator.as_str()))))
}

fn lower_ascii(This(this): This<Arc<String>>) -> String {
    this.to_ascii_lowercase()
}

fn quote(ftx: &FunctionContext<'_>, Arguments(args): Arguments) -> ResolveResult {
    // `strings.quote(s)` arrives with the namespace map as its receiver
    let text = match args.as_slice() {
        [Value::String(text)] => Arc::clone(text),
        _ => return Err(ftx.error("expected strings.quote(string)")),
    };

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '\u{07}' => quoted.push_str("\\a"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0C}' => quoted.push_str("\\f"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{0B}' => quoted.push_str("\\v"),
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');

    Ok(Value::String(Arc::new(quoted)))
}

fn replace(ftx: &FunctionContext<'_>, This(this): This<Arc<String>>, Arguments(args): Arguments) -> ResolveResult {
    let (from, to, limit) = match call_args(ftx, &args) {
        [Value::String(from), Value::String(to)] => (Arc::clone(from), Arc::clone(to), -1),
        [Value::String(from), Value::String(to), Value::Int(limit)] => (Arc::clone(from), Arc::clone(to), *limit),
        _ => return Err(ftx.error("expected replace(string, string) or replace(string, string, int)")),
    };

    // A negative limit replaces every occurrence
    let replaced = usize::try_from(limit).map_or_else(
        |_| this.replace(from.as_str(), to.as_str()),
        |limit| this.replacen(from.as_str(), to.as_str(), limit),
    );

    Ok(Value::String(Arc::new(replaced)))
}

fn reverse(This(this): This<Arc<String>>) -> String {
    this.chars().rev().collect()
}

fn split(ftx: &FunctionContext<'_>, This(this): This<Arc<String>>, Arguments(args): Arguments) -> ResolveResult {
    let (separator, limit) = match call_args(ftx, &args) {
        [Value::String(separator)] => (Arc::clone(separator), -1),
        [Value::String(separator), Value::Int(limit)] => (Arc::clone(separator), *limit),
        _ => return Err(ftx.error("expected split(string) or split(string, int)")),
    };

    let parts: Vec<String> = match usize::try_from(limit) {
        Ok(0) => Vec::new(),
        Ok(limit) if separator.is_empty() => {
            let mut parts: Vec<String> = this.chars().map(String::from).collect();
            if parts.len() > limit {
                let rest = parts.split_off(limit - 1).concat();
                parts.push(rest);
            }
            parts
        }
        Ok(limit) => this.splitn(limit, separator.as_str()).map(ToString::to_string).collect(),
        Err(_) if separator.is_empty() => this.chars().map(String::from).collect(),
        Err(_) => this.split(separator.as_str()).map(ToString::to_string).collect(),
    };

    Ok(Value::List(Arc::new(parts.into_iter().map(|part| Value::String(Arc::new(part))).collect())))
}

fn substring(ftx: &FunctionContext<'_>, This(this): This<Arc<String>>, Arguments(args): Arguments) -> ResolveResult {
    let chars: Vec<char> = this.chars().collect();
    let (start, end) = match call_args(ftx, &args) {
        [Value::Int(start)] => (*start, None),
        [Value::Int(start), Value::Int(end)] => (*start, Some(*end)),
        _ => return Err(ftx.error("expected substring(int) or substring(int, int)")),
    };

    let first = code_point_index(ftx, start, chars.len())?;
    let last = match end {
        Some(end) => code_point_index(ftx, end, chars.len())?,
        None => chars.len(),
    };

    if first > last {
        return Err(ftx.error(format!("invalid substring range. start: {start}, end: {}", end.unwrap_or_default())));
    }

    Ok(Value::String(Arc::new(chars[first..last].iter().collect())))
}

fn trim(This(this): This<Arc<String>>) -> String {
    this.trim().to_string()
}

fn upper_ascii(This(this): This<Arc<String>>) -> String {
    this.to_ascii_uppercase()
}
