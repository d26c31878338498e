use serde::{Deserialize, Serialize};

/// Settings applied when an expression engine is constructed.
///
/// These mirror the environment the Kubernetes API server builds for admission policies, and
/// every option defaults to enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOptions {
    /// Reject invalid or duplicate declarations when they are made rather than when used
    #[serde(default = "enabled")]
    pub eager_validation: bool,

    /// Report timestamps in UTC
    #[serde(default = "enabled")]
    pub utc_time_zone: bool,

    /// Provide the extended string library: `charAt`, `indexOf`, `lastIndexOf`, `join`,
    /// `lowerAscii`, `upperAscii`, `replace`, `reverse`, `split`, `substring`, `trim` and
    /// `strings.quote`
    #[serde(default = "enabled")]
    pub extended_strings: bool,

    /// Allow comparisons between ints, uints and doubles.
    ///
    /// [`CelEngine`](super::CelEngine) always allows them and ignores this setting.
    #[serde(default = "enabled")]
    pub cross_type_numeric_comparisons: bool,

    /// Request optional values and the `.?` / `[?]` accessors.
    ///
    /// `cel-interpreter` does not implement optional types, so [`CelEngine`](super::CelEngine)
    /// rejects that syntax at parse time regardless of this setting.
    #[serde(default = "enabled")]
    pub optional_types: bool,
}

const fn enabled() -> bool {
    true
}

impl EngineOptions {
    /// The options every run uses unless configured otherwise.
    pub const DEFAULT: Self = Self {
        eager_validation: true,
        utc_time_zone: true,
        extended_strings: true,
        cross_type_numeric_comparisons: true,
        optional_types: true,
    };
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
