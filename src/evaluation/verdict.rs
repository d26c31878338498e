use strum::Display;

/// Overall reading of an evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Verdict {
    /// The run could not start
    Error,

    /// The policy's resource rules do not apply to the object
    NotMatched,

    /// At least one match condition did not hold, so nothing was validated
    ConditionsNotMet,

    /// Every validation held
    Valid,

    /// At least one validation failed or did not hold
    Invalid,
}
