use thiserror::Error;

use crate::time::Step;

#[derive(Debug, Error)]
pub enum Error {
    /// The provider chain ran out of applicable sources for one time step.
    /// This is the only error a position request can surface: it carries
    /// the last transport code the chain produced, so callers can report
    /// what actually went wrong upstream.
    #[error("could not resolve ephemeris for step {step} (last provider code {code})")]
    Unresolved {
        /// Time step that could not be covered
        step: Step,
        /// Last transport code produced while walking the chain
        code: i32,
    },

    /// The two-line file header did not carry the expected fixed fields.
    /// Indicates a provider format change requiring a code update.
    #[error("malformed ephemeris file header")]
    MalformedHeader,

    /// Tabulation cadence other than 5 or 15 minutes. Same situation as a
    /// malformed header: fail this file loudly.
    #[error("unexpected tabulation cadence: {0} s")]
    UnexpectedCadence(i64),

    /// File start time resolved to a step before the GPS system start.
    #[error("implausible start step {0}")]
    BadStartStep(i64),

    /// The fixed designator capacity is exhausted: a configuration limit
    /// must be raised, there is nothing to recover from at runtime.
    #[error("designator capacity exceeded ({0} satellites)")]
    DesignatorCapacity(usize),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// System clock could not be read (needed for provider date gates).
    #[error("system clock is not available")]
    SystemClock,
}
