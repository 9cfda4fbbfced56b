use thiserror::Error;

/// Crate wide [Error] taxonomy. Data availability and numerical
/// convergence variants are recoverable per record: the faulty observation
/// is excluded and logged, the run proceeds. Configuration variants are
/// fatal and raised by [crate::prelude::Config::validate] before any processing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// No ephemeris record has a validity window that contains the
    /// requested epoch. Recoverable: the observation is excluded.
    #[error("no applicable ephemeris")]
    NoApplicableEphemeris,

    /// Precise interpolation requires a minimal number of samples
    /// surrounding the target epoch.
    #[error("not enough precise samples around target epoch")]
    InsufficientSamples,

    /// An enabled model requires the receiver apriori position.
    #[error("missing receiver apriori position")]
    MissingReceiverPosition,

    /// Corrections apply to pseudo range: we cannot proceed without one.
    #[error("missing pseudo range observation")]
    MissingPseudoRange,

    /// Kepler solver did not converge within the configured
    /// iteration budget. Never silently truncated.
    #[error("kepler solver non convergence")]
    KeplerNonConvergence,

    /// Transmission time estimation did not stabilize within
    /// the configured number of passes.
    #[error("signal transmission time non convergence")]
    ClockIterationNonConvergence,

    /// Bad signal data or invalid orbital state: reception cannot
    /// precede transmission.
    #[error("physical non sense: rx prior tx")]
    PhysicalNonSenseRxPriorTx,

    /// Record with the same (sv, reference epoch) already stored.
    /// Replacement must be an explicit overwrite.
    #[error("duplicate ephemeris record")]
    DuplicateEphemeris,

    /// Timescale tag (or constellation without a known timescale)
    /// that this engine does not support.
    #[error("unknown timescale \"{0}\"")]
    UnknownTimeScale(String),

    /// Correction model name that this engine does not support.
    #[error("unknown correction model \"{0}\"")]
    UnknownCorrectionModel(String),

    /// Leap second table must contain at least one entry.
    #[error("empty leap second table")]
    EmptyLeapSecondTable,

    /// Epoch falls after the last tabulated leap second entry.
    /// Recoverable or fatal, depending on [crate::prelude::StalenessPolicy].
    #[error("leap second table is stale for this epoch")]
    LeapSecondTableStale,

    /// Invalid configuration, detected at startup validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Per-record exclusion rate exceeded the configured threshold:
    /// the data set is most likely corrupt.
    #[error("too many rejected observations")]
    FailureRatioExceeded,
}
