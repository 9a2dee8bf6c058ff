//! Error taxonomy for the estimation pipeline.
//!
//! Every condition except [`SneError::Cancelled`] and
//! [`SneError::BadConfiguration`] is resolved at the narrowest scope: a
//! degenerate window is skipped, a region without data or without any valid
//! window is skipped with a warning, and the run continues.

use thiserror::Error;

/// Why a geometric computation could not produce an orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degeneracy {
    /// Scatter matrix determinant is zero or negative (collinear/coincident points).
    SingularScatter,
    /// Eigen-decomposition produced a non-positive or non-finite eigenvalue.
    NonPositiveEigenvalue,
    /// `cos(plunge)` vanished so the third orientation angle is undefined.
    VerticalNormal,
    /// The mean sampled normal of the window has zero length.
    VanishingMeanNormal,
    /// The posterior evaluated to NaN.
    NonFiniteScore,
}

impl std::fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Degeneracy::SingularScatter => "singular scatter matrix",
            Degeneracy::NonPositiveEigenvalue => "non-positive eigenvalue",
            Degeneracy::VerticalNormal => "normal is vertical, alpha undefined",
            Degeneracy::VanishingMeanNormal => "mean sampled normal vanishes",
            Degeneracy::NonFiniteScore => "posterior is not a number",
        };
        f.write_str(msg)
    }
}

/// Why a region cannot be turned into an ordered series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shortfall {
    TooFewPoints { found: usize, minimum: usize },
    /// Covariance of the combined scatter has rank below 3.
    RankDeficient { rank: usize },
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shortfall::TooFewPoints { found, minimum } => {
                write!(f, "{found} usable points < {minimum}")
            }
            Shortfall::RankDeficient { rank } => {
                write!(f, "point scatter has rank {rank} < 3")
            }
        }
    }
}

/// Region- and run-level failures. Degenerate windows never surface here;
/// they travel as [`WindowRejection::Degenerate`] and are skipped by the sweep.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SneError {
    #[error("insufficient data: {0}")]
    InsufficientData(Shortfall),

    #[error("no window in the region could be scored")]
    NoValidWindow,

    #[error("cancelled")]
    Cancelled,

    #[error("bad configuration: {0}")]
    BadConfiguration(String),
}

impl SneError {
    /// True for errors that skip a single region but let the batch continue.
    pub fn is_region_local(&self) -> bool {
        matches!(self, SneError::InsufficientData(_) | SneError::NoValidWindow)
    }
}

/// Reasons a candidate window is not scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowRejection {
    TooShort { len: usize, minimum: usize },
    TooLong { len: usize, maximum: usize },
    /// The window contains the break at this sorted position.
    ContainsBreak(usize),
    Degenerate(Degeneracy),
}

impl std::fmt::Display for WindowRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowRejection::TooShort { len, minimum } => {
                write!(f, "window too short ({len} < {minimum})")
            }
            WindowRejection::TooLong { len, maximum } => {
                write!(f, "window too long ({len} > {maximum})")
            }
            WindowRejection::ContainsBreak(pos) => write!(f, "window spans break at {pos}"),
            WindowRejection::Degenerate(reason) => write!(f, "degenerate window: {reason}"),
        }
    }
}

impl std::error::Error for WindowRejection {}

impl From<Degeneracy> for WindowRejection {
    fn from(reason: Degeneracy) -> Self {
        WindowRejection::Degenerate(reason)
    }
}
