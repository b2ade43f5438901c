use thiserror::Error;

/// Feiltaksonomi for kjernen. Power-limited / fri utforkjøring er *utfall*
/// (se `solver::SolveOutcome`), ikke feil.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("ugyldig konfigurasjon: {field}={value} ({reason})")]
    InvalidConfiguration {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("degenerert segment #{index}: distanse {distance_m} m")]
    DegenerateSegment { index: usize, distance_m: f64 },

    #[error("løypa har ingen segmenter")]
    EmptyCourse,

    #[error(
        "solver konvergerte ikke på segment #{segment_index} etter {iterations} iterasjoner (residual {residual_w:.3} W)"
    )]
    SolverNonConvergence {
        segment_index: usize,
        iterations: usize,
        residual_w: f64,
    },

    #[error("sammenligning uten verdier")]
    EmptySweep,
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, value: f64, reason: &'static str) -> Self {
        SimError::InvalidConfiguration { field, value, reason }
    }
}

pub type SimResult<T> = Result<T, SimError>;

/// Felles sjekk: endelig og strengt positiv.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(field, value, "må være endelig og > 0"))
    }
}
