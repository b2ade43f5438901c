//! Prometheus-tellere for solveren. Bare en sidekanal: ingenting i
//! beregningene leser disse verdiene tilbake.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::solver::SolveOutcome;

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Lager og registrerer en teller. Navnene under er konstanter på formen
/// `[a-z_]+`, så konstruksjonen kan ikke feile. Registreringen kan (duplikat);
/// da logges det og telleren teller videre uten å eksponeres.
fn counter(name: &str, help: &str) -> IntCounter {
    let c = IntCounter::new(name, help).expect("konstant, gyldig metrikknavn");
    if let Err(e) = REGISTRY.register(Box::new(c.clone())) {
        log::warn!("kunne ikke registrere {name}: {e}");
    }
    c
}

pub static SIMULATIONS_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("coursetime_simulations_total", "Antall fullførte simuleringer"));
pub static SEGMENT_SOLVES_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("coursetime_segment_solves_total", "Antall segmentløsninger"));
pub static SOLVER_ITERATIONS_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("coursetime_solver_iterations_total", "Sum Newton/bisection-iterasjoner"));
pub static POWER_LIMITED_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("coursetime_power_limited_total", "Segmenter klemt til krypfart"));
pub static FREE_DESCENT_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("coursetime_free_descent_total", "Segmenter kjørt på frihjul"));
pub static SPEED_CAPPED_TOTAL: Lazy<IntCounter> =
    Lazy::new(|| counter("coursetime_speed_capped_total", "Segmenter kappet ved v_max"));

pub(crate) fn record_solve(outcome: &SolveOutcome) {
    SEGMENT_SOLVES_TOTAL.inc();
    match outcome {
        SolveOutcome::Converged { iterations } => SOLVER_ITERATIONS_TOTAL.inc_by(*iterations as u64),
        SolveOutcome::FreeDescent => FREE_DESCENT_TOTAL.inc(),
        SolveOutcome::PowerLimited => POWER_LIMITED_TOTAL.inc(),
        SolveOutcome::SpeedCapped => SPEED_CAPPED_TOTAL.inc(),
    }
}

pub(crate) fn record_simulation() {
    SIMULATIONS_TOTAL.inc();
}

/// Tvinger registrering av alle tellere (så de vises med 0 før første løsning).
fn init_all() {
    Lazy::force(&SIMULATIONS_TOTAL);
    Lazy::force(&SEGMENT_SOLVES_TOTAL);
    Lazy::force(&SOLVER_ITERATIONS_TOTAL);
    Lazy::force(&POWER_LIMITED_TOTAL);
    Lazy::force(&FREE_DESCENT_TOTAL);
    Lazy::force(&SPEED_CAPPED_TOTAL);
}

/// Tekstformat (Prometheus exposition) for alle tellerne.
pub fn gather_text() -> String {
    init_all();
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buf) {
        log::warn!("kunne ikke kode metrikker: {e}");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
