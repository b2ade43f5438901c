//! Segment-solver: finner stasjonær fart for en gitt målwatt.
//!
//! Kraftbalansen `power(v) = target` har ingen lukket invers, så vi bruker
//! Newton med analytisk derivert, sikret av en bisection-brakett. Spesialtilfellene
//! (frihjul i utforkjøring, for lite watt i bratt motbakke, fartstak) er egne
//! utfall slik at rapporteringen kan skille dem fra vanlig konvergens.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::course::Segment;
use crate::error::{ensure_positive, SimError, SimResult};
use crate::metrics;
use crate::models::{EnvironmentConfig, RiderEquipmentConfig};
use crate::physics::PowerModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Absolutt residual (W) for konvergens.
    pub tolerance_w: f64,
    pub max_iterations: usize,
    /// Øvre søkegrense (m/s).
    pub v_max_ms: f64,
    /// Laveste fart som rapporteres i power-limited motbakker (m/s).
    pub crawl_speed_ms: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance_w: 0.01,
            max_iterations: 100,
            v_max_ms: 40.0,
            crawl_speed_ms: 1.0,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> SimResult<()> {
        ensure_positive("tolerance_w", self.tolerance_w)?;
        ensure_positive("v_max_ms", self.v_max_ms)?;
        ensure_positive("crawl_speed_ms", self.crawl_speed_ms)?;
        if self.crawl_speed_ms >= self.v_max_ms {
            return Err(SimError::invalid("crawl_speed_ms", self.crawl_speed_ms, "må være under v_max_ms"));
        }
        if self.max_iterations == 0 {
            return Err(SimError::invalid("max_iterations", 0.0, "må være >= 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolveOutcome {
    /// Vanlig løsning, `|power(v) - target| < tolerance`.
    Converged { iterations: usize },
    /// Frihjul: terminalfarten ligger over `v_max_ms` (eller målwatt er 0),
    /// så farten er terminalfarten kappet ved taket og rytteren bidrar ikke.
    FreeDescent,
    /// Målwatt holder ikke til krypfart; farten er klemt til `crawl_speed_ms`.
    PowerLimited,
    /// Målwatt overstiger det som trengs ved `v_max_ms`.
    SpeedCapped,
}

impl SolveOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, SolveOutcome::Converged { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentSolution {
    pub speed_ms: f64,
    /// Effekt tilskrevet rytteren (W). 0 ved frihjul.
    pub power_w: f64,
    pub outcome: SolveOutcome,
}

/// Løs farten for ett segment med standardinnstillinger.
/// Lufttetthet tas i segmentets midtre høyde, vind projiseres på segmentets kurs.
pub fn solve_speed(
    target_power: f64,
    segment: &Segment,
    rider: &RiderEquipmentConfig,
    environment: &EnvironmentConfig,
) -> SimResult<SegmentSolution> {
    ensure_positive("target_power", target_power)?;
    rider.validate()?;
    environment.validate()?;
    let model = PowerModel::new(
        segment,
        rider,
        environment.air_density_at(segment.mid_elevation_m()),
        environment.headwind_component(segment.heading_deg),
    );
    solve_model(target_power, &model, &SolverSettings::default(), 0)
}

/// Kjernen: invertér `model.power(v) = target`. `segment_index` brukes bare i feil/logg.
pub fn solve_model(
    target_power: f64,
    model: &PowerModel,
    settings: &SolverSettings,
    segment_index: usize,
) -> SimResult<SegmentSolution> {
    let sol = solve_inner(target_power, model, settings, segment_index)?;
    metrics::record_solve(&sol.outcome);
    Ok(sol)
}

fn solve_inner(
    target: f64,
    model: &PowerModel,
    settings: &SolverSettings,
    segment_index: usize,
) -> SimResult<SegmentSolution> {
    let SolverSettings { tolerance_w, max_iterations, v_max_ms, crawl_speed_ms } = *settings;

    let f = |v: f64| model.power(v) - target;

    // power(v) er strengt voksende over terminalfarten (assistert) og over 0
    // (ikke assistert), så roten er entydig i braketten.
    let mut lo = if model.is_gravity_assisted() {
        let Some(vt) = model.terminal_speed() else {
            return Err(SimError::SolverNonConvergence {
                segment_index,
                iterations: 0,
                residual_w: f64::NAN,
            });
        };
        // Ingen rot under v_max: tyngdekraften alene bærer rytteren forbi taket
        if vt >= v_max_ms || target <= 0.0 {
            let v = vt.min(v_max_ms);
            debug!("seg #{segment_index}: frihjul, terminalfart {vt:.2} m/s");
            return Ok(SegmentSolution { speed_ms: v, power_w: 0.0, outcome: SolveOutcome::FreeDescent });
        }
        vt
    } else {
        let f_crawl = f(crawl_speed_ms);
        if f_crawl >= 0.0 {
            warn!(
                "seg #{segment_index}: {target:.0} W holder ikke {crawl_speed_ms} m/s (trenger {:.0} W), power-limited",
                f_crawl + target
            );
            return Ok(SegmentSolution {
                speed_ms: crawl_speed_ms,
                power_w: f_crawl + target,
                outcome: SolveOutcome::PowerLimited,
            });
        }
        crawl_speed_ms
    };
    let mut hi = v_max_ms;

    let f_hi = f(hi);
    if f_hi <= 0.0 {
        warn!("seg #{segment_index}: {target:.0} W gir over {v_max_ms} m/s, fart kappet");
        return Ok(SegmentSolution {
            speed_ms: v_max_ms,
            power_w: f_hi + target,
            outcome: SolveOutcome::SpeedCapped,
        });
    }

    let mut v = lo + 0.25 * (hi - lo);
    let mut fv = f(v);
    for iteration in 1..=max_iterations {
        if fv.abs() < tolerance_w {
            debug!("seg #{segment_index}: v={v:.3} m/s etter {iteration} iterasjoner");
            return Ok(SegmentSolution {
                speed_ms: v,
                power_w: fv + target,
                outcome: SolveOutcome::Converged { iterations: iteration },
            });
        }
        if fv < 0.0 { lo = v } else { hi = v }

        let d = model.power_derivative(v);
        let newton = v - fv / d;
        v = if d > 0.0 && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        fv = f(v);
    }

    Err(SimError::SolverNonConvergence {
        segment_index,
        iterations: max_iterations,
        residual_w: fv,
    })
}
