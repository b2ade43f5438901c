//! Sammenligning: kjør simulatoren én gang per verdi i en sweep og rapporter
//! deltaer mot en baseline-kjøring.

use std::collections::BTreeMap;

use log::info;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::course::Course;
use crate::error::{SimError, SimResult};
use crate::models::{EnvironmentConfig, RiderEquipmentConfig};
use crate::simulator::{simulate_with, SimulationResult, SimulationSettings};

/// Feltet som varieres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    /// Ryttervekt (kg).
    Mass,
    /// FTP (W); målwatt = FTP × innsatsandel.
    Power,
}

impl SweepParameter {
    pub fn current_value(&self, rider: &RiderEquipmentConfig) -> f64 {
        match self {
            SweepParameter::Mass => rider.rider_mass_kg,
            SweepParameter::Power => rider.ftp_w,
        }
    }

    /// Kopi av `base` der bare det sweepede feltet er endret.
    pub fn apply(&self, base: &RiderEquipmentConfig, value: f64) -> RiderEquipmentConfig {
        match self {
            SweepParameter::Mass => base.with_rider_mass(value),
            SweepParameter::Power => base.with_ftp(value),
        }
    }
}

/// Hvilken kjøring deltaene regnes mot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Baseline {
    /// Basiskonfigurasjonens nåværende verdi (legges til sweepen om den mangler).
    #[default]
    Current,
    /// Første verdi i listen slik den ble gitt.
    First,
    /// Eksplisitt verdi (legges til sweepen om den mangler).
    Value(f64),
}

/// Differanse mot baseline. Negativ tid = raskere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunDelta {
    pub time_delta_s: f64,
    pub speed_delta_ms: f64,
}

/// Én rad for presentasjonslag (serialiserbar, i stigende verdi-rekkefølge).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub value: f64,
    pub is_baseline: bool,
    pub total_time_s: f64,
    pub average_speed_ms: f64,
    pub average_power_w: f64,
    pub time_delta_s: f64,
    pub speed_delta_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub parameter: SweepParameter,
    baseline: OrderedFloat<f64>,
    runs: BTreeMap<OrderedFloat<f64>, SimulationResult>,
}

impl ComparisonResult {
    pub fn baseline_value(&self) -> f64 {
        self.baseline.into_inner()
    }

    pub fn baseline(&self) -> &SimulationResult {
        // konstruktøren garanterer at baseline-nøkkelen finnes
        &self.runs[&self.baseline]
    }

    pub fn get(&self, value: f64) -> Option<&SimulationResult> {
        self.runs.get(&OrderedFloat(value))
    }

    /// Kjøringer i stigende verdi-rekkefølge.
    pub fn runs(&self) -> impl Iterator<Item = (f64, &SimulationResult)> {
        self.runs.iter().map(|(k, v)| (k.into_inner(), v))
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Delta for én verdi, regnet ut ved behov.
    pub fn delta(&self, value: f64) -> Option<RunDelta> {
        let run = self.get(value)?;
        let base = self.baseline();
        Some(RunDelta {
            time_delta_s: run.total_time_s - base.total_time_s,
            speed_delta_ms: run.average_speed_ms - base.average_speed_ms,
        })
    }

    pub fn deltas(&self) -> Vec<(f64, RunDelta)> {
        self.runs()
            .filter_map(|(v, _)| self.delta(v).map(|d| (v, d)))
            .collect()
    }

    pub fn fastest(&self) -> Option<(f64, &SimulationResult)> {
        self.runs()
            .min_by(|a, b| a.1.total_time_s.total_cmp(&b.1.total_time_s))
    }

    pub fn rows(&self) -> Vec<ComparisonRow> {
        let base = self.baseline();
        self.runs()
            .map(|(value, r)| ComparisonRow {
                value,
                is_baseline: OrderedFloat(value) == self.baseline,
                total_time_s: r.total_time_s,
                average_speed_ms: r.average_speed_ms,
                average_power_w: r.average_power_w,
                time_delta_s: r.total_time_s - base.total_time_s,
                speed_delta_ms: r.average_speed_ms - base.average_speed_ms,
            })
            .collect()
    }
}

/// Sweep `parameter` over `values`, baseline = basiskonfigurasjonens verdi.
pub fn compare(
    course: &Course,
    base_rider: &RiderEquipmentConfig,
    base_environment: &EnvironmentConfig,
    parameter: SweepParameter,
    values: &[f64],
) -> SimResult<ComparisonResult> {
    compare_with(
        course,
        base_rider,
        base_environment,
        parameter,
        values,
        Baseline::Current,
        &SimulationSettings::default(),
    )
}

pub fn compare_with(
    course: &Course,
    base_rider: &RiderEquipmentConfig,
    base_environment: &EnvironmentConfig,
    parameter: SweepParameter,
    values: &[f64],
    baseline: Baseline,
    settings: &SimulationSettings,
) -> SimResult<ComparisonResult> {
    let Some(&first) = values.first() else {
        return Err(SimError::EmptySweep);
    };
    let baseline_value = match baseline {
        Baseline::Current => parameter.current_value(base_rider),
        Baseline::First => first,
        Baseline::Value(v) => v,
    };

    let mut keys: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    keys.push(OrderedFloat(baseline_value));
    keys.sort();
    keys.dedup();

    // Valider alle varianter før noe kjøres
    let configs = keys
        .iter()
        .map(|k| {
            let cfg = parameter.apply(base_rider, k.into_inner());
            cfg.validate().map(|_| (*k, cfg))
        })
        .collect::<SimResult<Vec<_>>>()?;

    // Uavhengige, rene kjøringer: parallelt uten delt muterbar tilstand
    let runs = configs
        .par_iter()
        .map(|(k, cfg)| simulate_with(course, cfg, base_environment, settings).map(|r| (*k, r)))
        .collect::<SimResult<BTreeMap<_, _>>>()?;

    let result = ComparisonResult {
        parameter,
        baseline: OrderedFloat(baseline_value),
        runs,
    };
    info!(
        "{:?}-sweep på {}: {} kjøringer, baseline {}",
        parameter,
        course.name,
        result.len(),
        baseline_value
    );
    Ok(result)
}

/// Navngitt scenario (rytter + vær) for rangering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub rider: RiderEquipmentConfig,
    pub environment: EnvironmentConfig,
}

/// Kjør alle scenarioer og returner dem sortert raskest først.
pub fn compare_scenarios(
    course: &Course,
    scenarios: &[Scenario],
    settings: &SimulationSettings,
) -> SimResult<Vec<(String, SimulationResult)>> {
    if scenarios.is_empty() {
        return Err(SimError::EmptySweep);
    }
    let mut out = scenarios
        .par_iter()
        .map(|s| {
            simulate_with(course, &s.rider, &s.environment, settings).map(|r| (s.name.clone(), r))
        })
        .collect::<SimResult<Vec<_>>>()?;
    out.sort_by(|a, b| a.1.total_time_s.total_cmp(&b.1.total_time_s));
    Ok(out)
}
