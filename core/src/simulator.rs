use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::course::{Course, Terrain};
use crate::error::{SimError, SimResult};
use crate::metrics;
use crate::models::{EnvironmentConfig, RiderEquipmentConfig};
use crate::physics::PowerModel;
use crate::solver::{solve_model, SolveOutcome, SolverSettings};

/// ±1 % stigning skiller flatt fra stigning/utforkjøring.
pub const DEFAULT_TERRAIN_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub solver: SolverSettings,
    /// Stigning (andel) for terrengklassifisering.
    pub terrain_threshold: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            terrain_threshold: DEFAULT_TERRAIN_THRESHOLD,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> SimResult<()> {
        self.solver.validate()?;
        if !self.terrain_threshold.is_finite() || self.terrain_threshold < 0.0 {
            return Err(SimError::invalid("terrain_threshold", self.terrain_threshold, "må være >= 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentResult {
    pub index: usize,
    pub distance_m: f64,
    pub gradient: f64,
    pub terrain: Terrain,
    pub headwind_ms: f64,
    pub air_density: f64,
    pub speed_ms: f64,
    pub time_s: f64,
    pub power_w: f64,
    pub outcome: SolveOutcome,
}

impl SegmentResult {
    pub fn speed_kmh(&self) -> f64 {
        self.speed_ms * 3.6
    }

    pub fn energy_j(&self) -> f64 {
        self.power_w * self.time_s
    }
}

/// Tid/distanse/energi summert for én terrengklasse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TerrainTotals {
    pub time_s: f64,
    pub distance_m: f64,
    pub energy_j: f64,
}

impl TerrainTotals {
    fn add(&mut self, seg: &SegmentResult) {
        self.time_s += seg.time_s;
        self.distance_m += seg.distance_m;
        self.energy_j += seg.energy_j();
    }

    /// Tidsvektet snittwatt i klassen.
    pub fn average_power_w(&self) -> f64 {
        if self.time_s > 0.0 { self.energy_j / self.time_s } else { 0.0 }
    }

    pub fn average_speed_ms(&self) -> f64 {
        if self.time_s > 0.0 { self.distance_m / self.time_s } else { 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TerrainBreakdown {
    pub climbing: TerrainTotals,
    pub flat: TerrainTotals,
    pub descending: TerrainTotals,
}

impl TerrainBreakdown {
    pub fn get(&self, terrain: Terrain) -> &TerrainTotals {
        match terrain {
            Terrain::Climbing => &self.climbing,
            Terrain::Flat => &self.flat,
            Terrain::Descending => &self.descending,
        }
    }

    fn get_mut(&mut self, terrain: Terrain) -> &mut TerrainTotals {
        match terrain {
            Terrain::Climbing => &mut self.climbing,
            Terrain::Flat => &mut self.flat,
            Terrain::Descending => &mut self.descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub course_name: String,
    pub rider: RiderEquipmentConfig,
    pub environment: EnvironmentConfig,
    pub target_power_w: f64,
    pub segments: Vec<SegmentResult>,
    pub total_time_s: f64,
    pub total_distance_m: f64,
    pub average_speed_ms: f64,
    pub average_power_w: f64,
    pub total_energy_j: f64,
    pub terrain: TerrainBreakdown,
    pub power_limited_segments: usize,
    pub free_descent_segments: usize,
}

impl SimulationResult {
    pub fn average_speed_kmh(&self) -> f64 {
        self.average_speed_ms * 3.6
    }

    /// HH:MM:SS
    pub fn total_time_hms(&self) -> String {
        let t = self.total_time_s.round() as u64;
        format!("{:02}:{:02}:{:02}", t / 3600, (t % 3600) / 60, t % 60)
    }
}

/// Simuler hele løypa med standardinnstillinger.
pub fn simulate(
    course: &Course,
    rider: &RiderEquipmentConfig,
    environment: &EnvironmentConfig,
) -> SimResult<SimulationResult> {
    simulate_with(course, rider, environment, &SimulationSettings::default())
}

pub fn simulate_with(
    course: &Course,
    rider: &RiderEquipmentConfig,
    environment: &EnvironmentConfig,
    settings: &SimulationSettings,
) -> SimResult<SimulationResult> {
    rider.validate()?;
    environment.validate()?;
    settings.validate()?;
    if course.is_empty() {
        return Err(SimError::EmptyCourse);
    }

    let target = rider.target_power_w();
    let mut segments = Vec::with_capacity(course.len());
    let mut terrain = TerrainBreakdown::default();

    for (i, seg) in course.segments().iter().enumerate() {
        let headwind = environment.headwind_component(seg.heading_deg);
        let rho = environment.air_density_at(seg.mid_elevation_m());
        let model = PowerModel::new(seg, rider, rho, headwind);
        let sol = solve_model(target, &model, &settings.solver, i)?;

        let distance_m = seg.distance_m();
        let res = SegmentResult {
            index: i,
            distance_m,
            gradient: seg.gradient(),
            terrain: seg.terrain(settings.terrain_threshold),
            headwind_ms: headwind,
            air_density: rho,
            speed_ms: sol.speed_ms,
            time_s: distance_m / sol.speed_ms,
            power_w: sol.power_w,
            outcome: sol.outcome,
        };
        terrain.get_mut(res.terrain).add(&res);
        segments.push(res);
    }

    let total_time_s: f64 = segments.iter().map(|s| s.time_s).sum();
    let total_distance_m: f64 = segments.iter().map(|s| s.distance_m).sum();
    let total_energy_j: f64 = segments.iter().map(SegmentResult::energy_j).sum();
    let count = |o: SolveOutcome| segments.iter().filter(|s| s.outcome == o).count();
    let power_limited_segments = count(SolveOutcome::PowerLimited);
    let free_descent_segments = count(SolveOutcome::FreeDescent);

    let result = SimulationResult {
        course_name: course.name.clone(),
        rider: *rider,
        environment: *environment,
        target_power_w: target,
        total_time_s,
        total_distance_m,
        average_speed_ms: total_distance_m / total_time_s,
        average_power_w: total_energy_j / total_time_s,
        total_energy_j,
        terrain,
        power_limited_segments,
        free_descent_segments,
        segments,
    };

    debug!(
        "{}: klatring {:.0}s, flatt {:.0}s, utfor {:.0}s",
        result.course_name, terrain.climbing.time_s, terrain.flat.time_s, terrain.descending.time_s
    );
    info!(
        "{}: {:.1} km på {} ({:.1} km/t, snitt {:.0} W)",
        result.course_name,
        total_distance_m / 1000.0,
        result.total_time_hms(),
        result.average_speed_kmh(),
        result.average_power_w
    );
    metrics::record_simulation();
    Ok(result)
}
