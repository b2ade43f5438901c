//! Kjerne for tidsestimat på en kjent løype: kraftbalanse per segment,
//! numerisk løsning for fart, integrasjon over hele løypa og sweeps
//! (vekt / FTP) med deltaer mot en baseline.

pub mod compare;
pub mod course;
pub mod environment;
pub mod equipment;
pub mod error;
pub mod metrics;
pub mod models;
pub mod physics;
pub mod simulator;
pub mod solver;
pub mod storage;

pub use compare::{
    compare, compare_scenarios, compare_with, Baseline, ComparisonResult, ComparisonRow, RunDelta,
    Scenario, SweepParameter,
};
pub use course::{Course, Segment, SegmentSpec, Terrain, TrackPoint};
pub use environment::{air_density, headwind_component};
pub use equipment::{estimate_crr, EquipmentSetup};
pub use error::{SimError, SimResult};
pub use models::{EnvironmentConfig, RiderEquipmentConfig};
pub use physics::{power_breakdown, required_power, PowerBreakdown, PowerModel};
pub use simulator::{simulate, simulate_with, SegmentResult, SimulationResult, SimulationSettings};
pub use solver::{solve_speed, SegmentSolution, SolveOutcome, SolverSettings};
