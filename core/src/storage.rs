use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::course::{Course, SegmentSpec};
use crate::models::{EnvironmentConfig, RiderEquipmentConfig};
use crate::simulator::SimulationSettings;

/// Leser JSON fra disk. Feil i innholdet rapporteres med feltsti (f.eks. `segments[3].distance_m`).
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("kunne ikke lese {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&contents);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let field = e.path().to_string();
        anyhow::Error::new(e.into_inner()).context(format!("ugyldig JSON i {} ved `{}`", path.display(), field))
    })
}

/// Lagrer som JSON (pretty-print).
pub fn save_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("kunne ikke skrive {}", path.display()))?;
    log::info!("lagret {}", path.display());
    Ok(())
}

/// Rytterkonfig fra disk, validert.
pub fn load_rider(path: impl AsRef<Path>) -> Result<RiderEquipmentConfig> {
    let cfg: RiderEquipmentConfig = load_json(&path)?;
    cfg.validate()
        .with_context(|| format!("ugyldig rytterkonfig i {}", path.as_ref().display()))?;
    log::info!(
        "rytter lastet fra {} ({} kg, FTP {} W)",
        path.as_ref().display(),
        cfg.rider_mass_kg,
        cfg.ftp_w
    );
    Ok(cfg)
}

pub fn load_environment(path: impl AsRef<Path>) -> Result<EnvironmentConfig> {
    let env: EnvironmentConfig = load_json(&path)?;
    env.validate()
        .with_context(|| format!("ugyldig værkonfig i {}", path.as_ref().display()))?;
    Ok(env)
}

/// Innstillinger. Finnes ikke filen, brukes standardverdier.
pub fn load_settings(path: impl AsRef<Path>) -> Result<SimulationSettings> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("fant ikke {}, bruker standardinnstillinger", path.display());
        return Ok(SimulationSettings::default());
    }
    let settings: SimulationSettings = load_json(path)?;
    settings
        .validate()
        .with_context(|| format!("ugyldige innstillinger i {}", path.display()))?;
    Ok(settings)
}

/// Filformat for en løype: segmentlisten slik track-parseren leverer den.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFile {
    pub name: String,
    #[serde(default)]
    pub start_elevation_m: f64,
    pub segments: Vec<SegmentSpec>,
}

pub fn load_course(path: impl AsRef<Path>) -> Result<Course> {
    let file: CourseFile = load_json(&path)?;
    let course = Course::from_specs(file.name, file.start_elevation_m, &file.segments)
        .with_context(|| format!("ugyldig løype i {}", path.as_ref().display()))?;
    log::info!(
        "løype {} lastet: {} segmenter, {:.1} km",
        course.name,
        course.len(),
        course.total_distance_m() / 1000.0
    );
    Ok(course)
}

pub fn save_course(file: &CourseFile, path: impl AsRef<Path>) -> Result<()> {
    save_json(file, path)
}
