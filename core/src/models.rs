use serde::{Deserialize, Serialize};

use crate::environment::{air_density_with_pressure, headwind_component, STD_PRESSURE_HPA};
use crate::error::{ensure_positive, SimError, SimResult};

pub const EFFORT_MIN: f64 = 0.5;
pub const EFFORT_MAX: f64 = 1.2;

/// Rytter + utstyr. Uforanderlig verdi som sendes by-ref inn i hver løsning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderEquipmentConfig {
    pub rider_mass_kg: f64,
    pub bike_mass_kg: f64,
    pub cda_m2: f64,
    pub crr: f64,
    #[serde(default = "default_drivetrain_efficiency")]
    pub drivetrain_efficiency: f64,
    pub ftp_w: f64,
    #[serde(default = "default_effort")]
    pub effort_fraction: f64,
}

fn default_drivetrain_efficiency() -> f64 {
    crate::physics::ETA_DEFAULT
}

fn default_effort() -> f64 {
    1.0
}

impl Default for RiderEquipmentConfig {
    fn default() -> Self {
        Self {
            rider_mass_kg: 70.0,
            bike_mass_kg: 8.0,
            cda_m2: 0.35,
            crr: 0.004,
            drivetrain_efficiency: crate::physics::ETA_DEFAULT,
            ftp_w: 250.0,
            effort_fraction: 1.0,
        }
    }
}

impl RiderEquipmentConfig {
    /// Total masse (kg) = rytter + sykkel.
    #[inline]
    pub fn total_mass_kg(&self) -> f64 {
        self.rider_mass_kg + self.bike_mass_kg
    }

    /// Målwatt for kjøringen: FTP × innsatsandel.
    #[inline]
    pub fn target_power_w(&self) -> f64 {
        self.ftp_w * self.effort_fraction
    }

    pub fn power_to_weight(&self) -> f64 {
        self.ftp_w / self.rider_mass_kg
    }

    pub fn with_rider_mass(mut self, kg: f64) -> Self {
        self.rider_mass_kg = kg;
        self
    }

    pub fn with_ftp(mut self, watts: f64) -> Self {
        self.ftp_w = watts;
        self
    }

    /// Avviser alt som ikke gir mening før noen solver kjøres.
    pub fn validate(&self) -> SimResult<()> {
        ensure_positive("rider_mass_kg", self.rider_mass_kg)?;
        ensure_positive("bike_mass_kg", self.bike_mass_kg)?;
        ensure_positive("cda_m2", self.cda_m2)?;
        ensure_positive("crr", self.crr)?;
        ensure_positive("ftp_w", self.ftp_w)?;
        ensure_positive("drivetrain_efficiency", self.drivetrain_efficiency)?;
        if self.drivetrain_efficiency > 1.0 {
            return Err(SimError::invalid(
                "drivetrain_efficiency",
                self.drivetrain_efficiency,
                "kan ikke overstige 1.0",
            ));
        }
        if !(EFFORT_MIN..=EFFORT_MAX).contains(&self.effort_fraction) {
            return Err(SimError::invalid(
                "effort_fraction",
                self.effort_fraction,
                "må ligge i [0.5, 1.2]",
            ));
        }
        Ok(())
    }
}

/// Vær for én kjøring. Vindretning er meteorologisk: hvor vinden kommer FRA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub temperature_c: f64,
    #[serde(default)]
    pub wind_speed_ms: f64,
    #[serde(default)]
    pub wind_from_deg: f64,
    #[serde(default = "default_pressure")]
    pub sea_level_pressure_hpa: f64,
}

fn default_pressure() -> f64 {
    STD_PRESSURE_HPA
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            temperature_c: 15.0,
            wind_speed_ms: 0.0,
            wind_from_deg: 0.0,
            sea_level_pressure_hpa: STD_PRESSURE_HPA,
        }
    }
}

impl EnvironmentConfig {
    pub fn calm(temperature_c: f64) -> Self {
        Self { temperature_c, ..Default::default() }
    }

    /// Vind oppgitt i km/t (som i værmeldinger).
    pub fn with_wind_kmh(temperature_c: f64, wind_kmh: f64, wind_from_deg: f64) -> Self {
        Self {
            temperature_c,
            wind_speed_ms: wind_kmh / 3.6,
            wind_from_deg,
            ..Default::default()
        }
    }

    pub fn air_density_at(&self, altitude_m: f64) -> f64 {
        air_density_with_pressure(self.temperature_c, self.sea_level_pressure_hpa, altitude_m)
    }

    /// Motvindskomponent langs `heading_deg` (positiv = motvind).
    pub fn headwind_component(&self, heading_deg: f64) -> f64 {
        headwind_component(self.wind_speed_ms, self.wind_from_deg, heading_deg)
    }

    pub fn validate(&self) -> SimResult<()> {
        if !self.temperature_c.is_finite() || self.temperature_c <= -273.15 {
            return Err(SimError::invalid(
                "temperature_c",
                self.temperature_c,
                "må være over absolutt null",
            ));
        }
        if !self.wind_speed_ms.is_finite() || self.wind_speed_ms < 0.0 {
            return Err(SimError::invalid("wind_speed_ms", self.wind_speed_ms, "må være >= 0"));
        }
        if !(0.0..360.0).contains(&self.wind_from_deg) {
            return Err(SimError::invalid("wind_from_deg", self.wind_from_deg, "må ligge i [0, 360)"));
        }
        ensure_positive("sea_level_pressure_hpa", self.sea_level_pressure_hpa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effort_outside_range_is_rejected() {
        let cfg = RiderEquipmentConfig { effort_fraction: 1.3, ..Default::default() };
        assert!(matches!(
            cfg.validate(),
            Err(SimError::InvalidConfiguration { field: "effort_fraction", .. })
        ));
        let cfg = RiderEquipmentConfig { effort_fraction: 0.5, ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn non_positive_mass_and_cda_are_rejected() {
        let cfg = RiderEquipmentConfig { rider_mass_kg: 0.0, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = RiderEquipmentConfig { cda_m2: -0.1, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = RiderEquipmentConfig { drivetrain_efficiency: 1.05, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_wind_is_rejected() {
        let env = EnvironmentConfig { wind_from_deg: 360.0, ..Default::default() };
        assert!(env.validate().is_err());
        let env = EnvironmentConfig { wind_speed_ms: -1.0, ..Default::default() };
        assert!(env.validate().is_err());
        assert!(EnvironmentConfig::with_wind_kmh(20.0, 18.0, 270.0).validate().is_ok());
    }

    #[test]
    fn target_power_is_ftp_times_effort() {
        let cfg = RiderEquipmentConfig { ftp_w: 300.0, effort_fraction: 0.9, ..Default::default() };
        assert!((cfg.target_power_w() - 270.0).abs() < 1e-12);
    }
}
