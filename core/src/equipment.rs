//! Utstyrspresets: sittestilling, sykkeltype og hjul → CdA/masse, og Crr-estimat.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::models::RiderEquipmentConfig;
use crate::physics::ETA_DEFAULT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RidingPosition {
    Drops,
    #[default]
    Hoods,
    Tops,
    AeroBars,
}

impl RidingPosition {
    /// Rytterens CdA (m²) i stillingen.
    pub fn cda(&self) -> f64 {
        match self {
            RidingPosition::Drops => 0.30,
            RidingPosition::Hoods => 0.35,
            RidingPosition::Tops => 0.40,
            RidingPosition::AeroBars => 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BikeType {
    #[default]
    Road,
    Aero,
    Climbing,
    TimeTrial,
    Gravel,
}

impl BikeType {
    pub fn frame_cda(&self) -> f64 {
        match self {
            BikeType::Road => 0.15,
            BikeType::Aero => 0.12,
            BikeType::Climbing => 0.16,
            BikeType::TimeTrial => 0.08,
            BikeType::Gravel => 0.17,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelType {
    #[default]
    Standard,
    AeroShallow,
    AeroDeep,
    Disc,
    Climbing,
}

impl WheelType {
    pub fn cda(&self) -> f64 {
        match self {
            WheelType::Standard => 0.10,
            WheelType::AeroShallow => 0.08,
            WheelType::AeroDeep => 0.06,
            WheelType::Disc => 0.04,
            WheelType::Climbing => 0.11,
        }
    }

    /// Hjulsett-vekt (kg) når den ikke er oppgitt.
    pub fn default_weight_kg(&self) -> f64 {
        match self {
            WheelType::Standard => 1.8,
            WheelType::AeroShallow => 1.9,
            WheelType::AeroDeep => 2.1,
            WheelType::Disc => 2.3,
            WheelType::Climbing => 1.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireQuality {
    Training,
    #[default]
    Standard,
    Race,
}

impl TireQuality {
    fn factor(&self) -> f64 {
        match self {
            TireQuality::Training => 1.2,
            TireQuality::Standard => 1.0,
            TireQuality::Race => 0.85,
        }
    }
}

/// Crr-estimat fra dekkbredde/kvalitet.
pub fn estimate_crr(tire_width_mm: f64, quality: TireQuality) -> f64 {
    let w = if tire_width_mm.is_finite() && tire_width_mm >= 20.0 { tire_width_mm } else { 25.0 };
    let relative = (28.0 / w).powf(0.3);
    0.005 * relative * quality.factor()
}

pub const CLOTHING_MIN: f64 = 0.8;
pub const CLOTHING_MAX: f64 = 1.3;

/// Beskrivelse av rytter + utstyr på presetnivå.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSetup {
    #[serde(default)]
    pub position: RidingPosition,
    /// Overstyrer stillingens CdA.
    #[serde(default)]
    pub rider_cda_m2: Option<f64>,
    /// 0.8 = skinsuit, 1.0 = vanlig, 1.3 = løse klær
    #[serde(default = "one")]
    pub clothing_drag_multiplier: f64,
    #[serde(default)]
    pub bike_type: BikeType,
    pub frame_weight_kg: f64,
    #[serde(default)]
    pub wheel_type: WheelType,
    #[serde(default)]
    pub wheel_weight_kg: Option<f64>,
    #[serde(default = "default_tire_width")]
    pub tire_width_mm: f64,
    #[serde(default)]
    pub tire_quality: TireQuality,
}

fn one() -> f64 {
    1.0
}

fn default_tire_width() -> f64 {
    28.0
}

impl Default for EquipmentSetup {
    fn default() -> Self {
        Self {
            position: RidingPosition::default(),
            rider_cda_m2: None,
            clothing_drag_multiplier: 1.0,
            bike_type: BikeType::default(),
            frame_weight_kg: 8.0,
            wheel_type: WheelType::default(),
            wheel_weight_kg: None,
            tire_width_mm: 28.0,
            tire_quality: TireQuality::default(),
        }
    }
}

impl EquipmentSetup {
    pub fn rider_cda(&self) -> f64 {
        self.rider_cda_m2.unwrap_or_else(|| self.position.cda()) * self.clothing_drag_multiplier
    }

    /// Rytter + ramme + hjul.
    pub fn total_cda(&self) -> f64 {
        self.rider_cda() + self.bike_type.frame_cda() + self.wheel_type.cda()
    }

    pub fn bike_mass_kg(&self) -> f64 {
        self.frame_weight_kg + self.wheel_weight_kg.unwrap_or_else(|| self.wheel_type.default_weight_kg())
    }

    /// Lag en validert `RiderEquipmentConfig`.
    pub fn to_config(&self, rider_mass_kg: f64, ftp_w: f64, effort_fraction: f64) -> SimResult<RiderEquipmentConfig> {
        if !(CLOTHING_MIN..=CLOTHING_MAX).contains(&self.clothing_drag_multiplier) {
            return Err(SimError::invalid(
                "clothing_drag_multiplier",
                self.clothing_drag_multiplier,
                "må ligge i [0.8, 1.3]",
            ));
        }
        let cfg = RiderEquipmentConfig {
            rider_mass_kg,
            bike_mass_kg: self.bike_mass_kg(),
            cda_m2: self.total_cda(),
            crr: estimate_crr(self.tire_width_mm, self.tire_quality),
            drivetrain_efficiency: ETA_DEFAULT,
            ftp_w,
            effort_fraction,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crr_quality_ordering_for_same_width() {
        let training = estimate_crr(28.0, TireQuality::Training);
        let standard = estimate_crr(28.0, TireQuality::Standard);
        let race = estimate_crr(28.0, TireQuality::Race);
        assert!(training > standard && standard > race);
        assert!((standard - 0.005).abs() < 1e-12);
    }

    #[test]
    fn narrow_or_bogus_width_falls_back_to_25mm() {
        let fallback = estimate_crr(25.0, TireQuality::Standard);
        assert_eq!(estimate_crr(8.0, TireQuality::Standard), fallback);
        assert_eq!(estimate_crr(f64::NAN, TireQuality::Standard), fallback);
        assert!(estimate_crr(40.0, TireQuality::Standard) < estimate_crr(23.0, TireQuality::Standard));
    }

    #[test]
    fn setup_resolves_cda_and_mass() {
        let setup = EquipmentSetup {
            position: RidingPosition::AeroBars,
            clothing_drag_multiplier: 0.8,
            bike_type: BikeType::TimeTrial,
            wheel_type: WheelType::Disc,
            frame_weight_kg: 7.0,
            ..Default::default()
        };
        let cfg = setup.to_config(70.0, 300.0, 0.95).unwrap();
        assert!((cfg.cda_m2 - (0.25 * 0.8 + 0.08 + 0.04)).abs() < 1e-12);
        assert!((cfg.bike_mass_kg - 9.3).abs() < 1e-12);
    }

    #[test]
    fn explicit_rider_cda_and_wheel_weight_win() {
        let setup = EquipmentSetup {
            rider_cda_m2: Some(0.28),
            wheel_weight_kg: Some(1.2),
            ..Default::default()
        };
        assert!((setup.rider_cda() - 0.28).abs() < 1e-12);
        assert!((setup.bike_mass_kg() - 9.2).abs() < 1e-12);
    }

    #[test]
    fn clothing_out_of_range_is_rejected() {
        let setup = EquipmentSetup { clothing_drag_multiplier: 1.5, ..Default::default() };
        assert!(setup.to_config(70.0, 250.0, 1.0).is_err());
    }
}
