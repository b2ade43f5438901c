// core/src/physics.rs
use serde::Serialize;

use crate::course::Segment;
use crate::models::RiderEquipmentConfig;

pub const G: f64 = 9.80665;         // gravitasjon (m/s²)
pub const ETA_DEFAULT: f64 = 0.975; // standard drivverkseffektivitet crank→hjul

/// Kraftbalansen for ett segment med fast rytter/luft/vind.
///
/// Alle ledd som ikke avhenger av farten er regnet ut én gang, slik at
/// solveren kan evaluere `power(v)` mange ganger billig.
#[derive(Debug, Clone, Copy)]
pub struct PowerModel {
    /// 0.5 · CdA · ρ
    k_aero: f64,
    /// Crr · m · g · cosθ
    f_roll: f64,
    /// m · g · sinθ (signert)
    f_climb: f64,
    headwind: f64,
    eta: f64,
}

/// Komponentene (hjulside) og total crank-effekt ved en gitt fart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerBreakdown {
    pub aero_w: f64,
    pub rolling_w: f64,
    pub climb_w: f64,
    pub total_w: f64,
}

impl PowerModel {
    pub fn new(segment: &Segment, rider: &RiderEquipmentConfig, air_density: f64, headwind: f64) -> Self {
        let mass = rider.total_mass_kg();
        let (sin_t, cos_t) = segment.slope_sin_cos();
        Self {
            k_aero: 0.5 * rider.cda_m2 * air_density,
            f_roll: rider.crr * mass * G * cos_t,
            f_climb: mass * G * sin_t,
            headwind,
            eta: rider.drivetrain_efficiency,
        }
    }

    /// Luftmotstand (N) ved fart `v`. Signert kvadrat: medvind raskere enn
    /// rytteren dytter i stedet for å bremse.
    #[inline]
    fn aero_force(&self, v: f64) -> f64 {
        let rel = v + self.headwind;
        self.k_aero * rel * rel.abs()
    }

    /// Netto motstandskraft (N) ved fart `v`, hjulside.
    #[inline]
    pub fn resistive_force(&self, v: f64) -> f64 {
        self.aero_force(v) + self.f_roll + self.f_climb
    }

    /// Nødvendig crank-effekt (W) for å holde `v`. Kan bli negativ i bratte utforkjøringer.
    #[inline]
    pub fn power(&self, v: f64) -> f64 {
        self.resistive_force(v) * v / self.eta
    }

    /// d(power)/dv, analytisk.
    #[inline]
    pub fn power_derivative(&self, v: f64) -> f64 {
        let rel = v + self.headwind;
        let d_aero = self.k_aero * (rel * rel.abs() + 2.0 * rel.abs() * v);
        (d_aero + self.f_roll + self.f_climb) / self.eta
    }

    pub fn breakdown(&self, v: f64) -> PowerBreakdown {
        let aero_w = self.aero_force(v) * v;
        let rolling_w = self.f_roll * v;
        let climb_w = self.f_climb * v;
        PowerBreakdown {
            aero_w,
            rolling_w,
            climb_w,
            total_w: (aero_w + rolling_w + climb_w) / self.eta,
        }
    }

    /// Tyngdekraft (+ evt. medvindsdytt) større enn rullemotstanden ved stillstand:
    /// rytteren ruller av seg selv.
    #[inline]
    pub fn is_gravity_assisted(&self) -> bool {
        self.resistive_force(0.0) < 0.0
    }

    /// Terminalfart ved frihjul: farten der netto kraft er null.
    /// `None` når segmentet ikke er gravitasjonsassistert.
    pub fn terminal_speed(&self) -> Option<f64> {
        if !self.is_gravity_assisted() {
            return None;
        }
        // k·(v+w)|v+w| = -(f_roll + f_climb) > 0  =>  v + w = sqrt(F/k)
        let push = -(self.f_roll + self.f_climb);
        let v = if push > 0.0 {
            (push / self.k_aero).sqrt() - self.headwind
        } else {
            // Bare medvind dytter (flatt/motbakke): rytteren når vindfarten
            -self.headwind - (-push / self.k_aero).sqrt()
        };
        (v.is_finite() && v > 0.0).then_some(v)
    }
}

/// Nødvendig effekt (W) for å holde `speed` på segmentet.
///
/// `headwind` er motvindskomponenten langs kjøreretningen (positiv = motvind),
/// `air_density` i kg/m³. Gyldig for `speed >= 0`.
pub fn required_power(
    speed: f64,
    segment: &Segment,
    rider: &RiderEquipmentConfig,
    air_density: f64,
    headwind: f64,
) -> f64 {
    PowerModel::new(segment, rider, air_density, headwind).power(speed.max(0.0))
}

/// Som `required_power`, men med komponentene.
pub fn power_breakdown(
    speed: f64,
    segment: &Segment,
    rider: &RiderEquipmentConfig,
    air_density: f64,
    headwind: f64,
) -> PowerBreakdown {
    PowerModel::new(segment, rider, air_density, headwind).breakdown(speed.max(0.0))
}
