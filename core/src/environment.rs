//! Miljømodell: lufttetthet og vindprojeksjon.

pub const STD_PRESSURE_HPA: f64 = 1013.25;
/// Gasskonstant for tørr luft (J/(kg·K)).
pub const R_DRY: f64 = 287.05;

// Barometrisk formel (troposfæren, ICAO)
const BARO_COEFF: f64 = 2.255_77e-5;
const BARO_EXP: f64 = 5.255_88;

/// Lufttetthet (kg/m³) fra temperatur og høyde, standard havnivåtrykk.
pub fn air_density(temperature_c: f64, altitude_m: f64) -> f64 {
    air_density_with_pressure(temperature_c, STD_PRESSURE_HPA, altitude_m)
}

/// Lufttetthet med oppgitt havnivåtrykk (hPa).
/// Trykket skaleres til høyden, deretter ideell gass `p / (R·T)`.
pub fn air_density_with_pressure(temperature_c: f64, sea_level_hpa: f64, altitude_m: f64) -> f64 {
    let p_pa = pressure_at_altitude_pa(sea_level_hpa, altitude_m);
    let t_k = temperature_c + 273.15;
    p_pa / (R_DRY * t_k)
}

/// Stasjonstrykk (Pa) i gitt høyde.
pub fn pressure_at_altitude_pa(sea_level_hpa: f64, altitude_m: f64) -> f64 {
    let base = (1.0 - BARO_COEFF * altitude_m).max(0.0);
    sea_level_hpa * 100.0 * base.powf(BARO_EXP)
}

/// Normaliser vinkel til [0, 360)
pub fn norm_deg(d: f64) -> f64 {
    let x = d.rem_euclid(360.0);
    // rem_euclid kan gi 360.0 for små negative tall pga. avrunding
    if x >= 360.0 { 0.0 } else { x }
}

/// Relativ vinkel (vind fra) minus heading, foldet til [-180, 180]
pub fn relative_angle_deg(heading_deg: f64, wind_from_deg: f64) -> f64 {
    let mut delta = norm_deg(wind_from_deg) - norm_deg(heading_deg);
    if delta > 180.0 {
        delta -= 360.0;
    }
    if delta < -180.0 {
        delta += 360.0;
    }
    delta
}

/// Headwind-komponent (positiv = motvind) langs kjøreretningen.
/// Meteorologisk vindretning = hvorfra vinden kommer, så
/// cos(0)=1 => full motvind; cos(180)=-1 => full medvind.
pub fn headwind_component(wind_speed_ms: f64, wind_from_deg: f64, heading_deg: f64) -> f64 {
    let rel = relative_angle_deg(heading_deg, wind_from_deg).to_radians();
    let w = wind_speed_ms * rel.cos();
    // Vindstille/sidevind: ikke la -0.0 og 1e-16 lekke ut
    if w.abs() < 1e-9 { 0.0 } else { w }
}
