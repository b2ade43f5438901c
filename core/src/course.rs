// core/src/course.rs
use serde::{Deserialize, Serialize};

use crate::environment::norm_deg;
use crate::error::{SimError, SimResult};

/// Jordradius (m), middelverdi.
const EARTH_RADIUS_M: f64 = 6_371_008.8;
pub const DEFAULT_MIN_SEGMENT_M: f64 = 10.0;

/// Terrengklasse for rapportering (stigning / flatt / utforkjøring).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Climbing,
    Flat,
    Descending,
}

impl Terrain {
    /// `threshold` er stigning som andel (0.01 = 1 %).
    pub fn classify(gradient: f64, threshold: f64) -> Self {
        if gradient > threshold {
            Terrain::Climbing
        } else if gradient < -threshold {
            Terrain::Descending
        } else {
            Terrain::Flat
        }
    }
}

/// Én bit av løypa med konstant stigning og retning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_m: f64,
    pub end_m: f64,
    #[serde(default)]
    pub start_elevation_m: f64,
    pub elevation_change_m: f64,
    pub heading_deg: f64,
}

impl Segment {
    pub fn new(
        start_m: f64,
        end_m: f64,
        start_elevation_m: f64,
        elevation_change_m: f64,
        heading_deg: f64,
    ) -> SimResult<Self> {
        let seg = Self {
            start_m,
            end_m,
            start_elevation_m,
            elevation_change_m,
            heading_deg: norm_deg(heading_deg),
        };
        seg.check(0)?;
        Ok(seg)
    }

    fn check(&self, index: usize) -> SimResult<()> {
        let d = self.distance_m();
        if !d.is_finite() || d <= 0.0 || !self.gradient().is_finite() || !self.heading_deg.is_finite() {
            return Err(SimError::DegenerateSegment { index, distance_m: d });
        }
        Ok(())
    }

    #[inline]
    pub fn distance_m(&self) -> f64 {
        self.end_m - self.start_m
    }

    /// Stigning (rise/run), negativ i utforkjøring.
    #[inline]
    pub fn gradient(&self) -> f64 {
        self.elevation_change_m / self.distance_m()
    }

    #[inline]
    pub fn gradient_percent(&self) -> f64 {
        self.gradient() * 100.0
    }

    /// sin/cos av hellingsvinkelen, eksakt også i bratte bakker.
    #[inline]
    pub fn slope_sin_cos(&self) -> (f64, f64) {
        self.gradient().atan().sin_cos()
    }

    pub fn mid_elevation_m(&self) -> f64 {
        self.start_elevation_m + 0.5 * self.elevation_change_m
    }

    pub fn terrain(&self, threshold: f64) -> Terrain {
        Terrain::classify(self.gradient(), threshold)
    }
}

/// Kompakt segmentbeskrivelse (slik track-parseren leverer den).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub distance_m: f64,
    pub elevation_change_m: f64,
    #[serde(default)]
    pub heading_deg: f64,
}

/// Ferdig parset GPS-punkt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub elevation_m: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64, elevation_m: f64) -> Self {
        Self { lat, lon, elevation_m }
    }

    /// Haversine-avstand (m).
    pub fn distance_to(&self, other: &TrackPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// Initiell kurs (0 = nord, 90 = øst), [0, 360).
    pub fn heading_to(&self, other: &TrackPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlon = (other.lon - self.lon).to_radians();
        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        norm_deg(y.atan2(x).to_degrees())
    }
}

/// Løype: navn + ordnede segmenter. Eies eksplisitt av kalleren, ingen global cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    segments: Vec<Segment>,
}

impl Course {
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> SimResult<Self> {
        if segments.is_empty() {
            return Err(SimError::EmptyCourse);
        }
        for (i, s) in segments.iter().enumerate() {
            s.check(i)?;
        }
        Ok(Self { name: name.into(), segments })
    }

    /// Bygg kumulative distanser/høyder fra segmentbeskrivelser.
    pub fn from_specs(
        name: impl Into<String>,
        start_elevation_m: f64,
        specs: &[SegmentSpec],
    ) -> SimResult<Self> {
        let mut segments = Vec::with_capacity(specs.len());
        let mut dist = 0.0;
        let mut elev = start_elevation_m;
        for (i, sp) in specs.iter().enumerate() {
            if !sp.distance_m.is_finite() || sp.distance_m <= 0.0 {
                return Err(SimError::DegenerateSegment { index: i, distance_m: sp.distance_m });
            }
            segments.push(Segment {
                start_m: dist,
                end_m: dist + sp.distance_m,
                start_elevation_m: elev,
                elevation_change_m: sp.elevation_change_m,
                heading_deg: norm_deg(sp.heading_deg),
            });
            dist += sp.distance_m;
            elev += sp.elevation_change_m;
        }
        Self::new(name, segments)
    }

    /// Segmenter fra GPS-punkter. Etapper kortere enn `min_segment_m` slås
    /// sammen med neste etappe; en kort hale slås inn i forrige segment.
    pub fn from_points(
        name: impl Into<String>,
        points: &[TrackPoint],
        min_segment_m: f64,
    ) -> SimResult<Self> {
        if points.len() < 2 {
            return Err(SimError::EmptyCourse);
        }

        let mut cum = Vec::with_capacity(points.len());
        cum.push(0.0);
        for w in points.windows(2) {
            let last = cum[cum.len() - 1];
            cum.push(last + w[0].distance_to(&w[1]));
        }

        // kuttpunkter (indekser i `points`)
        let mut cuts = vec![0usize];
        for i in 1..points.len() {
            let from = cum[cuts[cuts.len() - 1]];
            if cum[i] - from >= min_segment_m {
                cuts.push(i);
            }
        }
        let last = points.len() - 1;
        if cuts[cuts.len() - 1] != last {
            if cuts.len() > 1 {
                let n = cuts.len();
                cuts[n - 1] = last;
            } else {
                cuts.push(last);
            }
        }

        let segments = cuts
            .windows(2)
            .map(|c| {
                let (a, b) = (&points[c[0]], &points[c[1]]);
                Segment {
                    start_m: cum[c[0]],
                    end_m: cum[c[1]],
                    start_elevation_m: a.elevation_m,
                    elevation_change_m: b.elevation_m - a.elevation_m,
                    heading_deg: a.heading_to(b),
                }
            })
            .collect();

        Self::new(name, segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_distance_m(&self) -> f64 {
        self.segments.iter().map(Segment::distance_m).sum()
    }

    pub fn elevation_gain_m(&self) -> f64 {
        self.segments.iter().map(|s| s.elevation_change_m.max(0.0)).sum()
    }

    pub fn elevation_loss_m(&self) -> f64 {
        self.segments.iter().map(|s| (-s.elevation_change_m).max(0.0)).sum()
    }

    pub fn max_gradient(&self) -> f64 {
        self.segments.iter().map(Segment::gradient).fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_gradient(&self) -> f64 {
        self.segments.iter().map(Segment::gradient).fold(f64::INFINITY, f64::min)
    }

    /// Enkel vanskelighetsscore: km + høydemeter/10.
    pub fn difficulty_score(&self) -> f64 {
        self.total_distance_m() / 1000.0 + self.elevation_gain_m() / 10.0
    }

    pub fn segments_of(&self, terrain: Terrain, threshold: f64) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |s| s.terrain(threshold) == terrain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(d: f64, dh: f64) -> SegmentSpec {
        SegmentSpec { distance_m: d, elevation_change_m: dh, heading_deg: 0.0 }
    }

    #[test]
    fn zero_length_segment_is_rejected_with_index() {
        let err = Course::from_specs("x", 0.0, &[spec(100.0, 1.0), spec(0.0, 0.0)]).unwrap_err();
        assert_eq!(err, SimError::DegenerateSegment { index: 1, distance_m: 0.0 });
        assert!(Segment::new(10.0, 5.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn empty_course_is_rejected() {
        assert_eq!(Course::new("x", vec![]).unwrap_err(), SimError::EmptyCourse);
    }

    #[test]
    fn specs_accumulate_distance_and_elevation() {
        let c = Course::from_specs("c", 100.0, &[spec(1000.0, 50.0), spec(500.0, -20.0)]).unwrap();
        let s = c.segments();
        assert_eq!(s[1].start_m, 1000.0);
        assert_eq!(s[1].start_elevation_m, 150.0);
        assert!((c.total_distance_m() - 1500.0).abs() < 1e-9);
        assert!((c.elevation_gain_m() - 50.0).abs() < 1e-9);
        assert!((c.elevation_loss_m() - 20.0).abs() < 1e-9);
        assert!((c.max_gradient() - 0.05).abs() < 1e-12);
        assert!((c.min_gradient() + 0.04).abs() < 1e-12);
        assert!((c.difficulty_score() - 6.5).abs() < 1e-9);
    }

    #[test]
    fn heading_is_normalised() {
        let s = Segment::new(0.0, 10.0, 0.0, 0.0, -90.0).unwrap();
        assert_eq!(s.heading_deg, 270.0);
    }

    #[test]
    fn heading_north_and_east() {
        let a = TrackPoint::new(59.0, 10.0, 0.0);
        assert!(a.heading_to(&TrackPoint::new(59.001, 10.0, 0.0)).abs() < 1.0);
        assert!((a.heading_to(&TrackPoint::new(59.0, 10.001, 0.0)) - 90.0).abs() < 1.0);
    }

    #[test]
    fn short_legs_are_merged() {
        // ~11 m per 0.0001° breddegrad
        let pts: Vec<TrackPoint> = (0..=10)
            .map(|i| TrackPoint::new(59.0 + i as f64 * 0.00005, 10.0, i as f64 * 0.1))
            .collect();
        let c = Course::from_points("p", &pts, 10.0).unwrap();
        assert!(c.segments().iter().all(|s| s.distance_m() >= 10.0));
        assert!((c.total_distance_m() - pts[0].distance_to(&pts[10])).abs() < 0.01);
        assert!((c.elevation_gain_m() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn identical_points_are_degenerate() {
        let p = TrackPoint::new(59.0, 10.0, 0.0);
        assert!(matches!(
            Course::from_points("p", &[p, p, p], 10.0),
            Err(SimError::DegenerateSegment { .. })
        ));
    }
}
