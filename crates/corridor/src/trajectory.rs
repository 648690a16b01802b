//! Piecewise Bézier trajectories.
//!
//! Each segment maps its time window `[start_time, end_time]` linearly onto
//! the curve parameter `s ∈ [0, 1]`; the composite concatenates segments
//! back to back, so `end_time` of one equals `start_time` of the next.

use nalgebra::{DMatrix, DVector};

/// One Bézier piece. Control points are the columns of `control_points`.
#[derive(Clone, Debug, PartialEq)]
pub struct BezierSegment {
    pub control_points: DMatrix<f64>,
    pub start_time: f64,
    pub end_time: f64,
}

impl BezierSegment {
    pub fn new(control_points: DMatrix<f64>, start_time: f64, end_time: f64) -> Self {
        debug_assert!(control_points.ncols() >= 1);
        debug_assert!(end_time >= start_time);
        Self {
            control_points,
            start_time,
            end_time,
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.control_points.ncols() - 1
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.control_points.nrows()
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    fn param(&self, t: f64) -> f64 {
        let h = self.duration();
        if h <= 0.0 {
            return 0.0;
        }
        ((t - self.start_time) / h).clamp(0.0, 1.0)
    }

    /// Position at time `t` (clamped to the window), by de Casteljau.
    pub fn value(&self, t: f64) -> DVector<f64> {
        de_casteljau(&self.control_points, self.param(t))
    }

    /// Time derivative at `t`; zero for constant or zero-duration segments.
    pub fn velocity(&self, t: f64) -> DVector<f64> {
        let k = self.order();
        let h = self.duration();
        if k == 0 || h <= 0.0 {
            return DVector::zeros(self.dim());
        }
        let diffs = DMatrix::from_fn(self.dim(), k, |d, i| {
            self.control_points[(d, i + 1)] - self.control_points[(d, i)]
        });
        de_casteljau(&diffs, self.param(t)) * (k as f64 / h)
    }

    /// Arc length of the control polygon; an upper bound on the curve length.
    pub fn control_polygon_length(&self) -> f64 {
        (0..self.order())
            .map(|i| {
                (self.control_points.column(i + 1) - self.control_points.column(i)).norm()
            })
            .sum()
    }
}

fn de_casteljau(cp: &DMatrix<f64>, s: f64) -> DVector<f64> {
    let mut pts = cp.clone();
    for level in (1..cp.ncols()).rev() {
        for i in 0..level {
            let next = pts.column(i) * (1.0 - s) + pts.column(i + 1) * s;
            pts.set_column(i, &next);
        }
    }
    pts.column(0).into_owned()
}

/// Time-parameterized concatenation of segments.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeTrajectory {
    segments: Vec<BezierSegment>,
}

impl CompositeTrajectory {
    /// `segments` must be non-empty, share a dimension and be contiguous in time.
    pub fn new(segments: Vec<BezierSegment>) -> Self {
        debug_assert!(!segments.is_empty());
        debug_assert!(segments
            .windows(2)
            .all(|w| w[0].dim() == w[1].dim() && (w[0].end_time - w[1].start_time).abs() < 1e-12));
        Self { segments }
    }

    #[inline]
    pub fn segments(&self) -> &[BezierSegment] {
        &self.segments
    }

    pub fn dim(&self) -> usize {
        self.segments.first().map_or(0, BezierSegment::dim)
    }

    pub fn start_time(&self) -> f64 {
        self.segments.first().map_or(0.0, |s| s.start_time)
    }

    pub fn end_time(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.end_time)
    }

    /// Segment active at `t`: the first whose window reaches `t`, else the last.
    fn segment_at(&self, t: f64) -> Option<&BezierSegment> {
        self.segments
            .iter()
            .find(|s| t <= s.end_time)
            .or_else(|| self.segments.last())
    }

    pub fn value(&self, t: f64) -> DVector<f64> {
        self.segment_at(t)
            .map_or_else(|| DVector::zeros(0), |s| s.value(t))
    }

    pub fn velocity(&self, t: f64) -> DVector<f64> {
        self.segment_at(t)
            .map_or_else(|| DVector::zeros(0), |s| s.velocity(t))
    }

    /// Positions at `start_time, start_time + dt, …` and always at `end_time`,
    /// one column per sample.
    pub fn sample(&self, dt: f64) -> DMatrix<f64> {
        let (t0, t1) = (self.start_time(), self.end_time());
        let mut times = Vec::new();
        if dt > 0.0 && dt.is_finite() {
            let steps = ((t1 - t0) / dt).floor() as usize;
            times.extend((0..=steps).map(|i| t0 + i as f64 * dt));
        } else {
            times.push(t0);
        }
        if times.last().map_or(true, |&t| t1 - t > 1e-12) {
            times.push(t1);
        }
        let cols: Vec<DVector<f64>> = times.iter().map(|&t| self.value(t)).collect();
        DMatrix::from_columns(&cols)
    }
}
