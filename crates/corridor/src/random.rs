//! Random box corridors (chains of overlapping axis-aligned boxes).
//!
//! Model
//! - Box 0 has its lower corner at the origin. Each next box shifts its lower
//!   corner by a random fraction of the previous box's extent, at most
//!   `1 - overlap` of it per axis, so consecutive boxes always share a
//!   full-dimensional slab.
//! - Adjacency links consecutive boxes forward (and backward if asked).
//! - Start is the center of the first box, goal the center of the last.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::region::HPolytope;

#[derive(Clone, Copy, Debug)]
pub struct CorridorCfg {
    pub num_regions: usize,
    pub dim: usize,
    /// Per-axis box extent is drawn from `[min_extent, max_extent]`.
    pub min_extent: f64,
    pub max_extent: f64,
    /// Minimum shared fraction of the previous box's extent, in (0, 1].
    pub overlap: f64,
    pub bidirectional: bool,
}

impl Default for CorridorCfg {
    fn default() -> Self {
        Self {
            num_regions: 4,
            dim: 2,
            min_extent: 0.5,
            max_extent: 1.5,
            overlap: 0.2,
            bidirectional: false,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// A drawn corridor, ready for `GcsOpt::new`.
#[derive(Clone, Debug)]
pub struct Corridor {
    pub regions: Vec<HPolytope>,
    pub adjacency: Vec<(usize, usize)>,
    pub start: DVector<f64>,
    pub goal: DVector<f64>,
}

/// Draw a corridor; `None` when `cfg` is degenerate.
pub fn draw_corridor(cfg: CorridorCfg, tok: ReplayToken) -> Option<Corridor> {
    if cfg.num_regions == 0
        || cfg.dim == 0
        || !(cfg.min_extent > 0.0 && cfg.max_extent >= cfg.min_extent)
        || !(cfg.overlap > 0.0 && cfg.overlap <= 1.0)
    {
        return None;
    }
    let mut rng = tok.to_std_rng();
    let mut lo = vec![0.0; cfg.dim];
    let mut boxes: Vec<(Vec<f64>, Vec<f64>)> = Vec::with_capacity(cfg.num_regions);
    for i in 0..cfg.num_regions {
        if i > 0 {
            let (plo, phi) = &boxes[i - 1];
            for d in 0..cfg.dim {
                let w = phi[d] - plo[d];
                lo[d] = plo[d] + rng.gen::<f64>() * (1.0 - cfg.overlap) * w;
            }
        }
        let hi: Vec<f64> = lo
            .iter()
            .map(|l| l + rng.gen_range(cfg.min_extent..=cfg.max_extent))
            .collect();
        boxes.push((lo.clone(), hi));
    }
    let center = |(lo, hi): &(Vec<f64>, Vec<f64>)| {
        DVector::from_iterator(lo.len(), lo.iter().zip(hi).map(|(l, h)| 0.5 * (l + h)))
    };
    let start = center(&boxes[0]);
    let goal = center(&boxes[cfg.num_regions - 1]);
    let regions = boxes
        .iter()
        .map(|(lo, hi)| HPolytope::from_box(lo, hi))
        .collect::<crate::Result<Vec<_>>>()
        .ok()?;
    let mut adjacency: Vec<(usize, usize)> = (1..cfg.num_regions).map(|i| (i - 1, i)).collect();
    if cfg.bidirectional {
        adjacency.extend((1..cfg.num_regions).map(|i| (i, i - 1)));
    }
    Some(Corridor {
        regions,
        adjacency,
        start,
        goal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_is_deterministic() {
        let tok = ReplayToken { seed: 7, index: 3 };
        let a = draw_corridor(CorridorCfg::default(), tok).unwrap();
        let b = draw_corridor(CorridorCfg::default(), tok).unwrap();
        assert_eq!(a.regions, b.regions);
        assert_eq!(a.start, b.start);
        let c = draw_corridor(CorridorCfg::default(), ReplayToken { seed: 7, index: 4 }).unwrap();
        assert_ne!(a.regions, c.regions);
    }

    #[test]
    fn consecutive_boxes_overlap_and_anchor_points_are_inside() {
        let cfg = CorridorCfg {
            num_regions: 6,
            dim: 3,
            bidirectional: true,
            ..CorridorCfg::default()
        };
        for index in 0..20 {
            let c = draw_corridor(cfg, ReplayToken { seed: 1, index }).unwrap();
            assert_eq!(c.regions.len(), 6);
            assert_eq!(c.adjacency.len(), 10);
            assert!(c.regions[0].contains(&c.start));
            assert!(c.regions[5].contains(&c.goal));
            for w in c.regions.windows(2) {
                // box rows: x_d <= hi_d, -x_d <= -lo_d
                for d in 0..3 {
                    let lo = (-w[0].b()[2 * d + 1]).max(-w[1].b()[2 * d + 1]);
                    let hi = w[0].b()[2 * d].min(w[1].b()[2 * d]);
                    assert!(hi - lo > 1e-3, "slab {d} too thin: [{lo}, {hi}]");
                }
            }
        }
    }

    #[test]
    fn degenerate_cfg_yields_none() {
        let tok = ReplayToken { seed: 0, index: 0 };
        let bad = CorridorCfg {
            num_regions: 0,
            ..CorridorCfg::default()
        };
        assert!(draw_corridor(bad, tok).is_none());
        let bad = CorridorCfg {
            overlap: 0.0,
            ..CorridorCfg::default()
        };
        assert!(draw_corridor(bad, tok).is_none());
    }
}
