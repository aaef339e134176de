use rand::Rng;

use crate::core::domain::{Configuration, Variant};
use crate::core::error::AnnealError;
use crate::core::sphere;

/// Fixed step used by the closest-pair repulsion move.
pub const CLOSENESS_VARIANCE: f64 = 0.01;

/// Points touched by a proposal, so the engine can commit or revert only
/// those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Single(usize),
    Pair(usize, usize),
}

impl Move {
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let (a, b) = match *self {
            Move::Single(i) => (i, None),
            Move::Pair(i, j) => (i, Some(j)),
        };
        std::iter::once(a).chain(b)
    }
}

/// Move generator used by the annealer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proposal {
    /// Walk one random point; spread `sigma = 0.5 (1 - e^{-T/2})`, the walk
    /// itself uses `sigma^2` as its variance.
    DistanceWalk,
    /// Walk one random point with variance `1 - e^{-T/2}`.
    EnergyWalk,
    /// Push the closest pair apart with a fixed, temperature independent
    /// variance.
    ClosestPairRepulsion { variance: f64 },
}

impl Proposal {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Distance => Proposal::DistanceWalk,
            Variant::Energy => Proposal::EnergyWalk,
            Variant::Closeness => Proposal::ClosestPairRepulsion {
                variance: CLOSENESS_VARIANCE,
            },
        }
    }

    /// Spread parameter at `temperature`. This is the value reported in the
    /// run log.
    pub fn variance(&self, temperature: f64) -> f64 {
        match self {
            Proposal::DistanceWalk => 0.5 * (1.0 - (-0.5 * temperature).exp()),
            Proposal::EnergyWalk => 1.0 - (-0.5 * temperature).exp(),
            Proposal::ClosestPairRepulsion { variance } => *variance,
        }
    }

    /// Writes a proposed move into `candidate`, which must equal `current`
    /// on entry. Draws from `rng` in a fixed order: point index first, then
    /// the walk's normal variates.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        current: &Configuration,
        candidate: &mut Configuration,
        variance: f64,
        rng: &mut R,
    ) -> Result<Move, AnnealError> {
        match self {
            Proposal::DistanceWalk => {
                let index = rng.gen_range(0..current.len());
                let p = sphere::walk(current.point(index), variance * variance, rng)?;
                candidate.set_point(index, p);
                Ok(Move::Single(index))
            }
            Proposal::EnergyWalk => {
                let index = rng.gen_range(0..current.len());
                let p = sphere::walk(current.point(index), variance, rng)?;
                candidate.set_point(index, p);
                Ok(Move::Single(index))
            }
            Proposal::ClosestPairRepulsion { .. } => {
                let (i, j) = sphere::select_closest_pair(current).ok_or_else(|| {
                    AnnealError::InvalidConfiguration("closest pair needs at least 2 points".into())
                })?;
                let (a, b) = sphere::move_apart(current.point(i), current.point(j), variance)?;
                candidate.set_point(i, a);
                candidate.set_point(j, b);
                Ok(Move::Pair(i, j))
            }
        }
    }
}

/// Copies the points touched by `mv` from `src` into `dst`.
pub fn sync_move(dst: &mut Configuration, src: &Configuration, mv: Move) {
    for i in mv.indices() {
        dst.set_point(i, *src.point(i));
    }
}
