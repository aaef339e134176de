use crate::core::domain::{Configuration, Variant};
use crate::core::sphere;

/// Which way an objective is optimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// True when `candidate` is strictly better than `incumbent`.
    pub fn improves(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    /// Signed change from `incumbent` to `candidate`, positive when the
    /// candidate is better.
    pub fn gain(&self, candidate: f64, incumbent: f64) -> f64 {
        match self {
            Direction::Maximize => candidate - incumbent,
            Direction::Minimize => incumbent - candidate,
        }
    }
}

/// Global packing-quality measure evaluated on a whole configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Sum of pairwise chord distances, higher is better.
    SumDistance,
    /// Logarithmic Riesz energy, lower is better.
    RieszEnergy,
}

impl Objective {
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Distance | Variant::Closeness => Objective::SumDistance,
            Variant::Energy => Objective::RieszEnergy,
        }
    }

    /// Full O(n^2) evaluation; nothing is cached between calls.
    pub fn evaluate(&self, config: &Configuration) -> f64 {
        match self {
            Objective::SumDistance => sphere::pairwise_sum_distance(config),
            Objective::RieszEnergy => sphere::riesz_energy(config),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Objective::SumDistance => Direction::Maximize,
            Objective::RieszEnergy => Direction::Minimize,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Objective::SumDistance => "pairwise sum distance",
            Objective::RieszEnergy => "Riesz energy",
        }
    }
}
