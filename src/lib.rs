//! Spreads N points over the unit sphere by simulated annealing, pushing
//! towards configurations that keep every pair as far apart as possible.

pub mod core {
    pub mod domain;
    pub mod error;
    pub mod sphere;
    pub mod vector;
}

pub mod engine {
    pub mod evaluator;
    pub mod operators;
    pub mod sink;

    pub mod external {
        pub mod run_log;
    }
}

pub mod analysis {
    pub mod packing;
}

pub mod interface {
    pub mod logging;
    pub mod state;
    pub mod ui;
}

pub mod solvers;

pub use crate::core::domain::{AnnealParams, Configuration, InitialLayout, Point, Variant};
pub use crate::core::error::{AnnealError, SinkError};
pub use crate::solvers::sa::{AnnealOutcome, SimulatedAnnealing};
