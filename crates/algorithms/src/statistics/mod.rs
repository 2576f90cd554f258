//! Statistical reductions

mod zonal;

pub use zonal::{reduce_region, reduce_regions, ReduceParams, RegionStat};
