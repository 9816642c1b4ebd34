//! Option Position Domain Services

mod leg_builder;

pub use leg_builder::{CondorSpec, VerticalSpec, build_condor, build_vertical};
