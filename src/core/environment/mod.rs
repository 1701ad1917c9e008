pub mod assessor;
pub mod benchmarks;
pub mod emission_factors;
pub mod indicators;
pub mod lifecycle;
pub mod materials;
