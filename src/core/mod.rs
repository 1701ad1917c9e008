pub mod building;
pub mod demand;
pub mod energy_source;
pub mod envelope;
pub mod environment;
pub mod finance;
pub mod material_properties;
pub mod monitoring;
pub(crate) mod solvers;
pub mod units;
