pub mod economics;
pub mod measurement;
pub mod performance;
pub mod plan;
pub mod trends;
