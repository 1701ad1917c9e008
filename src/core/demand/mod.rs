pub mod classification;
pub mod energy_demand;
pub mod factors;
pub mod hot_water;
