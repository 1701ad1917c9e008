pub mod building_element;
pub mod construction;
pub mod diagnostics;
pub mod gains;
pub mod thermal_balance;
pub mod thermal_bridge;
pub mod ventilation;
