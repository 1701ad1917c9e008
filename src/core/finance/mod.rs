pub mod cash_flow;
pub mod energy_prices;
pub mod feasibility;
pub mod portfolio;
pub mod sensitivity;
