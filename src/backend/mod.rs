// src/backend/mod.rs

pub mod process_gateway;
pub mod protocol;

pub use process_gateway::ProcessGateway;
