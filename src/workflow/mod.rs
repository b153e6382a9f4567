// src/workflow/mod.rs

pub mod coordinator;
pub mod error;
pub mod event_bus;
pub mod events;
pub mod gateway;
pub mod handler;
pub mod models;
pub mod plugin;
pub mod status_store;

pub use coordinator::{CoordinatorConfig, WorkflowCoordinator};
pub use plugin::WorkflowPlugin;
pub use status_store::StatusStore;
