// src/workflow/gateway.rs
//! Boundary between the coordinator and whatever actually processes the file.

use async_trait::async_trait;
use bevy::log::warn;
use std::path::{Path, PathBuf};

use super::error::WorkflowError;
use super::event_bus::{EventBus, Subscription, UPDATE_STATE_EVENT};
use super::models::{ItemMeta, ProgressEvent};

pub type ProgressHandler = Box<dyn Fn(ProgressEvent) + Send + Sync>;

#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Show the file picker. `None` means the user dismissed it.
    async fn select_file(&self) -> Option<PathBuf>;

    /// Submit `path` for processing. Progress is delivered to subscribers while this runs.
    async fn process_file(&self, path: &Path) -> Result<Vec<ItemMeta>, WorkflowError>;

    /// Listen to the `update-state` stream until the returned handle is released.
    fn subscribe_progress(&self, handler: ProgressHandler) -> Result<Subscription, WorkflowError>;
}

/// Subscribe `handler` to `update-state` on `bus`, decoding each payload into a [`ProgressEvent`].
pub fn subscribe_update_state(bus: &EventBus, handler: ProgressHandler) -> Subscription {
    bus.subscribe(UPDATE_STATE_EVENT, move |payload| {
        match serde_json::from_value::<ProgressEvent>(payload.clone()) {
            Ok(event) => handler(event),
            Err(e) => warn!("Dropping malformed '{}' payload {}: {}", UPDATE_STATE_EVENT, payload, e),
        }
    })
}
