// src/workflow/plugin.rs

use bevy::prelude::*;

use super::events::*;
use super::handler::{
    handle_export_request_system, handle_preview_item_request_system,
    handle_process_file_request_system, handle_select_file_request_system,
    handle_select_path_request_system, handle_workflow_settled_system, WorkflowTasks,
};

/// Registers workflow events and the systems that hand them to the coordinator.
/// Expects `WorkflowCoordinator`, `StatusStore` and the Tokio runtime to be present.
pub struct WorkflowPlugin;

impl Plugin for WorkflowPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorkflowTasks>();

        app.add_event::<RequestSelectFile>()
            .add_event::<RequestSelectPath>()
            .add_event::<RequestProcessFile>()
            .add_event::<RequestPreviewItem>()
            .add_event::<RequestExportResults>()
            .add_event::<WorkflowSettled>();

        app.add_systems(
            Update,
            (
                handle_workflow_settled_system,
                handle_select_path_request_system,
                handle_select_file_request_system,
                handle_process_file_request_system,
                handle_preview_item_request_system,
                handle_export_request_system,
            )
                .chain(),
        );

        info!("WorkflowPlugin initialized.");
    }
}
