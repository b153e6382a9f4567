// src/main.rs

#![cfg_attr(all(not(debug_assertions), target_os = "windows"), windows_subsystem = "windows")]

use bevy::{
    log::LogPlugin,
    prelude::*,
    window::WindowPlugin,
    winit::{UpdateMode, WinitSettings},
};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use bevy_egui::EguiPlugin;
use bevy_tokio_tasks::TokioTasksPlugin;

mod backend;
mod cli;
mod export;
mod paths;
mod settings;
mod ui;
mod workflow;

use backend::ProcessGateway;
use cli::{Cli, Commands};
use settings::AppSettings;
use ui::PanelUiPlugin;
use workflow::coordinator::CoordinatorConfig;
use workflow::events::RequestSelectPath;
use workflow::{StatusStore, WorkflowCoordinator, WorkflowPlugin};

fn log_plugin() -> LogPlugin {
    LogPlugin {
        level: bevy::log::Level::INFO,
        filter: "wgpu=error,naga=warn,bevy_tokio_tasks=warn".to_string(),
        ..default()
    }
}

fn load_settings(cli: &Cli) -> AppSettings {
    let settings = match settings::io::load_settings_from_file::<AppSettings>() {
        Ok(settings) => settings,
        Err(e) => {
            error!("AppSettings: Failed to load settings: {}. Using defaults.", e);
            AppSettings::default()
        }
    };
    cli.apply_overrides(settings)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Commands::Process { path }) = &cli.command {
        // No window; the App only exists to install logging.
        let _logging = {
            let mut app = App::new();
            app.add_plugins(log_plugin());
            app
        };
        let settings = load_settings(&cli);
        return ExitCode::from(cli::run_process(&settings, path.clone()));
    }

    let mut app = App::new();
    app.insert_resource(WinitSettings {
        focused_mode: UpdateMode::Continuous,
        unfocused_mode: UpdateMode::reactive_low_power(Duration::from_secs_f32(1.0 / 5.0)),
    })
    .add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Size Table Generator".into(),
                    ..default()
                }),
                ..default()
            })
            .set(log_plugin()),
    )
    .add_plugins(EguiPlugin {
        enable_multipass_for_primary_context: true,
    })
    .add_plugins(TokioTasksPlugin::default());

    // Logging is up from here on.
    let settings = load_settings(&cli);
    info!(
        "Backend: '{}' {:?}, accepting {:?}",
        settings.backend.program, settings.backend.args, settings.file_extensions
    );
    let store = StatusStore::new();
    let coordinator = WorkflowCoordinator::new(
        Arc::new(ProcessGateway::from_settings(&settings)),
        store.clone(),
        CoordinatorConfig {
            status_reset: settings.status_reset(),
            ..default()
        },
    );

    app.insert_resource(store)
        .insert_resource(coordinator)
        .insert_resource(settings)
        .add_plugins(WorkflowPlugin)
        .add_plugins(PanelUiPlugin);

    if let Some(path) = cli.file {
        info!("Preselecting {:?} from the command line", path);
        app.world_mut().send_event(RequestSelectPath(path));
    }

    app.run();
    ExitCode::SUCCESS
}
