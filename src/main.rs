mod app;
mod assistant;
mod chat;
mod config;
mod error;
mod event;
mod language;
mod logging;
mod project;
mod session;
mod synthesis;
mod workspace;

use app::CodeweaveApp;
use assistant::http::ChatCompletionsBackend;
use assistant::{AssistantBackend, AssistantClient, UnavailableBackend};
use config::AppConfig;
use eframe::egui;
use project::package::ZipPackager;
use project::store::LocalProjectStore;
use std::sync::{mpsc, Arc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut startup_notes = Vec::new();
    let config = AppConfig::load().unwrap_or_else(|err| {
        startup_notes.push(format!("Using default configuration: {err}"));
        AppConfig::default()
    });
    logging::init_tracing(&config.log_filter)?;
    tracing::info!(model = %config.model, projects = %config.projects_dir.display(), "starting codeweave");

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("codeweave-runtime")
        .build()?;

    let backend: Arc<dyn AssistantBackend> = match ChatCompletionsBackend::from_config(&config) {
        Ok(backend) => Arc::new(backend),
        Err(err) => {
            startup_notes.push(format!("Assistant unavailable: {err}"));
            Arc::new(UnavailableBackend::new(err.to_string()))
        }
    };
    let assistant = AssistantClient::new(backend, tx.clone(), runtime.handle().clone());

    let app = CodeweaveApp::new(
        rx,
        tx,
        runtime.handle().clone(),
        assistant,
        Arc::new(LocalProjectStore::new(config.projects_dir.clone())),
        Arc::new(ZipPackager),
        startup_notes,
    );
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 900.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Codeweave",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
