use crate::assistant::AssistantClient;
use crate::chat::{ChatTurn, Role};
use crate::event::AppEvent;
use crate::logging::ActivityLevel;
use crate::project::import::import_folder;
use crate::project::package::{package_project, Packager, AVAILABILITY_DELAY, DEFAULT_ARCHIVE_NAME};
use crate::project::ProjectStore;
use crate::session::Session;
use crate::synthesis::format::{Inline, Section};
use crate::workspace::tabs::{TabAction, TabStrip};
use crate::workspace::BufferSwap;
use eframe::egui::{self, Color32, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const WAITING_REPAINT: Duration = Duration::from_millis(250);

pub struct CodeweaveApp {
    rx: Receiver<AppEvent>,
    tx: Sender<AppEvent>,
    runtime_handle: Handle,
    assistant: AssistantClient,
    store: Arc<dyn ProjectStore>,
    packager: Arc<dyn Packager>,
    session: Session,
    editor_file: Option<String>,
    editor_buffer: String,
    input_buffer: String,
    new_file_name: String,
    status: String,
    background_tasks: usize,
    scroll_to_bottom: bool,
}

impl CodeweaveApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        tx: Sender<AppEvent>,
        runtime_handle: Handle,
        assistant: AssistantClient,
        store: Arc<dyn ProjectStore>,
        packager: Arc<dyn Packager>,
        startup_notes: Vec<String>,
    ) -> Self {
        let mut session = Session::new();
        for note in startup_notes {
            session.log.error(note);
        }

        Self {
            rx,
            tx,
            runtime_handle,
            assistant,
            store,
            packager,
            session,
            editor_file: None,
            editor_buffer: String::new(),
            input_buffer: String::new(),
            new_file_name: String::new(),
            status: "Ready".to_string(),
            background_tasks: 0,
            scroll_to_bottom: false,
        }
    }

    fn apply_swap(&mut self, swap: Option<BufferSwap>) {
        match swap {
            Some(BufferSwap::Show(filename)) => self.load_editor(Some(filename)),
            Some(BufferSwap::Clear) => self.load_editor(None),
            None => {}
        }
    }

    fn load_editor(&mut self, filename: Option<String>) {
        self.editor_buffer = filename
            .as_deref()
            .and_then(|name| self.session.workspace.get(name))
            .map(|record| record.content.clone())
            .unwrap_or_default();
        self.editor_file = filename;
    }

    /// Reloads the buffer when the current file changed underneath it.
    fn sync_editor(&mut self) {
        let current = self.session.workspace.current_file().map(str::to_string);
        if current != self.editor_file {
            self.load_editor(current);
            return;
        }
        if let Some(record) = self.session.workspace.current_record() {
            if record.content != self.editor_buffer {
                self.editor_buffer = record.content.clone();
            }
        }
    }

    fn submit_prompt(&mut self, ctx: &egui::Context) {
        let prompt = std::mem::take(&mut self.input_buffer);
        if let Some(request) = self.session.begin_prompt(&prompt) {
            self.assistant.send(request);
            self.status = "Sending request to assistant...".to_string();
        }
        self.scroll_to_bottom = true;
        ctx.request_repaint();
    }

    fn pick_and_import_folder(&mut self) {
        let Some(root) = rfd::FileDialog::new().pick_folder() else {
            return;
        };
        self.session.log.info("Uploading folder...");
        self.status = "Processing folder...".to_string();
        self.background_tasks += 1;

        let tx = self.tx.clone();
        self.runtime_handle.spawn_blocking(move || {
            let result = import_folder(&root).map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::FolderImported { root, result });
        });
    }

    fn save_project(&mut self) {
        let Ok(request) = self.session.save_request() else {
            return;
        };
        self.status = "Saving files...".to_string();
        self.background_tasks += 1;

        let tx = self.tx.clone();
        let store = Arc::clone(&self.store);
        self.runtime_handle.spawn_blocking(move || {
            let project_id = request.project_id.clone();
            let result = store.save(&request).map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::SaveFinished { project_id, result });
        });
    }

    fn download_project(&mut self) {
        let Ok(files) = self.session.package_snapshot() else {
            return;
        };
        let Some(destination) = rfd::FileDialog::new()
            .set_file_name(DEFAULT_ARCHIVE_NAME)
            .add_filter("Zip archive", &["zip"])
            .save_file()
        else {
            self.session.log.info("Download cancelled");
            return;
        };
        self.status = "Generating zip file...".to_string();
        self.background_tasks += 1;

        let tx = self.tx.clone();
        let packager = Arc::clone(&self.packager);
        self.runtime_handle.spawn(async move {
            let result = package_project(packager, files, destination, AVAILABILITY_DELAY)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::PackageFinished(result));
        });
    }

    fn export_transcript(&mut self) {
        let Some(destination) = rfd::FileDialog::new()
            .set_file_name("transcript.html")
            .add_filter("HTML", &["html"])
            .save_file()
        else {
            return;
        };
        self.background_tasks += 1;

        let html = self.session.chat.transcript_html();
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = tokio::fs::write(&destination, html)
                .await
                .map(|()| destination.clone())
                .map_err(|err| format!("failed to write {}: {err}", destination.display()));
            let _ = tx.send(AppEvent::TranscriptExported(result));
        });
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.session.log.error("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::AssistantReply {
                request_id,
                kind,
                prompt,
                result,
            } => {
                self.session
                    .complete_request(request_id, kind, prompt, result);
                self.status = if self.session.is_waiting() {
                    "Waiting for assistant...".to_string()
                } else {
                    "Ready".to_string()
                };
                self.scroll_to_bottom = true;
            }
            AppEvent::SaveFinished { project_id, result } => {
                self.finish_background_task();
                tracing::debug!(project_id = %project_id, "save finished");
                self.status = match &result {
                    Ok(response) if response.success => "Project deployed successfully!",
                    _ => "Deployment failed",
                }
                .to_string();
                self.session.finish_save(result);
            }
            AppEvent::PackageFinished(result) => {
                self.finish_background_task();
                let status = if result.is_ok() { "Ready" } else { "Download failed" };
                self.status = status.to_string();
                self.session.finish_package(result);
            }
            AppEvent::FolderImported { root, result } => {
                self.finish_background_task();
                match result {
                    Ok(report) => {
                        self.session.import_files(&root, &report);
                        if let Some(request) = self.session.begin_folder_analysis(&report) {
                            self.assistant.send(request);
                            self.status = "Analyzing folder content...".to_string();
                        } else {
                            self.status = "Ready".to_string();
                        }
                    }
                    Err(err) => {
                        self.session
                            .log
                            .error(format!("Error importing folder: {err}"));
                        self.status = "Error".to_string();
                    }
                }
            }
            AppEvent::TranscriptExported(result) => {
                self.finish_background_task();
                match result {
                    Ok(path) => self
                        .session
                        .log
                        .info(format!("Transcript exported to {}", path.display())),
                    Err(err) => self.session.log.error(format!("Error exporting transcript: {err}")),
                }
            }
        }
    }

    fn finish_background_task(&mut self) {
        self.background_tasks = self.background_tasks.saturating_sub(1);
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Codeweave");
                ui.separator();
                if ui.button("Save project").clicked() {
                    self.save_project();
                }
                if ui.button("Download zip").clicked() {
                    self.download_project();
                }
                if ui.button("Export transcript").clicked() {
                    self.export_transcript();
                }
                ui.separator();
                if let Some(project_id) = self.session.project_id() {
                    ui.label(RichText::new(format!("project {project_id}")).weak());
                }
            });
        });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.session.is_waiting() || self.background_tasks > 0 {
                    ui.spinner();
                }
                ui.label(&self.status);
                ui.separator();
                ui.label(format!("{} files", self.session.workspace.len()));
                ui.separator();
                ui.label(format!("{} messages in context", self.session.chat.context().len()));
                let pending = self.session.requests_in_flight();
                if pending > 0 {
                    ui.separator();
                    ui.label(format!("{pending} requests pending"));
                }
            });

            egui::CollapsingHeader::new("Activity log")
                .default_open(false)
                .show(ui, |ui| {
                    if ui.button("Clear").clicked() {
                        self.session.log.clear();
                        self.session.log.info("Log cleared");
                    }
                    ScrollArea::vertical()
                        .id_salt("activity_log")
                        .max_height(120.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in self.session.log.entries() {
                                let text = RichText::new(entry.to_log_line()).monospace();
                                match entry.level {
                                    ActivityLevel::Info => ui.label(text),
                                    ActivityLevel::Error => ui.label(text.color(Color32::LIGHT_RED)),
                                };
                            }
                        });
                });
        });
    }

    fn render_file_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("file_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Files");
                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.new_file_name)
                            .desired_width(130.0)
                            .hint_text("new-file.js"),
                    );
                    let submitted =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("New").clicked() || submitted {
                        let filename = std::mem::take(&mut self.new_file_name);
                        if self.session.create_file(&filename) {
                            self.sync_editor();
                        }
                    }
                });
                if ui.button("Import folder...").clicked() {
                    self.pick_and_import_folder();
                }
                ui.separator();

                let mut opened: Option<String> = None;
                let mut deleted: Option<String> = None;
                ScrollArea::vertical().id_salt("file_list").show(ui, |ui| {
                    let current = self.session.workspace.current_file();
                    for record in self.session.workspace.files() {
                        ui.horizontal(|ui| {
                            let selected = current == Some(record.filename.as_str());
                            if ui
                                .selectable_label(selected, &record.filename)
                                .on_hover_text(&record.language)
                                .clicked()
                            {
                                opened = Some(record.filename.clone());
                            }
                            if ui.small_button("x").on_hover_text("Delete file").clicked() {
                                deleted = Some(record.filename.clone());
                            }
                        });
                    }
                });

                if let Some(filename) = opened {
                    let swap = self.session.open_file(&filename);
                    self.apply_swap(swap);
                }
                if let Some(filename) = deleted {
                    let swap = self.session.delete_file(&filename);
                    self.apply_swap(swap);
                }
            });
    }

    fn render_assistant_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("assistant_panel")
            .resizable(true)
            .default_width(420.0)
            .show(ctx, |ui| {
                ui.heading("Assistant");
                ui.separator();

                let mut opened: Option<String> = None;
                let transcript_height = (ui.available_height() - 110.0).max(120.0);
                ScrollArea::vertical()
                    .id_salt("chat_transcript")
                    .max_height(transcript_height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for turn in self.session.chat.turns() {
                            render_turn(ui, turn, &mut opened);
                            ui.add_space(6.0);
                        }
                        if self.session.is_waiting() {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label("Waiting for response...");
                            });
                        }
                        if self.scroll_to_bottom {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });
                self.scroll_to_bottom = false;

                if let Some(filename) = opened {
                    let swap = self.session.open_file(&filename);
                    self.apply_swap(swap);
                }

                ui.separator();
                let response = ui.add(
                    egui::TextEdit::multiline(&mut self.input_buffer)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY)
                        .hint_text("Describe what to build..."),
                );
                let submitted = response.has_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter) && i.modifiers.command);
                let clicked = ui
                    .add_enabled(!self.input_buffer.trim().is_empty(), egui::Button::new("Send"))
                    .clicked();
                if clicked || submitted {
                    self.submit_prompt(ctx);
                }
            });
    }

    fn render_editor(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let strip = TabStrip::derive(&self.session.workspace);
            let mut action: Option<TabAction> = None;
            ui.horizontal_wrapped(|ui| {
                for tab in &strip.tabs {
                    if ui.selectable_label(tab.active, &tab.filename).clicked() {
                        action = Some(TabAction::Activate(tab.filename.clone()));
                    }
                    if ui.small_button("x").on_hover_text("Close tab").clicked() {
                        action = Some(TabAction::Close(tab.filename.clone()));
                    }
                    ui.separator();
                }
            });
            if let Some(action) = action {
                let swap = self.session.apply_tab_action(&action);
                self.apply_swap(swap);
            }
            ui.separator();

            let Some(filename) = self.editor_file.clone() else {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No file open").weak());
                });
                return;
            };

            let language = self
                .session
                .workspace
                .get(&filename)
                .map(|record| record.language.clone())
                .unwrap_or_default();
            ui.label(RichText::new(format!("{filename} ({language})")).small());

            ScrollArea::vertical().id_salt("editor").show(ui, |ui| {
                let response = ui.add(
                    egui::TextEdit::multiline(&mut self.editor_buffer)
                        .code_editor()
                        .desired_rows(30)
                        .desired_width(f32::INFINITY),
                );
                if response.changed() {
                    self.session
                        .workspace
                        .edit_content(&filename, &self.editor_buffer);
                }
            });
        });
    }
}

fn render_turn(ui: &mut egui::Ui, turn: &ChatTurn, opened: &mut Option<String>) {
    let timestamp = turn.timestamp.format("%H:%M").to_string();
    match (turn.role, &turn.formatted) {
        (Role::User, _) | (Role::Assistant, None) => {
            let who = if turn.role == Role::User { "You" } else { "Assistant" };
            ui.label(RichText::new(format!("{who} {timestamp}")).strong());
            ui.label(&turn.raw_content);
        }
        (Role::Assistant, Some(formatted)) => {
            ui.label(RichText::new(format!("Assistant {timestamp}")).strong());
            for section in &formatted.sections {
                match section {
                    Section::Prose { body } => render_inlines(ui, body, opened),
                    Section::Step { title, body } => {
                        ui.group(|ui| {
                            ui.label(RichText::new(title).strong());
                            render_inlines(ui, body, opened);
                        });
                    }
                    Section::GeneratedFiles { files } => {
                        ui.group(|ui| {
                            ui.label(RichText::new("Generated Files").strong());
                            for file in files {
                                let label = format!("{} [{}]", file.filename, file.language);
                                if ui.link(label).clicked() {
                                    *opened = Some(file.filename.clone());
                                }
                            }
                        });
                    }
                }
            }
        }
    }
}

fn render_inlines(ui: &mut egui::Ui, inlines: &[Inline], opened: &mut Option<String>) {
    ui.horizontal_wrapped(|ui| {
        for inline in inlines {
            match inline {
                Inline::Text(text) => {
                    ui.label(text.trim_matches('\n'));
                }
                Inline::FileReference(filename) => {
                    if ui.link(RichText::new(filename).monospace()).clicked() {
                        *opened = Some(filename.clone());
                    }
                }
                Inline::DirectoryTree(listing) => {
                    ui.end_row();
                    ui.label(RichText::new(listing).monospace());
                    ui.end_row();
                }
            }
        }
    });
}

impl eframe::App for CodeweaveApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);
        self.sync_editor();
        self.render_top_bar(ctx);
        self.render_status_bar(ctx);
        self.render_file_panel(ctx);
        self.render_assistant_panel(ctx);
        self.render_editor(ctx);

        if self.session.is_waiting() || self.background_tasks > 0 {
            ctx.request_repaint_after(WAITING_REPAINT);
        }
    }
}
