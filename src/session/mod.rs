//! Per-window session state: workspace, chat history, activity log and the
//! bookkeeping that ties assistant replies back to their requests.

use crate::assistant::{AssistantRequest, RequestKind};
use crate::chat::sequencer::ReplySequencer;
use crate::chat::{ChatHistory, ChatTurn, APOLOGY};
use crate::error::{PackageError, StoreError};
use crate::logging::ActivityLog;
use crate::project::import::ImportReport;
use crate::project::{SaveRequest, SaveResponse};
use crate::synthesis::synthesize;
use crate::workspace::tabs::TabAction;
use crate::workspace::{BufferSwap, UpsertOutcome, Workspace};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug)]
struct Completion {
    kind: RequestKind,
    prompt: String,
    result: Result<String, String>,
}

#[derive(Debug, Default)]
pub struct Session {
    pub workspace: Workspace,
    pub chat: ChatHistory,
    pub log: ActivityLog,
    sequencer: ReplySequencer<Completion>,
    project_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            ..Self::default()
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn requests_in_flight(&self) -> usize {
        self.sequencer.in_flight()
    }

    pub fn is_waiting(&self) -> bool {
        !self.sequencer.is_idle()
    }

    /// Records the user turn and builds the request. Blank prompts are
    /// rejected.
    pub fn begin_prompt(&mut self, prompt: &str) -> Option<AssistantRequest> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.log.info("Ignoring empty prompt");
            return None;
        }

        self.chat.push(ChatTurn::user(prompt));
        let messages = self.chat.request_messages(prompt);
        self.log.info("Sending request to assistant");
        Some(AssistantRequest {
            request_id: self.sequencer.issue(),
            kind: RequestKind::Prompt,
            prompt: prompt.to_string(),
            messages,
        })
    }

    /// Builds the follow-up request that asks the assistant to review an
    /// imported folder. No user turn is shown for it.
    pub fn begin_folder_analysis(&mut self, report: &ImportReport) -> Option<AssistantRequest> {
        if report.files.is_empty() {
            return None;
        }

        let prompt = report.analysis_prompt();
        let messages = self.chat.request_messages(&prompt);
        self.log.info("Analyzing folder content...");
        Some(AssistantRequest {
            request_id: self.sequencer.issue(),
            kind: RequestKind::FolderAnalysis,
            prompt,
            messages,
        })
    }

    /// Hands a finished request to the sequencer and applies every reply it
    /// releases, in request order.
    pub fn complete_request(
        &mut self,
        request_id: u64,
        kind: RequestKind,
        prompt: String,
        result: Result<String, String>,
    ) {
        let released = self.sequencer.complete(
            request_id,
            Completion {
                kind,
                prompt,
                result,
            },
        );
        for completion in released {
            self.apply_completion(completion);
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        let reply = match completion.result {
            Ok(reply) => reply,
            Err(err) => {
                self.chat.push(ChatTurn::notice(APOLOGY));
                match completion.kind {
                    RequestKind::Prompt => self.log.error(format!("Error: {err}")),
                    RequestKind::FolderAnalysis => {
                        self.log.error(format!("Error analyzing folder: {err}"))
                    }
                }
                return;
            }
        };

        self.log.info("Received response from assistant");
        let synthesis = synthesize(&reply);
        match completion.kind {
            RequestKind::Prompt => self.chat.record_exchange(&completion.prompt, &synthesis.content),
            RequestKind::FolderAnalysis => self.chat.record_reply(&synthesis.content),
        }
        self.chat.push(ChatTurn::assistant(&synthesis));

        for (filename, outcome) in self.workspace.apply_blocks(&synthesis.blocks) {
            self.log_upsert(&filename, outcome);
        }
        self.log.info("Finished processing response");
    }

    fn log_upsert(&mut self, filename: &str, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.log.info(format!("Added new file: {filename}")),
            UpsertOutcome::Updated => self.log.info(format!("Updated file: {filename}")),
        }
    }

    /// Adds every imported file to the workspace.
    pub fn import_files(&mut self, root: &Path, report: &ImportReport) {
        for file in &report.files {
            let outcome = self.workspace.upsert(&file.filename, &file.content, None, None);
            self.log_upsert(&file.filename, outcome);
        }
        for skipped in &report.skipped {
            self.log.info(format!("Skipped unreadable or non-text entry: {skipped}"));
        }
        self.log.info(format!(
            "Folder {} imported with {} files",
            root.display(),
            report.files.len()
        ));
    }

    /// Creates an empty file and opens it. Returns false when the name is
    /// blank or already taken.
    pub fn create_file(&mut self, filename: &str) -> bool {
        let filename = filename.trim();
        if filename.is_empty() {
            self.log.error("File name cannot be empty");
            return false;
        }
        if self.workspace.contains(filename) {
            self.log.error(format!("File {filename} already exists"));
            return false;
        }

        self.workspace.add_file(filename, "");
        self.log.info(format!("Added new file: {filename}"));
        true
    }

    pub fn open_file(&mut self, filename: &str) -> Option<BufferSwap> {
        self.apply_tab_action(&TabAction::Activate(filename.to_string()))
    }

    pub fn apply_tab_action(&mut self, action: &TabAction) -> Option<BufferSwap> {
        let swap = action.apply(&mut self.workspace);
        match action {
            TabAction::Activate(filename) if swap.is_some() => {
                self.log.info(format!("Opened file: {filename}"))
            }
            TabAction::Activate(filename) => self.log.error(format!("File {filename} not found")),
            TabAction::Close(filename) => self.log.info(format!("Closed tab: {filename}")),
        }
        swap
    }

    pub fn delete_file(&mut self, filename: &str) -> Option<BufferSwap> {
        match self.workspace.delete_file(filename) {
            Some(swap) => {
                self.log.info(format!("Closed file: {filename}"));
                swap
            }
            None => {
                self.log.error(format!("File {filename} not found"));
                None
            }
        }
    }

    /// Snapshots non-blank files for the project store. The first save mints
    /// a project id; later saves reuse it and are sent as updates.
    pub fn save_request(&mut self) -> Result<SaveRequest, StoreError> {
        self.log.info("Starting deployment process...");

        let mut files = BTreeMap::new();
        for (filename, content) in self.workspace.snapshot() {
            if content.trim().is_empty() {
                self.log
                    .error(format!("Warning: No content found for {filename}"));
                continue;
            }
            files.insert(filename, content);
        }
        if files.is_empty() {
            self.log.error("Error: No valid files with content to save");
            return Err(StoreError::NoFiles);
        }

        let is_update = self.project_id.is_some();
        let project_id = self
            .project_id
            .get_or_insert_with(|| to_base36(Utc::now().timestamp_millis().unsigned_abs()))
            .clone();
        self.log.info(format!("Saving {} files...", files.len()));
        Ok(SaveRequest {
            project_id,
            files,
            is_update,
        })
    }

    pub fn finish_save(&mut self, result: Result<SaveResponse, String>) {
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.log.error(format!("Error: {err}"));
                return;
            }
        };

        for err in &response.errors {
            self.log.error(err.clone());
        }
        if !response.success {
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| "Failed to deploy project".to_string());
            self.log.error(format!("Error: {message}"));
            return;
        }

        // A fresh save may have landed in a newly minted directory; follow it
        // so later updates target the same place.
        if let Some(minted) = response
            .project_dir
            .as_deref()
            .and_then(|dir| dir.strip_prefix("project_"))
        {
            self.project_id = Some(minted.to_string());
        }
        if let Some(url) = &response.url {
            self.log.info(format!("Project saved to: {url}"));
        }
        if let Some(deploy_url) = response.deploy_url() {
            self.log.info(format!("Project available at: {deploy_url}"));
        }
    }

    /// Snapshot for packaging; empty workspaces are rejected.
    pub fn package_snapshot(&mut self) -> Result<BTreeMap<String, String>, PackageError> {
        if self.workspace.is_empty() {
            self.log.error("No files to download");
            return Err(PackageError::NoFiles);
        }
        self.log.info("Preparing files for download...");
        Ok(self.workspace.snapshot())
    }

    pub fn finish_package(&mut self, result: Result<std::path::PathBuf, String>) {
        match result {
            Ok(path) => self.log.info(format!("Download complete: {}", path.display())),
            Err(err) => self.log.error(format!("Error downloading project: {err}")),
        }
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}
