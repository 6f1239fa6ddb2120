use crate::assistant::RequestKind;
use crate::project::import::ImportReport;
use crate::project::SaveResponse;
use std::path::PathBuf;

/// Results of background work, drained by the UI thread each frame.
#[derive(Debug, Clone)]
pub enum AppEvent {
    AssistantReply {
        request_id: u64,
        kind: RequestKind,
        prompt: String,
        result: Result<String, String>,
    },
    SaveFinished {
        project_id: String,
        result: Result<SaveResponse, String>,
    },
    PackageFinished(Result<PathBuf, String>),
    FolderImported {
        root: PathBuf,
        result: Result<ImportReport, String>,
    },
    TranscriptExported(Result<PathBuf, String>),
}
