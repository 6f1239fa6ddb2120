//! Project-level services: saving to a project directory, zip packaging and
//! folder import. Each works on a snapshot of the workspace, never on the
//! live model.

pub mod import;
pub mod package;
pub mod store;

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(rename = "projectDir")]
    pub project_id: String,
    pub files: BTreeMap<String, String>,
    pub is_update: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Directory name actually used, which differs from the request when a
    /// fresh project collided with an existing one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<String>,
    #[serde(default)]
    pub saved_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveResponse {
    /// URL of the entry page when the project has one.
    pub fn deploy_url(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        let index = self
            .saved_files
            .iter()
            .find(|name| matches!(name.as_str(), "index.html" | "index.php"));
        Some(match index {
            Some(index) => format!("{url}/{index}"),
            None => url.to_string(),
        })
    }
}

pub trait ProjectStore: Send + Sync {
    fn save(&self, request: &SaveRequest) -> Result<SaveResponse, StoreError>;
}
