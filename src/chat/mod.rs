pub mod sequencer;

use crate::synthesis::extract::BlockId;
use crate::synthesis::format::{format_response, FormattedResponse};
use crate::synthesis::markdown::{escape_html, format_assistant_message};
use crate::synthesis::Synthesis;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const APOLOGY: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Wire shape of one message in an assistant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef {
    pub id: BlockId,
    pub filename: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: Role,
    pub raw_content: String,
    pub display_content: String,
    /// Section structure for assistant turns; user turns are shown verbatim.
    pub formatted: Option<FormattedResponse>,
    pub attached_block_refs: Vec<BlockRef>,
    pub timestamp: DateTime<Local>,
}

impl ChatTurn {
    pub fn user(prompt: &str) -> Self {
        Self {
            role: Role::User,
            raw_content: prompt.to_string(),
            display_content: escape_html(prompt),
            formatted: None,
            attached_block_refs: Vec::new(),
            timestamp: Local::now(),
        }
    }

    pub fn assistant(synthesis: &Synthesis) -> Self {
        Self {
            role: Role::Assistant,
            raw_content: synthesis.content.clone(),
            display_content: synthesis.formatted.to_html(),
            formatted: Some(synthesis.formatted.clone()),
            attached_block_refs: synthesis
                .formatted
                .generated_files()
                .map(|file| BlockRef {
                    id: file.block_id.clone(),
                    filename: file.filename.clone(),
                    language: file.language.clone(),
                })
                .collect(),
            timestamp: Local::now(),
        }
    }

    /// Assistant-side notice that is not part of the model conversation.
    pub fn notice(text: &str) -> Self {
        let formatted = format_response(text, &[]);
        Self {
            role: Role::Assistant,
            raw_content: text.to_string(),
            display_content: formatted.to_html(),
            formatted: Some(formatted),
            attached_block_refs: Vec::new(),
            timestamp: Local::now(),
        }
    }
}

/// Append-only transcript plus the conversation context sent with each
/// request. Failed exchanges are shown in the transcript but never enter the
/// context.
#[derive(Debug, Default)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
    context: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn record_exchange(&mut self, prompt: &str, reply: &str) {
        self.context.push(ChatMessage::user(prompt));
        self.context.push(ChatMessage::assistant(reply));
    }

    /// Records an assistant reply whose prompt is not kept in the context.
    pub fn record_reply(&mut self, reply: &str) {
        self.context.push(ChatMessage::assistant(reply));
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn context(&self) -> &[ChatMessage] {
        &self.context
    }

    /// Prior context followed by the new user message.
    pub fn request_messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = self.context.clone();
        messages.push(ChatMessage::user(prompt));
        messages
    }

    pub fn transcript_html(&self) -> String {
        let body: String = self
            .turns
            .iter()
            .map(|turn| match turn.role {
                Role::User => format!(
                    "<div class=\"message user-message\">{}</div>\n",
                    escape_html(&turn.raw_content)
                ),
                Role::Assistant => format!(
                    "<div class=\"message assistant-message\">{}</div>\n",
                    format_assistant_message(&turn.raw_content)
                ),
            })
            .collect();
        format!("<!DOCTYPE html>\n<html><body><div class=\"chat-messages\">\n{body}</div></body></html>\n")
    }
}
