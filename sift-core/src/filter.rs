//! Chat-turn filtering
//!
//! Only the most recent user message is checked. Depending on the config a
//! match either rejects the turn or is masked in place.

use crate::snapshot::{FilterSnapshot, KeywordFilter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sift_ac::Automaton;
use std::borrow::Cow;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Role of the messages that get filtered
pub const USER_ROLE: &str = "user";

/// Part type that carries text in list-style content
pub const TEXT_PART: &str = "text";

/// Errors returned to the caller of the filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("message contains a banned keyword (`{keyword}`)")]
    BannedKeyword { keyword: String },
}

/// What filtering did to the messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Filtering is off or has no keywords
    Disabled,

    /// Nothing matched
    Clean,

    /// Matches were masked; one keyword per rewritten text
    Masked { keywords: Vec<String> },
}

/// A chat message as sent to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,

    /// Fields this filter does not care about, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: MessageContent) -> Self {
        Self {
            role: role.into(),
            content: Some(content),
            extra: Map::new(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(USER_ROLE, MessageContent::Text(text.into()))
    }

    pub fn is_user(&self) -> bool {
        self.role == USER_ROLE
    }
}

/// Message content: plain text or a list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One element of list-style content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part type; a missing type counts as `image_url`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(TEXT_PART.to_string()),
            text: Some(text.into()),
            extra: Map::new(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind.as_deref() == Some(TEXT_PART)
    }
}

struct Masked {
    text: String,
    keyword: String,
}

impl FilterSnapshot {
    /// Check one text against this snapshot
    pub fn filter_text<'t>(&self, text: &'t str) -> Result<Cow<'t, str>, FilterError> {
        let automaton = match self.automaton() {
            Some(automaton) => automaton,
            None => return Ok(Cow::Borrowed(text)),
        };

        Ok(match self.screen(automaton, text)? {
            Some(masked) => Cow::Owned(masked.text),
            None => Cow::Borrowed(text),
        })
    }

    /// Check the most recent user message in `messages`
    ///
    /// On rejection the messages are left untouched.
    pub fn filter_messages(
        &self,
        messages: &mut [ChatMessage],
    ) -> Result<FilterOutcome, FilterError> {
        let automaton = match self.automaton() {
            Some(automaton) => automaton,
            None => return Ok(FilterOutcome::Disabled),
        };

        let message = match messages.iter_mut().rev().find(|m| m.is_user()) {
            Some(message) => message,
            None => return Ok(FilterOutcome::Clean),
        };

        let started = Instant::now();
        let mut keywords = Vec::new();

        match message.content.as_mut() {
            Some(MessageContent::Text(text)) => {
                if let Some(masked) = self.screen(automaton, text)? {
                    *text = masked.text;
                    keywords.push(masked.keyword);
                }
            }
            Some(MessageContent::Parts(parts)) => {
                // Reject before rewriting anything.
                if !self.config().enable_replace {
                    for part in parts.iter().filter(|p| p.is_text()) {
                        if let Some(text) = part.text.as_deref() {
                            self.screen(automaton, text)?;
                        }
                    }
                }
                for part in parts.iter_mut().filter(|p| p.is_text()) {
                    if let Some(text) = part.text.as_mut() {
                        if let Some(masked) = self.screen(automaton, text)? {
                            *text = masked.text;
                            keywords.push(masked.keyword);
                        }
                    }
                }
            }
            None => {}
        }

        debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            "Checked latest user turn for banned keywords"
        );

        if keywords.is_empty() {
            Ok(FilterOutcome::Clean)
        } else {
            Ok(FilterOutcome::Masked { keywords })
        }
    }

    fn screen(&self, automaton: &Automaton, text: &str) -> Result<Option<Masked>, FilterError> {
        let found = match automaton.find_first(text) {
            Some(found) => found,
            None => return Ok(None),
        };

        if !self.config().enable_replace {
            warn!(keyword = %found.keyword, "Rejected message containing banned keyword");
            return Err(FilterError::BannedKeyword {
                keyword: found.keyword,
            });
        }

        info!(keyword = %found.keyword, "Masked banned keyword");
        Ok(Some(Masked {
            text: automaton.replace(text, self.config().mask_char()),
            keyword: found.keyword,
        }))
    }
}

impl KeywordFilter {
    /// Check one text against the current snapshot
    pub fn filter_text<'t>(&self, text: &'t str) -> Result<Cow<'t, str>, FilterError> {
        self.snapshot().filter_text(text)
    }

    /// Check the most recent user message against the current snapshot
    pub fn filter_messages(
        &self,
        messages: &mut [ChatMessage],
    ) -> Result<FilterOutcome, FilterError> {
        self.snapshot().filter_messages(messages)
    }
}
