//! Typed parameters for each Bear action.
//!
//! Every struct deserializes from the JSON a protocol adapter receives and
//! rejects unknown members. Optional flags stay `None` unless set so that
//! Bear's own defaults apply. The API token is never part of the encoded
//! request built here; [`BearClient`](super::BearClient) adds it according
//! to the action's token policy.

use crate::domain::action::Action;
use crate::domain::codec::CommandRequest;
use crate::domain::error::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Parameters of one action.
pub trait ActionParams: DeserializeOwned + Send {
    /// Encode-ready request, without the token.
    fn into_request(self, action: Action) -> CommandRequest;

    /// Check that the command names the note it acts on.
    fn check_target(&self, _action: Action) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Whether the command targets the note selected in Bear.
    fn selected(&self) -> bool {
        false
    }

    /// Per-call token overriding the configured one.
    fn token(&self) -> Option<&str> {
        None
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn note_target(
    action: Action,
    id: &Option<String>,
    title: &Option<String>,
    selected: Option<bool>,
) -> Result<(), ValidationError> {
    if present(id) || present(title) || selected == Some(true) {
        Ok(())
    } else {
        Err(ValidationError::MissingTarget {
            action,
            requirement: "one of 'id', 'title' or 'selected' is required",
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// NOTES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenNoteParams {
    pub id: Option<String>,
    pub title: Option<String>,
    pub header: Option<String>,
    pub selected: Option<bool>,
    pub exclude_trashed: Option<bool>,
    pub new_window: Option<bool>,
    pub float: Option<bool>,
    pub show_window: Option<bool>,
    pub open_note: Option<bool>,
    pub pin: Option<bool>,
    pub edit: Option<bool>,
    pub search: Option<String>,
    pub token: Option<String>,
}

impl ActionParams for OpenNoteParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("id", self.id)
            .with_opt("title", self.title)
            .with_opt("header", self.header)
            .with_opt("selected", self.selected)
            .with_opt("exclude_trashed", self.exclude_trashed)
            .with_opt("new_window", self.new_window)
            .with_opt("float", self.float)
            .with_opt("show_window", self.show_window)
            .with_opt("open_note", self.open_note)
            .with_opt("pin", self.pin)
            .with_opt("edit", self.edit)
            .with_opt("search", self.search)
    }

    fn check_target(&self, action: Action) -> Result<(), ValidationError> {
        note_target(action, &self.id, &self.title, self.selected)
    }

    fn selected(&self) -> bool {
        self.selected == Some(true)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateNoteParams {
    pub title: Option<String>,
    pub text: Option<String>,
    pub clipboard: Option<bool>,
    pub tags: Option<Vec<String>>,
    /// Base64-encoded attachment
    pub file: Option<String>,
    pub filename: Option<String>,
    pub open_note: Option<bool>,
    pub new_window: Option<bool>,
    pub float: Option<bool>,
    pub show_window: Option<bool>,
    pub pin: Option<bool>,
    pub edit: Option<bool>,
    pub timestamp: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
}

impl ActionParams for CreateNoteParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("title", self.title)
            .with_opt("text", self.text)
            .with_opt("clipboard", self.clipboard)
            .with_opt("tags", self.tags)
            .with_opt("file", self.file)
            .with_opt("filename", self.filename)
            .with_opt("open_note", self.open_note)
            .with_opt("new_window", self.new_window)
            .with_opt("float", self.float)
            .with_opt("show_window", self.show_window)
            .with_opt("pin", self.pin)
            .with_opt("edit", self.edit)
            .with_opt("timestamp", self.timestamp)
            .with_opt("type", self.kind)
            .with_opt("url", self.url)
    }
}

/// Where `add-text` puts the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMode {
    Append,
    Prepend,
    /// Replace the whole note, title included
    ReplaceAll,
    /// Replace the note body, keeping the title
    Replace,
}

impl TextMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextMode::Append => "append",
            TextMode::Prepend => "prepend",
            TextMode::ReplaceAll => "replace_all",
            TextMode::Replace => "replace",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddTextParams {
    pub id: Option<String>,
    pub title: Option<String>,
    pub selected: Option<bool>,
    pub text: String,
    pub clipboard: Option<bool>,
    pub header: Option<String>,
    pub mode: Option<TextMode>,
    pub new_line: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub exclude_trashed: Option<bool>,
    pub open_note: Option<bool>,
    pub new_window: Option<bool>,
    pub show_window: Option<bool>,
    pub edit: Option<bool>,
    pub timestamp: Option<bool>,
    pub token: Option<String>,
}

impl ActionParams for AddTextParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("id", self.id)
            .with_opt("title", self.title)
            .with_opt("selected", self.selected)
            .with("text", self.text)
            .with_opt("clipboard", self.clipboard)
            .with_opt("header", self.header)
            .with_opt("mode", self.mode.map(|m| m.as_str()))
            .with_opt("new_line", self.new_line)
            .with_opt("tags", self.tags)
            .with_opt("exclude_trashed", self.exclude_trashed)
            .with_opt("open_note", self.open_note)
            .with_opt("new_window", self.new_window)
            .with_opt("show_window", self.show_window)
            .with_opt("edit", self.edit)
            .with_opt("timestamp", self.timestamp)
    }

    fn check_target(&self, action: Action) -> Result<(), ValidationError> {
        note_target(action, &self.id, &self.title, self.selected)
    }

    fn selected(&self) -> bool {
        self.selected == Some(true)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddFileParams {
    pub id: Option<String>,
    pub title: Option<String>,
    pub selected: Option<bool>,
    /// Base64-encoded file content
    pub file: String,
    pub filename: String,
    pub header: Option<String>,
    pub mode: Option<TextMode>,
    pub open_note: Option<bool>,
    pub new_window: Option<bool>,
    pub show_window: Option<bool>,
    pub edit: Option<bool>,
    pub token: Option<String>,
}

impl ActionParams for AddFileParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("id", self.id)
            .with_opt("title", self.title)
            .with_opt("selected", self.selected)
            .with("file", self.file)
            .with("filename", self.filename)
            .with_opt("header", self.header)
            .with_opt("mode", self.mode.map(|m| m.as_str()))
            .with_opt("open_note", self.open_note)
            .with_opt("new_window", self.new_window)
            .with_opt("show_window", self.show_window)
            .with_opt("edit", self.edit)
    }

    fn check_target(&self, action: Action) -> Result<(), ValidationError> {
        note_target(action, &self.id, &self.title, self.selected)
    }

    fn selected(&self) -> bool {
        self.selected == Some(true)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// `trash` and `archive`: a note id or a search the user confirms in Bear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoteTargetParams {
    pub id: Option<String>,
    pub search: Option<String>,
    pub show_window: Option<bool>,
}

impl ActionParams for NoteTargetParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("id", self.id)
            .with_opt("search", self.search)
            .with_opt("show_window", self.show_window)
    }

    fn check_target(&self, action: Action) -> Result<(), ValidationError> {
        if present(&self.id) || present(&self.search) {
            Ok(())
        } else {
            Err(ValidationError::MissingTarget {
                action,
                requirement: "one of 'id' or 'search' is required",
            })
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TAGS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagsParams {
    pub token: Option<String>,
}

impl ActionParams for TagsParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenTagParams {
    /// Tag name; several tags may be comma-separated
    pub name: String,
    pub token: Option<String>,
}

impl ActionParams for OpenTagParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action).with("name", self.name)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenameTagParams {
    pub name: String,
    pub new_name: String,
    pub show_window: Option<bool>,
}

impl ActionParams for RenameTagParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with("name", self.name)
            .with("new_name", self.new_name)
            .with_opt("show_window", self.show_window)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeleteTagParams {
    pub name: String,
    pub show_window: Option<bool>,
}

impl ActionParams for DeleteTagParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with("name", self.name)
            .with_opt("show_window", self.show_window)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// VIEWS & SEARCH
// ═══════════════════════════════════════════════════════════════════════════

/// `untagged`, `todo`, `today`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilteredViewParams {
    pub search: Option<String>,
    pub show_window: Option<bool>,
    pub token: Option<String>,
}

impl ActionParams for FilteredViewParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("search", self.search)
            .with_opt("show_window", self.show_window)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockedParams {
    pub search: Option<String>,
    pub show_window: Option<bool>,
}

impl ActionParams for LockedParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("search", self.search)
            .with_opt("show_window", self.show_window)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchParams {
    pub term: Option<String>,
    pub tag: Option<String>,
    pub show_window: Option<bool>,
    pub token: Option<String>,
}

impl ActionParams for SearchParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with_opt("term", self.term)
            .with_opt("tag", self.tag)
            .with_opt("show_window", self.show_window)
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrabUrlParams {
    pub url: String,
    pub tags: Option<Vec<String>>,
    pub pin: Option<bool>,
    pub wait: Option<bool>,
}

impl ActionParams for GrabUrlParams {
    fn into_request(self, action: Action) -> CommandRequest {
        CommandRequest::new(action)
            .with("url", self.url)
            .with_opt("tags", self.tags)
            .with_opt("pin", self.pin)
            .with_opt("wait", self.wait)
    }
}
