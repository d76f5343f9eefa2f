//! Bear x-callback-url actions and their parameter tables.
//!
//! Each action knows the parameters Bear accepts for it and how each one is
//! encoded. The table drives the codec: anything not listed here is rejected
//! before a command leaves the process.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a parameter is validated and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Optional free text, omitted when empty
    Text,
    /// Text that must be present and non-empty after trimming
    RequiredText,
    /// Boolean, encoded as `yes` / `no`
    Flag,
    /// List of strings, encoded comma-joined
    List,
}

/// One parameter accepted by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

const fn required(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::RequiredText,
    }
}

const fn flag(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Flag,
    }
}

const fn list(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::List,
    }
}

/// When the Bear API token has to travel with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Action never needs the token
    Never,
    /// Bear only returns note data when a token is present; inject it if known
    WhenAvailable,
    /// Token is mandatory when the action targets the selected note
    WhenSelected,
}

/// Bear x-callback-url action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    OpenNote,
    Create,
    AddText,
    AddFile,
    Tags,
    OpenTag,
    RenameTag,
    DeleteTag,
    Trash,
    Archive,
    Untagged,
    Todo,
    Today,
    Locked,
    Search,
    GrabUrl,
}

const OPEN_NOTE_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("title"),
    text("header"),
    flag("exclude_trashed"),
    flag("new_window"),
    flag("float"),
    flag("show_window"),
    flag("open_note"),
    flag("selected"),
    flag("pin"),
    flag("edit"),
    text("search"),
    text("token"),
];

const CREATE_FIELDS: &[FieldSpec] = &[
    text("title"),
    text("text"),
    flag("clipboard"),
    list("tags"),
    text("file"),
    text("filename"),
    flag("open_note"),
    flag("new_window"),
    flag("float"),
    flag("show_window"),
    flag("pin"),
    flag("edit"),
    flag("timestamp"),
    text("type"),
    text("url"),
];

const ADD_TEXT_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("title"),
    flag("selected"),
    required("text"),
    flag("clipboard"),
    text("header"),
    text("mode"),
    flag("new_line"),
    list("tags"),
    flag("exclude_trashed"),
    flag("open_note"),
    flag("new_window"),
    flag("show_window"),
    flag("edit"),
    flag("timestamp"),
    text("token"),
];

const ADD_FILE_FIELDS: &[FieldSpec] = &[
    text("id"),
    text("title"),
    flag("selected"),
    required("file"),
    text("header"),
    required("filename"),
    text("mode"),
    flag("open_note"),
    flag("new_window"),
    flag("show_window"),
    flag("edit"),
    text("token"),
];

const TAGS_FIELDS: &[FieldSpec] = &[text("token")];

const OPEN_TAG_FIELDS: &[FieldSpec] = &[required("name"), text("token")];

const RENAME_TAG_FIELDS: &[FieldSpec] =
    &[required("name"), required("new_name"), flag("show_window")];

const DELETE_TAG_FIELDS: &[FieldSpec] = &[required("name"), flag("show_window")];

const NOTE_MOVE_FIELDS: &[FieldSpec] = &[text("id"), text("search"), flag("show_window")];

const FILTERED_VIEW_FIELDS: &[FieldSpec] = &[text("search"), flag("show_window"), text("token")];

const LOCKED_FIELDS: &[FieldSpec] = &[text("search"), flag("show_window")];

const SEARCH_FIELDS: &[FieldSpec] = &[
    text("term"),
    text("tag"),
    flag("show_window"),
    text("token"),
];

const GRAB_URL_FIELDS: &[FieldSpec] = &[required("url"), list("tags"), flag("pin"), flag("wait")];

impl Action {
    /// Every supported action
    pub const ALL: [Action; 16] = [
        Action::OpenNote,
        Action::Create,
        Action::AddText,
        Action::AddFile,
        Action::Tags,
        Action::OpenTag,
        Action::RenameTag,
        Action::DeleteTag,
        Action::Trash,
        Action::Archive,
        Action::Untagged,
        Action::Todo,
        Action::Today,
        Action::Locked,
        Action::Search,
        Action::GrabUrl,
    ];

    /// Path segment of the action in the x-callback-url
    pub fn name(&self) -> &'static str {
        match self {
            Action::OpenNote => "open-note",
            Action::Create => "create",
            Action::AddText => "add-text",
            Action::AddFile => "add-file",
            Action::Tags => "tags",
            Action::OpenTag => "open-tag",
            Action::RenameTag => "rename-tag",
            Action::DeleteTag => "delete-tag",
            Action::Trash => "trash",
            Action::Archive => "archive",
            Action::Untagged => "untagged",
            Action::Todo => "todo",
            Action::Today => "today",
            Action::Locked => "locked",
            Action::Search => "search",
            Action::GrabUrl => "grab-url",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Parameters Bear accepts for this action
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Action::OpenNote => OPEN_NOTE_FIELDS,
            Action::Create => CREATE_FIELDS,
            Action::AddText => ADD_TEXT_FIELDS,
            Action::AddFile => ADD_FILE_FIELDS,
            Action::Tags => TAGS_FIELDS,
            Action::OpenTag => OPEN_TAG_FIELDS,
            Action::RenameTag => RENAME_TAG_FIELDS,
            Action::DeleteTag => DELETE_TAG_FIELDS,
            Action::Trash | Action::Archive => NOTE_MOVE_FIELDS,
            Action::Untagged | Action::Todo | Action::Today => FILTERED_VIEW_FIELDS,
            Action::Locked => LOCKED_FIELDS,
            Action::Search => SEARCH_FIELDS,
            Action::GrabUrl => GRAB_URL_FIELDS,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn token_policy(&self) -> TokenPolicy {
        match self {
            Action::OpenNote | Action::AddText | Action::AddFile => TokenPolicy::WhenSelected,
            Action::Tags
            | Action::OpenTag
            | Action::Untagged
            | Action::Todo
            | Action::Today
            | Action::Search => TokenPolicy::WhenAvailable,
            Action::Create
            | Action::RenameTag
            | Action::DeleteTag
            | Action::Trash
            | Action::Archive
            | Action::Locked
            | Action::GrabUrl => TokenPolicy::Never,
        }
    }

    /// Short human description, used by `bear-bridge list`
    pub fn description(&self) -> &'static str {
        match self {
            Action::OpenNote => "Open a note by id or title and return its content",
            Action::Create => "Create a new note",
            Action::AddText => "Append, prepend or replace text in a note",
            Action::AddFile => "Attach a base64-encoded file to a note",
            Action::Tags => "List all tags",
            Action::OpenTag => "List the notes carrying a tag",
            Action::RenameTag => "Rename a tag",
            Action::DeleteTag => "Delete a tag",
            Action::Trash => "Move a note to the trash",
            Action::Archive => "Move a note to the archive",
            Action::Untagged => "List notes without tags",
            Action::Todo => "List notes with open todos",
            Action::Today => "List notes created or modified today",
            Action::Locked => "Show locked notes",
            Action::Search => "Search notes by term and/or tag",
            Action::GrabUrl => "Create a note from the content of a web page",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.name()), Some(action));
        }
        assert_eq!(Action::from_name("change-theme"), None);
    }

    #[test]
    fn test_field_lookup() {
        let url = Action::GrabUrl.field("url").unwrap();
        assert_eq!(url.kind, FieldKind::RequiredText);
        assert_eq!(Action::Create.field("tags").unwrap().kind, FieldKind::List);
        assert!(Action::Create.field("token").is_none());
    }

    #[test]
    fn test_token_capable_actions_accept_token_field() {
        for action in Action::ALL {
            if action.token_policy() != TokenPolicy::Never {
                assert!(
                    action.field("token").is_some(),
                    "{} should accept a token",
                    action
                );
            }
        }
    }

    #[test]
    fn test_serde_uses_path_names() {
        let json = serde_json::to_string(&Action::GrabUrl).unwrap();
        assert_eq!(json, "\"grab-url\"");
        let parsed: Action = serde_json::from_str("\"open-note\"").unwrap();
        assert_eq!(parsed, Action::OpenNote);
    }
}
