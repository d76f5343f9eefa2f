//! Command façade - one typed method per Bear action.
//!
//! Each method validates its parameters, resolves the API token against
//! the action's [`TokenPolicy`] and hands the request to the
//! [`CommandCorrelator`]. Nothing reaches the network before all checks
//! pass.

pub mod params;

pub use params::{
    ActionParams, AddFileParams, AddTextParams, CreateNoteParams, DeleteTagParams,
    FilteredViewParams, GrabUrlParams, LockedParams, NoteTargetParams, OpenNoteParams,
    OpenTagParams, RenameTagParams, SearchParams, TagsParams, TextMode,
};

use crate::domain::action::{Action, TokenPolicy};
use crate::domain::config::{BridgeConfig, ConfigError};
use crate::domain::error::{BridgeResult, ValidationError};
use crate::domain::payload::CallbackPayload;
use crate::ports::outbound::ExternalInvoker;
use crate::service::CommandCorrelator;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Operation exposed by the façade, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub action: Action,
}

const fn op(name: &'static str, action: Action) -> Operation {
    Operation { name, action }
}

/// Every façade operation, in listing order
pub const OPERATIONS: &[Operation] = &[
    op("open_note", Action::OpenNote),
    op("create_note", Action::Create),
    op("add_text", Action::AddText),
    op("append_text", Action::AddText),
    op("prepend_text", Action::AddText),
    op("replace_text", Action::AddText),
    op("add_file", Action::AddFile),
    op("tags", Action::Tags),
    op("open_tag", Action::OpenTag),
    op("rename_tag", Action::RenameTag),
    op("delete_tag", Action::DeleteTag),
    op("trash_note", Action::Trash),
    op("archive_note", Action::Archive),
    op("untagged", Action::Untagged),
    op("todo", Action::Todo),
    op("today", Action::Today),
    op("locked", Action::Locked),
    op("search", Action::Search),
    op("grab_url", Action::GrabUrl),
];

pub fn find_operation(name: &str) -> Option<Operation> {
    OPERATIONS.iter().copied().find(|op| op.name == name)
}

/// Typed client for Bear.
pub struct BearClient {
    correlator: CommandCorrelator,
    token: Option<String>,
}

impl BearClient {
    pub fn new(config: BridgeConfig, invoker: Arc<dyn ExternalInvoker>) -> Result<Self, ConfigError> {
        let token = config
            .auth
            .token
            .clone()
            .filter(|t| !t.trim().is_empty());
        Ok(Self {
            correlator: CommandCorrelator::new(config, invoker)?,
            token,
        })
    }

    pub fn correlator(&self) -> &CommandCorrelator {
        &self.correlator
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn resolve_token(
        &self,
        action: Action,
        per_call: Option<&str>,
        selected: bool,
    ) -> Result<Option<String>, ValidationError> {
        let per_call = per_call
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);

        match action.token_policy() {
            TokenPolicy::Never => Ok(None),
            TokenPolicy::WhenAvailable => Ok(per_call.or_else(|| self.token.clone())),
            TokenPolicy::WhenSelected if selected => per_call
                .or_else(|| self.token.clone())
                .map(Some)
                .ok_or(ValidationError::MissingToken { action }),
            TokenPolicy::WhenSelected => Ok(per_call),
        }
    }

    /// Validate, attach the token and run one exchange.
    pub async fn run<P: ActionParams>(
        &self,
        action: Action,
        params: P,
    ) -> BridgeResult<CallbackPayload> {
        self.run_with_cancel(action, params, std::future::pending::<()>())
            .await
    }

    /// [`run`](Self::run) with a caller-supplied cancellation future.
    pub async fn run_with_cancel<P, F>(
        &self,
        action: Action,
        params: P,
        cancel: F,
    ) -> BridgeResult<CallbackPayload>
    where
        P: ActionParams,
        F: Future<Output = ()>,
    {
        params.check_target(action)?;
        let token = self.resolve_token(action, params.token(), params.selected())?;
        let request = params.into_request(action).with_opt("token", token);
        self.correlator.execute_with_cancel(request, cancel).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // NOTES
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a note and return its content (`note`, `identifier`, `title`, ...)
    #[instrument(skip_all)]
    pub async fn open_note(&self, params: OpenNoteParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::OpenNote, params).await
    }

    /// Create a note; Bear answers with its `identifier` and `title`
    #[instrument(skip_all)]
    pub async fn create_note(&self, params: CreateNoteParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Create, params).await
    }

    #[instrument(skip_all)]
    pub async fn add_text(&self, params: AddTextParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::AddText, params).await
    }

    #[instrument(skip_all)]
    pub async fn append_text(&self, params: AddTextParams) -> BridgeResult<CallbackPayload> {
        self.add_text_with_mode(params, TextMode::Append).await
    }

    #[instrument(skip_all)]
    pub async fn prepend_text(&self, params: AddTextParams) -> BridgeResult<CallbackPayload> {
        self.add_text_with_mode(params, TextMode::Prepend).await
    }

    /// Replace the note body, keeping its title
    #[instrument(skip_all)]
    pub async fn replace_text(&self, params: AddTextParams) -> BridgeResult<CallbackPayload> {
        self.add_text_with_mode(params, TextMode::Replace).await
    }

    async fn add_text_with_mode(
        &self,
        params: AddTextParams,
        mode: TextMode,
    ) -> BridgeResult<CallbackPayload> {
        self.add_text(AddTextParams {
            mode: Some(mode),
            ..params
        })
        .await
    }

    #[instrument(skip_all)]
    pub async fn add_file(&self, params: AddFileParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::AddFile, params).await
    }

    #[instrument(skip_all)]
    pub async fn trash_note(&self, params: NoteTargetParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Trash, params).await
    }

    #[instrument(skip_all)]
    pub async fn archive_note(&self, params: NoteTargetParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Archive, params).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // TAGS
    // ═══════════════════════════════════════════════════════════════════════

    /// All tags, as a JSON array under `tags`
    #[instrument(skip_all)]
    pub async fn tags(&self, params: TagsParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Tags, params).await
    }

    #[instrument(skip_all)]
    pub async fn open_tag(&self, params: OpenTagParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::OpenTag, params).await
    }

    #[instrument(skip_all)]
    pub async fn rename_tag(&self, params: RenameTagParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::RenameTag, params).await
    }

    #[instrument(skip_all)]
    pub async fn delete_tag(&self, params: DeleteTagParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::DeleteTag, params).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // VIEWS & SEARCH
    // ═══════════════════════════════════════════════════════════════════════

    #[instrument(skip_all)]
    pub async fn untagged(&self, params: FilteredViewParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Untagged, params).await
    }

    #[instrument(skip_all)]
    pub async fn todo(&self, params: FilteredViewParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Todo, params).await
    }

    #[instrument(skip_all)]
    pub async fn today(&self, params: FilteredViewParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Today, params).await
    }

    #[instrument(skip_all)]
    pub async fn locked(&self, params: LockedParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Locked, params).await
    }

    /// Notes matching `term` and/or `tag`, as a JSON array under `notes`
    #[instrument(skip_all)]
    pub async fn search(&self, params: SearchParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::Search, params).await
    }

    #[instrument(skip_all)]
    pub async fn grab_url(&self, params: GrabUrlParams) -> BridgeResult<CallbackPayload> {
        self.run(Action::GrabUrl, params).await
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DISPATCH BY NAME
    // ═══════════════════════════════════════════════════════════════════════

    /// Run an operation from [`OPERATIONS`] with JSON parameters.
    pub async fn dispatch(&self, operation: &str, params: Value) -> BridgeResult<CallbackPayload> {
        self.dispatch_with_cancel(operation, params, std::future::pending::<()>())
            .await
    }

    /// [`dispatch`](Self::dispatch) with a caller-supplied cancellation future.
    #[instrument(skip(self, params, cancel))]
    pub async fn dispatch_with_cancel<F>(
        &self,
        operation: &str,
        params: Value,
        cancel: F,
    ) -> BridgeResult<CallbackPayload>
    where
        F: Future<Output = ()>,
    {
        let op = find_operation(operation)
            .ok_or_else(|| ValidationError::UnknownAction(operation.to_string()))?;
        let action = op.action;
        debug!(operation = op.name, action = %action, "Dispatching operation");

        match op.name {
            "open_note" => {
                self.run_with_cancel(action, parse::<OpenNoteParams>(action, params)?, cancel)
                    .await
            }
            "create_note" => {
                self.run_with_cancel(action, parse::<CreateNoteParams>(action, params)?, cancel)
                    .await
            }
            "add_text" => {
                self.run_with_cancel(action, parse::<AddTextParams>(action, params)?, cancel)
                    .await
            }
            "append_text" | "prepend_text" | "replace_text" => {
                let mode = match op.name {
                    "append_text" => TextMode::Append,
                    "prepend_text" => TextMode::Prepend,
                    _ => TextMode::Replace,
                };
                let params = AddTextParams {
                    mode: Some(mode),
                    ..parse::<AddTextParams>(action, params)?
                };
                self.run_with_cancel(action, params, cancel).await
            }
            "add_file" => {
                self.run_with_cancel(action, parse::<AddFileParams>(action, params)?, cancel)
                    .await
            }
            "tags" => {
                self.run_with_cancel(action, parse::<TagsParams>(action, params)?, cancel)
                    .await
            }
            "open_tag" => {
                self.run_with_cancel(action, parse::<OpenTagParams>(action, params)?, cancel)
                    .await
            }
            "rename_tag" => {
                self.run_with_cancel(action, parse::<RenameTagParams>(action, params)?, cancel)
                    .await
            }
            "delete_tag" => {
                self.run_with_cancel(action, parse::<DeleteTagParams>(action, params)?, cancel)
                    .await
            }
            "trash_note" | "archive_note" => {
                self.run_with_cancel(action, parse::<NoteTargetParams>(action, params)?, cancel)
                    .await
            }
            "untagged" | "todo" | "today" => {
                self.run_with_cancel(action, parse::<FilteredViewParams>(action, params)?, cancel)
                    .await
            }
            "locked" => {
                self.run_with_cancel(action, parse::<LockedParams>(action, params)?, cancel)
                    .await
            }
            "search" => {
                self.run_with_cancel(action, parse::<SearchParams>(action, params)?, cancel)
                    .await
            }
            "grab_url" => {
                self.run_with_cancel(action, parse::<GrabUrlParams>(action, params)?, cancel)
                    .await
            }
            _ => Err(ValidationError::UnknownAction(operation.to_string()).into()),
        }
    }
}

fn parse<P: ActionParams>(action: Action, params: Value) -> Result<P, ValidationError> {
    let params = match params {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => params,
        _ => return Err(ValidationError::NotAnObject),
    };
    serde_json::from_value(params).map_err(|e| ValidationError::Malformed {
        action,
        reason: e.to_string(),
    })
}
