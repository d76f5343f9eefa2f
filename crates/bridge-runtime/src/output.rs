//! JSON rendering of results.

use bear_xcallback::{BridgeResult, CallbackPayload, OPERATIONS};
use serde_json::{json, Value};

/// Rendered outcome of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub body: Value,
    pub success: bool,
}

/// Success: the payload itself. Failure: `{kind, code, message, data?}`.
pub fn render(result: &BridgeResult<CallbackPayload>) -> Rendered {
    match result {
        Ok(payload) => Rendered {
            body: Value::from(payload.clone()),
            success: true,
        },
        Err(e) => Rendered {
            body: e.to_json(),
            success: false,
        },
    }
}

/// `[{name, action, description}]` for every operation.
pub fn operations_listing() -> Value {
    OPERATIONS
        .iter()
        .map(|op| {
            json!({
                "name": op.name,
                "action": op.action.name(),
                "description": op.action.description(),
            })
        })
        .collect()
}
