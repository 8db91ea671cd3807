//! Inline-edit protocol.
//!
//! An inline edit is a POST carrying `{cr_inline, record_id, bind, value}` as
//! JSON, urlencoded form or multipart form. It updates exactly one field and
//! answers with a small JSON document. A request meant for a nested instance
//! is declined so the host can offer it to the next instance on the page.

use contentrecords_store::RecordStore;
use contentrecords_tree::{contains_boundary, is_affirmative_str, BindIndex, Node};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{parse_record_id, RecordsConfig};
use crate::context::{HostRequest, RenderContext};
use crate::error::EngineError;
use crate::upload::save_upload;

/// Multipart field checked first for an uploaded replacement value.
pub const UPLOAD_FIELD: &str = "file";

/// A JSON answer to an inline-edit request.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineResponse {
    pub status: u16,
    pub body: Value,
}

impl InlineResponse {
    fn ok(record_id: i64, bind: &str, value: &str) -> Self {
        Self {
            status: 200,
            body: json!({
                "status": "ok",
                "record_id": record_id.to_string(),
                "bind": bind,
                "value": value,
            }),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }
}

/// Result of offering a request to the inline handler.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineOutcome {
    /// Not an inline edit for this instance; render normally.
    Declined,
    Responded(InlineResponse),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct InlinePayload {
    inline: String,
    record_id: String,
    bind: String,
    value: String,
}

/// Everything the handler needs to know about the rendering instance.
#[derive(Debug, Clone, Copy)]
pub struct InlineTarget<'a> {
    pub store: &'a RecordStore,
    pub record_type: &'a str,
    pub binds: &'a BindIndex,
    pub template: &'a Node,
    pub config: &'a RecordsConfig,
}

/// Returns true when this render should look for an inline edit: inline
/// editing is configured and the activation parameter is affirmative.
pub fn inline_active(config: &RecordsConfig, ctx: &RenderContext<'_>) -> bool {
    config.inline && is_affirmative_str(ctx.input(config.inline_param()))
}

/// Handles an inline-edit request, if `ctx` carries one.
pub fn handle_inline_update(
    target: &InlineTarget<'_>,
    ctx: &RenderContext<'_>,
    errors: &mut Vec<EngineError>,
) -> InlineOutcome {
    let Some(req) = ctx.post() else {
        return InlineOutcome::Declined;
    };

    let payload = match parse_payload(req, ctx, target.config) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "inline payload rejected");
            errors.push(e);
            return respond(InlineResponse::error(400, "invalid inline payload"));
        }
    };
    if !is_affirmative_str(&payload.inline) {
        return InlineOutcome::Declined;
    }

    let bind = payload.bind.as_str();
    if bind.is_empty() {
        return respond(InlineResponse::error(400, "bind is required"));
    }
    if !target.binds.contains(bind) {
        // a nested instance may own the bind
        if contains_boundary(target.template) {
            debug!(bind, "unknown bind, deferring to nested instances");
            return InlineOutcome::Declined;
        }
        return respond(InlineResponse::error(400, "unknown bind"));
    }

    let mut record_id = parse_record_id(&payload.record_id);
    if record_id == 0 {
        record_id = parse_record_id(ctx.input(target.config.record_param()));
    }
    if record_id == 0 {
        return respond(InlineResponse::error(400, "record_id is required"));
    }

    let mut value = payload.value;
    if req.is_multipart() {
        match uploaded_value(req, bind, target.config.upload_dir(), errors) {
            Ok(Some(path)) => value = path,
            Ok(None) => {}
            Err(response) => return respond(response),
        }
    }

    if let Err(e) = target
        .store
        .update_field(record_id, target.record_type, bind, &value)
    {
        warn!(record_id, bind, error = %e, "inline update failed");
        errors.push(EngineError::InlineUpdate(e));
        return respond(InlineResponse::error(500, "update failed"));
    }
    info!(record_id, bind, "inline update applied");
    respond(InlineResponse::ok(record_id, bind, &value))
}

fn respond(response: InlineResponse) -> InlineOutcome {
    InlineOutcome::Responded(response)
}

/// Stores the file posted under `file` (else under the bind name).
fn uploaded_value(
    req: &HostRequest,
    bind: &str,
    upload_dir: &str,
    errors: &mut Vec<EngineError>,
) -> Result<Option<String>, InlineResponse> {
    let Some(file) = req.file(UPLOAD_FIELD).or_else(|| req.file(bind)) else {
        return Ok(None);
    };
    if upload_dir.is_empty() {
        return Err(InlineResponse::error(400, "upload_dir is required for file uploads"));
    }
    match save_upload(file, upload_dir) {
        Ok(path) => Ok(Some(path)),
        Err(e) => {
            warn!(error = %e, "inline upload failed");
            errors.push(e);
            Err(InlineResponse::error(400, "upload failed"))
        }
    }
}

fn parse_payload(
    req: &HostRequest,
    ctx: &RenderContext<'_>,
    config: &RecordsConfig,
) -> Result<InlinePayload, EngineError> {
    if req.is_json() {
        let body = req.json_object()?;
        let field = |key: &str| body.get(key).map(value_text).unwrap_or_default();
        return Ok(InlinePayload {
            inline: first_non_empty(&[field("cr_inline"), field("inline")]),
            record_id: first_non_empty(&[field("record_id"), field("id")]),
            bind: first_non_empty(&[field("bind"), field("field")]),
            value: field("value"),
        });
    }

    let input = |key: &str| ctx.input(key).to_string();
    Ok(InlinePayload {
        inline: first_non_empty(&[input("cr_inline"), input("inline")]),
        record_id: first_non_empty(&[input("record_id"), input(config.record_param())]),
        bind: first_non_empty(&[input("bind"), input("field")]),
        value: input("value"),
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn first_non_empty(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}
