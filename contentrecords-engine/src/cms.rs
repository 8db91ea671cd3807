//! CMS form actions.
//!
//! Editor forms post `action` (`create`, `update` or `delete`), an optional
//! `record_id` and one input per field, named by bind key. Actions run before
//! the editor view is built so the view reflects their result.

use contentrecords_store::{FieldValues, RecordStore};
use tracing::{info, warn};

use crate::config::parse_record_id;
use crate::context::{HostRequest, RenderContext};
use crate::error::EngineError;
use crate::fields::CmsField;
use crate::upload::save_upload;

/// A form action posted by an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Create,
    Update,
    Delete,
}

impl FormAction {
    /// Parses the `action` input. Unknown actions yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" => Some(FormAction::Create),
            "update" => Some(FormAction::Update),
            "delete" => Some(FormAction::Delete),
            _ => None,
        }
    }
}

/// Store and form settings shared by both editor views.
#[derive(Debug, Clone, Copy)]
pub struct FormTarget<'a> {
    pub store: &'a RecordStore,
    pub record_type: &'a str,
    pub fields: &'a [CmsField],
    pub upload_dir: &'a str,
}

impl FormTarget<'_> {
    /// Reads every field's value from the request, then swaps in stored
    /// uploads for image fields.
    fn submitted_values(
        &self,
        req: &HostRequest,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> FieldValues {
        let mut values: FieldValues = self
            .fields
            .iter()
            .map(|f| (f.key().to_string(), ctx.input(f.key()).to_string()))
            .collect();
        merge_uploads(req, self.fields, self.upload_dir, &mut values, errors);
        values
    }

    fn create(&self, values: &FieldValues, errors: &mut Vec<EngineError>) -> Option<i64> {
        match self.store.create(self.record_type, values) {
            Ok(id) => {
                info!(id, record_type = self.record_type, "record created from form");
                Some(id)
            }
            Err(e) => {
                errors.push(EngineError::store("create")(e));
                None
            }
        }
    }

    fn update(&self, id: i64, values: &FieldValues, errors: &mut Vec<EngineError>) -> bool {
        match self.store.update(id, self.record_type, values) {
            Ok(()) => true,
            Err(e) => {
                errors.push(EngineError::store("update")(e));
                false
            }
        }
    }

    fn delete(&self, id: i64, errors: &mut Vec<EngineError>) -> bool {
        match self.store.delete(id, self.record_type) {
            Ok(()) => true,
            Err(e) => {
                errors.push(EngineError::store("delete")(e));
                false
            }
        }
    }
}

/// Saves files posted for `image` fields and stores their paths as values.
///
/// Only multipart requests with a configured upload directory are
/// considered. A failed save is recorded and leaves the submitted value.
pub fn merge_uploads(
    req: &HostRequest,
    fields: &[CmsField],
    upload_dir: &str,
    values: &mut FieldValues,
    errors: &mut Vec<EngineError>,
) {
    if upload_dir.is_empty() || !req.is_multipart() {
        return;
    }
    for field in fields.iter().filter(|f| f.is_image()) {
        let Some(file) = req.file(field.key()) else {
            continue;
        };
        match save_upload(file, upload_dir) {
            Ok(path) => {
                values.insert(field.key().to_string(), path);
            }
            Err(e) => {
                warn!(field = field.key(), error = %e, "form upload failed");
                errors.push(e);
            }
        }
    }
}

/// Applies a list-editor action. Nothing happens outside POST requests.
pub fn apply_list_action(
    target: &FormTarget<'_>,
    ctx: &RenderContext<'_>,
    errors: &mut Vec<EngineError>,
) {
    let Some(req) = ctx.post() else {
        return;
    };
    let Some(action) = FormAction::parse(ctx.input("action")) else {
        return;
    };
    let values = target.submitted_values(req, ctx, errors);

    if action == FormAction::Create {
        target.create(&values, errors);
        return;
    }
    let Ok(id) = ctx.input("record_id").trim().parse::<i64>() else {
        errors.push(EngineError::InvalidRecordId);
        return;
    };
    match action {
        FormAction::Update => {
            target.update(id, &values, errors);
        }
        FormAction::Delete => {
            target.delete(id, errors);
        }
        FormAction::Create => {}
    }
}

/// Outcome of a single-editor form post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleActionOutcome {
    /// Record to show next; 0 when none is selected.
    pub record_id: i64,
    /// An action was posted and succeeded.
    pub succeeded: bool,
}

/// Applies a single-editor action to `record_id`.
///
/// `update` creates a record when no id is known. `delete` clears the id.
/// A non-zero posted `record_id` overrides the configured one.
pub fn apply_single_action(
    target: &FormTarget<'_>,
    ctx: &RenderContext<'_>,
    record_id: i64,
    errors: &mut Vec<EngineError>,
) -> SingleActionOutcome {
    let mut outcome = SingleActionOutcome {
        record_id,
        succeeded: false,
    };
    let Some(req) = ctx.post() else {
        return outcome;
    };

    let posted_id = parse_record_id(ctx.input("record_id"));
    if posted_id != 0 {
        outcome.record_id = posted_id;
    }
    let Some(action) = FormAction::parse(ctx.input("action")) else {
        return outcome;
    };
    let values = target.submitted_values(req, ctx, errors);

    match action {
        FormAction::Update if outcome.record_id == 0 => {
            if let Some(id) = target.create(&values, errors) {
                outcome = SingleActionOutcome { record_id: id, succeeded: true };
            }
        }
        FormAction::Update => {
            outcome.succeeded = target.update(outcome.record_id, &values, errors);
        }
        FormAction::Delete => {
            if outcome.record_id != 0 {
                outcome.succeeded = target.delete(outcome.record_id, errors);
                outcome.record_id = 0;
            }
        }
        FormAction::Create => {
            if let Some(id) = target.create(&values, errors) {
                outcome = SingleActionOutcome { record_id: id, succeeded: true };
            }
        }
    }
    outcome
}
