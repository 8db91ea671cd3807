//! Content records rendering engine.
//!
//! Binds a template tree to stored records and renders it in one of four
//! modes:
//! - list + render: every selected record materialized from the template
//! - single + render: one record, optionally with inline-editor wrappers
//! - list + edit: a CMS table of records with create/update/delete actions
//! - single + edit: a CMS form for one record
//!
//! The host owns a [`ContentRecords`] (and with it the store registry) for
//! its whole lifetime and calls [`ContentRecords::render`] once per component
//! instance with a [`RenderContext`] describing the current request.

mod cms;
mod config;
mod context;
mod error;
mod fields;
mod inline;
mod materialize;
mod mode;
mod render;
mod upload;
mod views;

pub use cms::{
    apply_list_action, apply_single_action, merge_uploads, FormAction, FormTarget,
    SingleActionOutcome,
};
pub use config::{
    parse_id_value, parse_record_id, record_type_name, ComponentInstance, FieldDef, RecordsConfig,
};
pub use context::{HostRequest, RenderContext, UploadedFile};
pub use error::{EngineError, EngineResult};
pub use fields::{
    bind_types, collect_cms_fields, collect_image_binds, list_field_ids, resolve_bind, CmsField,
};
pub use inline::{
    handle_inline_update, inline_active, InlineOutcome, InlineResponse, InlineTarget, UPLOAD_FIELD,
};
pub use materialize::{
    add_edit_link, apply_inline_attributes, apply_teaser, escape_html, InlineOptions, Materializer,
    EDIT_LINK_KEY, TREE_NODE_TYPE,
};
pub use mode::{Action, Mode, View};
pub use render::{ContentRecords, RenderOutput, Rendered};
pub use upload::{sanitize_filename, save_upload, stored_filename};
pub use views::{
    editor_tree, ListEditorData, SingleEditorData, LIST_EDITOR_MARKUP, SINGLE_EDITOR_MARKUP,
};
