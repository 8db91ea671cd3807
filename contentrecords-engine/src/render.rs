//! Component rendering.
//!
//! [`ContentRecords::render`] is the single entry point a host calls per
//! component instance. It resolves the mode, opens (and optionally seeds) the
//! store, lets the inline handler short-circuit, and otherwise builds the
//! output tree for the mode.

use std::slice;
use std::sync::Arc;

use contentrecords_store::{Record, RecordStore, StoreRegistry, StoreResult};
use contentrecords_tree::{collect_binds, collect_flagged_keys, BindIndex, Node, LIST_FLAG};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cms::{apply_list_action, apply_single_action, FormTarget};
use crate::config::{parse_record_id, record_type_name, ComponentInstance, RecordsConfig};
use crate::context::RenderContext;
use crate::error::EngineError;
use crate::fields::{bind_types, collect_cms_fields, collect_image_binds};
use crate::inline::{handle_inline_update, inline_active, InlineOutcome, InlineTarget};
use crate::materialize::{apply_teaser, InlineOptions, Materializer};
use crate::mode::{Action, Mode, View};
use crate::views::{
    editor_tree, ListEditorData, SingleEditorData, LIST_EDITOR_MARKUP, SINGLE_EDITOR_MARKUP,
};

/// What the host should do with a rendered instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Literal HTML, used for placeholders.
    Html(String),
    /// A tree for the host renderer.
    Tree(Node),
    /// An inline-edit answer; the host sends it as the whole response.
    Json { status: u16, body: Value },
    /// A form action succeeded; the host answers with `303 See Other`.
    Redirect { location: String },
}

impl Rendered {
    /// Returns the HTML text of a placeholder result.
    pub fn as_html(&self) -> Option<&str> {
        match self {
            Rendered::Html(html) => Some(html),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&Node> {
        match self {
            Rendered::Tree(node) => Some(node),
            _ => None,
        }
    }
}

/// Result of one render: best-effort output plus everything that went wrong.
#[derive(Debug)]
pub struct RenderOutput {
    pub rendered: Rendered,
    pub errors: Vec<EngineError>,
}

fn placeholder(what: &str) -> Rendered {
    Rendered::Html(format!("<!-- content_records_plugin {what} -->"))
}

/// Template state shared by every mode once the store is open.
struct Loaded {
    template: Node,
    binds: BindIndex,
    store: Arc<RecordStore>,
    record_type: String,
}

impl Loaded {
    fn inline_target<'a>(&'a self, config: &'a RecordsConfig) -> InlineTarget<'a> {
        InlineTarget {
            store: &self.store,
            record_type: &self.record_type,
            binds: &self.binds,
            template: &self.template,
            config,
        }
    }

    /// Records for list views: explicit ids when configured, else the query.
    fn list_records(&self, config: &RecordsConfig) -> StoreResult<Vec<Record>> {
        let ids = config.record_ids();
        if ids.is_empty() {
            self.store.fetch_records(config.query(), &self.record_type)
        } else {
            self.store.fetch_by_ids(&ids, &self.record_type)
        }
    }
}

/// The content records renderer.
///
/// Cheap to clone; all clones share one store registry.
#[derive(Clone, Default)]
pub struct ContentRecords {
    registry: Arc<StoreRegistry>,
}

impl ContentRecords {
    pub fn new(registry: Arc<StoreRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<StoreRegistry> {
        &self.registry
    }

    /// Renders one component instance.
    pub fn render(&self, instance: &Node, ctx: &RenderContext<'_>) -> RenderOutput {
        let mut errors = Vec::new();
        let rendered = match ComponentInstance::decode(instance) {
            Ok(component) => self.render_config(&component.data, ctx, &mut errors),
            Err(e) => {
                warn!(error = %e, "component rejected");
                errors.push(e);
                placeholder("decode failed")
            }
        };
        if !errors.is_empty() {
            debug!(errors = errors.len(), "render finished with errors");
        }
        RenderOutput { rendered, errors }
    }

    fn render_config(
        &self,
        config: &RecordsConfig,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> Rendered {
        let mode = Mode::resolve(config);
        match (mode.view, mode.action) {
            (View::List, Action::Render) => self.render_list(config, ctx, errors),
            (View::List, Action::Edit) => self.edit_list(config, mode, ctx, errors),
            (View::Single, Action::Render) => self.render_single(config, ctx, errors),
            (View::Single, Action::Edit) => self.edit_single(config, mode, ctx, errors),
        }
    }

    fn load(&self, config: &RecordsConfig, errors: &mut Vec<EngineError>) -> Option<Loaded> {
        let template = match config.template() {
            Some(template @ Node::Map(_)) => template.clone(),
            _ => {
                errors.push(EngineError::Validation("data.template must be a map".into()));
                return None;
            }
        };
        if config.store_path().is_empty() {
            errors.push(EngineError::Validation("data.store is required".into()));
            return None;
        }
        let binds = collect_binds(&template, "");

        let store = match self.registry.open(config.store_path()) {
            Ok(store) => store,
            Err(e) => {
                warn!(store = config.store_path(), error = %e, "record store unavailable");
                errors.push(EngineError::store("open store")(e));
                return None;
            }
        };

        let record_type = record_type_name(&template);
        if config.seed {
            if let Err(e) = store.seed_if_empty(&template, &binds, &record_type) {
                errors.push(EngineError::store("seed")(e));
            }
        }

        Some(Loaded {
            template,
            binds,
            store,
            record_type,
        })
    }

    /// Offers the request to the inline handler when inline editing is live.
    fn try_inline(
        loaded: &Loaded,
        config: &RecordsConfig,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> Option<Rendered> {
        if !inline_active(config, ctx) {
            return None;
        }
        match handle_inline_update(&loaded.inline_target(config), ctx, errors) {
            InlineOutcome::Declined => None,
            InlineOutcome::Responded(response) => Some(Rendered::Json {
                status: response.status,
                body: response.body,
            }),
        }
    }

    fn inline_options(
        loaded: &Loaded,
        config: &RecordsConfig,
        ctx: &RenderContext<'_>,
    ) -> Option<InlineOptions> {
        inline_active(config, ctx).then(|| InlineOptions::new(bind_types(config, &loaded.binds)))
    }

    // ── list + render ────────────────────────────────────────────

    fn render_list(
        &self,
        config: &RecordsConfig,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> Rendered {
        let Some(loaded) = self.load(config, errors) else {
            return placeholder("list render failed");
        };
        if let Some(response) = Self::try_inline(&loaded, config, ctx, errors) {
            return response;
        }

        let records = match loaded.list_records(config) {
            Ok(records) => records,
            Err(e) => {
                errors.push(EngineError::store("fetch records")(e));
                return placeholder("fetch records failed");
            }
        };

        let image_binds = collect_image_binds(config, &loaded.binds);
        let template = apply_teaser(&loaded.template, config.teaser);
        let inline = Self::inline_options(&loaded, config, ctx);
        let mut materializer =
            Materializer::new(&loaded.binds, &image_binds).with_inline(inline.as_ref());
        if config.editable {
            materializer = materializer.with_edit_link(config.edit_route(), config.record_param());
        }
        Rendered::Tree(materializer.build_list(&template, &records))
    }

    // ── list + edit ──────────────────────────────────────────────

    fn edit_list(
        &self,
        config: &RecordsConfig,
        mode: Mode,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> Rendered {
        let Some(loaded) = self.load(config, errors) else {
            return placeholder("list edit failed");
        };

        let fields = collect_cms_fields(config, &loaded.binds);
        let target = FormTarget {
            store: &loaded.store,
            record_type: &loaded.record_type,
            fields: &fields,
            upload_dir: config.upload_dir(),
        };
        apply_list_action(&target, ctx, errors);

        let records = match loaded.list_records(config) {
            Ok(records) => records,
            Err(e) => {
                errors.push(EngineError::store("fetch records")(e));
                return placeholder("fetch records failed");
            }
        };

        let image_binds = collect_image_binds(config, &loaded.binds);
        let list_binds = collect_flagged_keys(&loaded.template, LIST_FLAG);
        let preview = config.show_preview().then(|| {
            Materializer::new(&loaded.binds, &image_binds).build_list(&loaded.template, &records)
        });
        let values = ListEditorData {
            config,
            mode,
            record_type: &loaded.record_type,
            records: &records,
            fields: &fields,
            list_binds: &list_binds,
            preview,
        }
        .into_values();
        Rendered::Tree(editor_tree(LIST_EDITOR_MARKUP, values))
    }

    // ── single + edit ────────────────────────────────────────────

    fn edit_single(
        &self,
        config: &RecordsConfig,
        mode: Mode,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> Rendered {
        let Some(loaded) = self.load(config, errors) else {
            return placeholder("single edit failed");
        };

        let fields = collect_cms_fields(config, &loaded.binds);
        let target = FormTarget {
            store: &loaded.store,
            record_type: &loaded.record_type,
            fields: &fields,
            upload_dir: config.upload_dir(),
        };
        let outcome = apply_single_action(&target, ctx, single_record_id(config, ctx), errors);

        let list_route = config.list_route();
        if outcome.succeeded && !list_route.is_empty() && ctx.request().is_some() {
            return Rendered::Redirect {
                location: list_route.to_string(),
            };
        }

        let mut record_id = outcome.record_id;
        if record_id == 0 {
            match loaded
                .store
                .create_from_template(&loaded.record_type, &loaded.template, &loaded.binds)
            {
                Ok(id) => record_id = id,
                Err(e) => errors.push(EngineError::store("create")(e)),
            }
        }

        let record = match loaded.store.fetch_by_id(record_id, &loaded.record_type) {
            Ok(record) => record,
            Err(e) => {
                errors.push(EngineError::store("fetch record")(e));
                return placeholder("fetch record failed");
            }
        };

        let image_binds = collect_image_binds(config, &loaded.binds);
        let preview = config.show_preview().then(|| {
            Materializer::new(&loaded.binds, &image_binds)
                .build_list(&loaded.template, slice::from_ref(&record))
        });
        let values = SingleEditorData {
            config,
            mode,
            record_type: &loaded.record_type,
            record: &record,
            fields: &fields,
            preview,
        }
        .into_values();
        Rendered::Tree(editor_tree(SINGLE_EDITOR_MARKUP, values))
    }

    // ── single + render ──────────────────────────────────────────

    fn render_single(
        &self,
        config: &RecordsConfig,
        ctx: &RenderContext<'_>,
        errors: &mut Vec<EngineError>,
    ) -> Rendered {
        let Some(loaded) = self.load(config, errors) else {
            return placeholder("single render failed");
        };
        if let Some(response) = Self::try_inline(&loaded, config, ctx, errors) {
            return response;
        }

        let mut record_id = single_record_id(config, ctx);
        if record_id == 0 && !config.query().is_empty() {
            match loaded.store.fetch_ids(config.query(), &loaded.record_type) {
                Ok(ids) => record_id = ids.first().copied().unwrap_or(0),
                Err(e) => {
                    errors.push(EngineError::store("fetch ids")(e));
                    return placeholder("fetch ids failed");
                }
            }
        }
        if record_id == 0 {
            return placeholder("no record id");
        }

        let record = match loaded.store.fetch_by_id(record_id, &loaded.record_type) {
            Ok(record) => record,
            Err(e) => {
                errors.push(EngineError::store("fetch record")(e));
                return placeholder("fetch record failed");
            }
        };

        let image_binds = collect_image_binds(config, &loaded.binds);
        let template = apply_teaser(&loaded.template, config.teaser);
        let inline = Self::inline_options(&loaded, config, ctx);
        let mut materializer =
            Materializer::new(&loaded.binds, &image_binds).with_inline(inline.as_ref());
        if config.editable {
            materializer = materializer.with_edit_link(config.edit_route(), config.record_param());
        }
        Rendered::Tree(materializer.build_instance(&template, &record))
    }
}

/// Record id for single views: configured `id`/`ids`, else the request's
/// `record_param` input.
fn single_record_id(config: &RecordsConfig, ctx: &RenderContext<'_>) -> i64 {
    match config.configured_record_id() {
        0 => parse_record_id(ctx.input(config.record_param())),
        id => id,
    }
}
