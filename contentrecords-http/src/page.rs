//! Pages: ordered component instances rendered against one request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use contentrecords_engine::{ContentRecords, HostRequest, RenderContext, Rendered};
use contentrecords_tree::{Map, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{HostError, HostResult};

const PATH_KEY: &str = "hyperbricks_path";
const KEY_KEY: &str = "hyperbricks_key";
const PAGE_ROOT: &str = "page";

/// The component instances of a page, in render order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    instances: Vec<Node>,
}

impl Page {
    pub fn new(instances: Vec<Node>) -> Self {
        Self { instances }
    }

    /// Builds a page from a document node.
    ///
    /// A list is taken in order. A map contributes its map-valued entries,
    /// numeric keys first in numeric order; `@`-prefixed keys are skipped.
    /// Each instance is tagged with its document path unless it has one.
    pub fn from_node(document: Node) -> HostResult<Self> {
        let entries: Vec<(String, Node)> = match document {
            Node::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (idx.to_string(), item))
                .collect(),
            Node::Map(map) => {
                let mut entries: Vec<(String, Node)> = map
                    .into_iter()
                    .filter(|(key, value)| !key.starts_with('@') && value.as_map().is_some())
                    .collect();
                entries.sort_by_key(|(key, _)| (key.parse::<i64>().unwrap_or(i64::MAX), key.clone()));
                entries
            }
            _ => return Err(HostError::Page("expected a list or map of instances".into())),
        };

        let instances = entries
            .into_iter()
            .map(|(key, node)| match node {
                Node::Map(map) => Ok(tag_instance(map, &key)),
                _ => Err(HostError::Page(format!("instance {key} is not a map"))),
            })
            .collect::<HostResult<Vec<_>>>()?;
        Ok(Self { instances })
    }

    /// Parses a YAML page document.
    pub fn parse_yaml(input: &str) -> HostResult<Self> {
        Self::from_node(Node::parse_yaml(input)?)
    }

    pub fn instances(&self) -> &[Node] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn tag_instance(mut map: Map, key: &str) -> Node {
    map.entry(PATH_KEY.to_string())
        .or_insert_with(|| Node::from(format!("{PAGE_ROOT}.{key}")));
    map.entry(KEY_KEY.to_string())
        .or_insert_with(|| Node::from(key));
    Node::Map(map)
}

/// Body of a normally rendered page.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct PageResponse {
    /// One entry per instance: the rendered tree, or a placeholder string.
    pub items: Vec<Value>,
    pub errors: Vec<String>,
}

/// What the host sends back for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Page(PageResponse),
    /// An instance answered an inline edit; its JSON is the whole response.
    Inline { status: u16, body: Value },
    /// A form action asked for a `303 See Other`.
    Redirect(String),
}

impl IntoResponse for PageOutcome {
    fn into_response(self) -> Response {
        match self {
            PageOutcome::Page(page) => Json(page).into_response(),
            PageOutcome::Inline { status, body } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(body)).into_response()
            }
            PageOutcome::Redirect(location) => Redirect::to(&location).into_response(),
        }
    }
}

/// Shared state of a running host.
pub struct HostState {
    engine: ContentRecords,
    page: Page,
    body_limit: usize,
}

impl HostState {
    /// Default request body limit: 8 MiB.
    pub const DEFAULT_BODY_LIMIT: usize = 8 * 1024 * 1024;

    pub fn new(engine: ContentRecords, page: Page) -> Self {
        Self {
            engine,
            page,
            body_limit: Self::DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn engine(&self) -> &ContentRecords {
        &self.engine
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Renders every instance against `request`.
    ///
    /// Stops at the first instance that answers with JSON or a redirect.
    pub fn render(&self, request: &HostRequest) -> PageOutcome {
        let ctx = RenderContext::with_request(request);
        let mut response = PageResponse::default();

        for instance in self.page.instances() {
            let output = self.engine.render(instance, &ctx);
            for error in &output.errors {
                warn!(%error, "component error");
                response.errors.push(error.to_string());
            }
            match output.rendered {
                Rendered::Json { status, body } => return PageOutcome::Inline { status, body },
                Rendered::Redirect { location } => return PageOutcome::Redirect(location),
                Rendered::Html(html) => response.items.push(Value::String(html)),
                Rendered::Tree(tree) => response.items.push(tree.to_json()),
            }
        }
        PageOutcome::Page(response)
    }
}
