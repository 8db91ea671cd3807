//! Template tree model for content records.
//!
//! This crate holds the data structures every other part of the engine works
//! on:
//! - [`Node`]: the canonical map/list/scalar tree, normalized from JSON or YAML
//! - dotted-path addressing ([`get_at_path`], [`set_at_path`])
//! - a boundary-aware visitor ([`walk`], [`walk_mut`])
//! - bind extraction and flag filtering ([`collect_binds`], [`filter_by_flag`])
//!
//! Deep copies are plain `Clone`: nodes own their children, so a cloned tree
//! never aliases the original.

mod binds;
mod error;
mod node;
mod path;
mod visit;

pub use binds::{
    collect_binds, collect_flagged_keys, contains_boundary, filter_by_flag, has_flag, is_boundary,
    strip_meta_keys, BindIndex, ENGINE_PLUGIN_NAME, LIST_FLAG, META_KEYS, PLUGIN_NODE_TYPE,
    TEASER_FLAG,
};
pub use error::{TreeError, TreeResult};
pub use node::{is_affirmative_str, Map, Node};
pub use path::{get_at_path, get_at_path_mut, join_path, set_at_path, split_path};
pub use visit::{is_meta_key, walk, walk_mut, Visit};
