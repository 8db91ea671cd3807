//! View/action resolution.

use tracing::warn;

use crate::config::RecordsConfig;

/// Which records an instance shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Single,
}

/// Whether an instance renders records or edits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Render,
    Edit,
}

/// One of the four operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub view: View,
    pub action: Action,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::List => "list",
            View::Single => "single",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "list" => Some(View::List),
            "single" => Some(View::Single),
            _ => None,
        }
    }
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Render => "render",
            Action::Edit => "edit",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "render" => Some(Action::Render),
            "edit" => Some(Action::Edit),
            _ => None,
        }
    }
}

impl Mode {
    /// Resolves the mode from `view`/`action`, falling back to the legacy
    /// `mode` only when both are empty.
    ///
    /// Unrecognized values resolve like empty ones: `list` and `render`.
    pub fn resolve(config: &RecordsConfig) -> Self {
        Self::from_parts(&config.view, &config.action, &config.mode)
    }

    pub fn from_parts(view: &str, action: &str, mode: &str) -> Self {
        let view = view.trim().to_ascii_lowercase();
        let action = action.trim().to_ascii_lowercase();
        let mode = mode.trim().to_ascii_lowercase();

        let (mut resolved_view, mut resolved_action) = (View::parse(&view), Action::parse(&action));
        if view.is_empty() && action.is_empty() {
            match mode.as_str() {
                "render" => (resolved_view, resolved_action) = (Some(View::List), Some(Action::Render)),
                "cms" => (resolved_view, resolved_action) = (Some(View::List), Some(Action::Edit)),
                "edit" => (resolved_view, resolved_action) = (Some(View::Single), Some(Action::Edit)),
                "" => {}
                other => warn!(mode = other, "unknown legacy mode, using list/render"),
            }
        }
        if resolved_view.is_none() && !view.is_empty() {
            warn!(view = %view, "unknown view, using list");
        }
        if resolved_action.is_none() && !action.is_empty() {
            warn!(action = %action, "unknown action, using render");
        }

        Mode {
            view: resolved_view.unwrap_or(View::List),
            action: resolved_action.unwrap_or(Action::Render),
        }
    }
}
