use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Editor behaviour settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EditorConfig {
    /// Width of one depth level in pointer units (pixels or cells).
    pub indentation_width: f32,
    /// How long a drag must hover a collapsed node before it expands.
    pub hover_expand_delay: Duration,
    /// Upper bound on total nodes; checked before inserts.
    pub max_nodes: Option<usize>,
    /// Reject commits that would give two siblings the same name.
    pub unique_sibling_names: bool,
}

impl EditorConfig {
    pub const DEFAULT_INDENTATION_WIDTH: f32 = 24.0;
    pub const DEFAULT_HOVER_EXPAND_DELAY: Duration = Duration::from_millis(600);

    pub const fn new() -> Self {
        Self {
            indentation_width: Self::DEFAULT_INDENTATION_WIDTH,
            hover_expand_delay: Self::DEFAULT_HOVER_EXPAND_DELAY,
            max_nodes: None,
            unique_sibling_names: false,
        }
    }

    #[must_use]
    pub const fn indentation_width(mut self, width: f32) -> Self {
        self.indentation_width = width;
        self
    }

    #[must_use]
    pub const fn hover_expand_delay(mut self, delay: Duration) -> Self {
        self.hover_expand_delay = delay;
        self
    }

    #[must_use]
    pub const fn max_nodes(mut self, limit: usize) -> Self {
        self.max_nodes = Some(limit);
        self
    }

    #[must_use]
    pub const fn unique_sibling_names(mut self, enabled: bool) -> Self {
        self.unique_sibling_names = enabled;
        self
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}
