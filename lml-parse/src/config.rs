//! Output configuration shared by the renderers.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_INDENTATION: &str = "  ";
pub const DEFAULT_LINE_WRAP: usize = 120;

/// Output format selected at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Html,
    Lml,
    Json,
}

/// Order in which element attributes are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeOrder {
    /// Keep source order.
    #[default]
    AsAuthored,
    /// Sort by attribute name.
    Alphabetical,
}

/// Output modifier options.
///
/// `indentation == None` means "use the default"; `Some("")` is an explicit
/// request for no indentation. A `line_wrap` of `Some(0)` disables wrapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_wrap: Option<usize>,
    pub minify: bool,
    pub order_attributes: AttributeOrder,
}

impl OutputConfig {
    pub fn minified() -> Self {
        Self {
            minify: true,
            ..Self::default()
        }
    }

    pub fn with_indentation(indentation: impl Into<String>) -> Self {
        Self {
            indentation: Some(indentation.into()),
            ..Self::default()
        }
    }

    /// Check this configuration against `format` and fill in defaults.
    pub fn resolve(&self, format: Format) -> Result<ResolvedConfig, ConfigError> {
        if let Some(indentation) = &self.indentation {
            let only_spaces = indentation.chars().all(|c| c == ' ');
            if !only_spaces && indentation != "\t" {
                return Err(ConfigError::InvalidIndentation(indentation.clone()));
            }
            if self.minify && !indentation.is_empty() {
                return Err(ConfigError::MinifyWithIndentation);
            }
        }
        if format == Format::Lml {
            if self.minify {
                return Err(ConfigError::MinifyLml);
            }
            if self.indentation.as_deref() == Some("") {
                return Err(ConfigError::EmptyLmlIndentation);
            }
        }

        let indentation = if self.minify {
            String::new()
        } else {
            self.indentation
                .clone()
                .unwrap_or_else(|| DEFAULT_INDENTATION.to_string())
        };
        let line_wrap = match self.line_wrap {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(DEFAULT_LINE_WRAP),
        };
        Ok(ResolvedConfig {
            indentation,
            line_wrap,
            minify: self.minify,
            order_attributes: self.order_attributes,
        })
    }
}

/// A validated configuration with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub indentation: String,
    pub line_wrap: Option<usize>,
    pub minify: bool,
    pub order_attributes: AttributeOrder,
}

impl ResolvedConfig {
    /// Indentation prefix for nesting `depth`.
    pub fn tabulation(&self, depth: usize) -> String {
        self.indentation.repeat(depth)
    }

    /// Whether a line of `width` characters fits the wrap limit.
    pub fn fits(&self, width: usize) -> bool {
        self.line_wrap.is_none_or(|limit| width <= limit)
    }
}
