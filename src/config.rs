use anyhow::{Context, Result};
use lml_parse::{AttributeOrder, Format, OutputConfig};
use serde::Deserialize;
use std::path::Path;

/// Name of the config file picked up from the working directory.
pub const CONFIG_FILE: &str = "lml.json";

/// lml.json schema. Every field is optional; command-line flags win.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    pub from: Option<Format>,
    pub to: Option<Format>,

    #[serde(flatten)]
    pub output: OutputConfig,
}

/// Output options given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub minify: bool,
    pub indentation: Option<String>,
    pub line_wrap: Option<usize>,
    pub order_attributes: Option<AttributeOrder>,
}

/// Load `explicit` if given (it must exist), else `lml.json` in `dir` if it
/// exists, else defaults.
pub fn load_config(dir: &Path, explicit: Option<&Path>) -> Result<CliConfig> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = dir.join(CONFIG_FILE);
            if !path.exists() {
                return Ok(CliConfig::default());
            }
            path
        }
    };

    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: CliConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    log::debug!(target: "lml", "loaded config from {}", config_path.display());
    Ok(config)
}

/// Source format from the file extension: `.html`/`.htm` and `.json` are
/// recognized, anything else is LML.
pub fn infer_source_format(path: &Path) -> Format {
    match extension(path).as_deref() {
        Some("html" | "htm") => Format::Html,
        Some("json") => Format::Json,
        _ => Format::Lml,
    }
}

/// Target format from the output file extension, else the counterpart of
/// the source format (HTML becomes LML, everything else becomes HTML).
pub fn infer_target_format(out: Option<&Path>, from: Format) -> Format {
    match out.and_then(extension).as_deref() {
        Some("html" | "htm") => Format::Html,
        Some("json") => Format::Json,
        Some("lml") => Format::Lml,
        _ if from == Format::Html => Format::Lml,
        _ => Format::Html,
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Translate an indentation argument: `s`/`\s` mean a space, `t`/`\t` a tab.
/// Validation happens when the output config is resolved.
pub fn parse_indentation(indent: &str) -> String {
    indent.to_lowercase()
        .replace("\\s", " ")
        .replace("\\t", "\t")
        .replace('s', " ")
        .replace('t', "\t")
}

/// Apply command-line overrides on top of the file config.
///
/// `--minify` drops an indentation that only came from the config file, so
/// one flag is enough to switch a configured project to minified output.
pub fn merge_output(base: &OutputConfig, overrides: &Overrides) -> OutputConfig {
    let mut output = base.clone();
    if overrides.minify {
        output.minify = true;
        output.indentation = None;
    }
    if let Some(indent) = &overrides.indentation {
        output.indentation = Some(parse_indentation(indent));
    }
    if let Some(line_wrap) = overrides.line_wrap {
        output.line_wrap = Some(line_wrap);
    }
    if let Some(order) = overrides.order_attributes {
        output.order_attributes = order;
    }
    output
}
