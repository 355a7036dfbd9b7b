//! Output handling for merged documents.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::PathBuf;

/// Target for output - either stdout or a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

impl OutputTarget {
    /// Create output target from optional path
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self::File(p),
            None => Self::Stdout,
        }
    }
}

/// Serialize `value` as JSON indented by `indent` spaces; 0 gives compact JSON.
pub fn render_json<T: Serialize>(value: &T, indent: usize) -> Result<String> {
    if indent == 0 {
        return serde_json::to_string(value).context("Failed to serialize document");
    }
    let indent = " ".repeat(indent);
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
    value
        .serialize(&mut serializer)
        .context("Failed to serialize document")?;
    String::from_utf8(buffer).context("Serialized document is not UTF-8")
}

/// Write output to the target (stdout or file)
pub fn write_output(content: &str, target: &OutputTarget) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{content}");
            Ok(())
        }
        OutputTarget::File(path) => {
            std::fs::write(path, format!("{content}\n"))
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!("Document written to {}", path.display());
            Ok(())
        }
    }
}
