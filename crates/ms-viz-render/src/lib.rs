//! # ms-viz-render
//!
//! Turns `ms-viz` artifacts (as JSON) into standalone SVG documents.
//! All file output lives here; computation crates never touch the disk.

pub mod config;
pub mod header;
pub mod layout;
pub mod plots;
pub mod svg;
pub mod text;

use std::path::Path;

use config::VizConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("unsupported output format: {0}")]
    Format(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render an artifact JSON to SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    let svg = match kind {
        "plateau" => {
            let art: ms_viz::PlateauCurveArtifact = serde_json::from_str(artifact_json)?;
            plots::plateau::render(&art, config)?
        }
        "histogram" | "hist" => {
            let art: ms_viz::HistogramArtifact = serde_json::from_str(artifact_json)?;
            plots::histogram::render(&art, config)?
        }
        other => return Err(RenderError::UnknownKind(other.to_string())),
    };
    Ok(svg)
}

/// Render an artifact JSON to an SVG file. Only the `.svg` extension (or none) is accepted.
pub fn render_to_file(
    artifact_json: &str,
    kind: &str,
    path: &Path,
    config: &VizConfig,
) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("svg");
    if !ext.eq_ignore_ascii_case("svg") {
        return Err(RenderError::Format(ext.to_string()));
    }
    let svg = render_svg(artifact_json, kind, config)?;
    std::fs::write(path, svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind() {
        let err = render_svg("{}", "pulls", &VizConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownKind(k) if k == "pulls"));
    }

    #[test]
    fn bad_json() {
        let err = render_svg("not json", "plateau", &VizConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::Deserialize(_)));
    }

    #[test]
    fn rejects_png_path() {
        let err = render_to_file("{}", "plateau", Path::new("out.png"), &VizConfig::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::Format(f) if f == "png"));
    }
}
