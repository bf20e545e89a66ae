use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tradedoc_core::{render_json, LogoImage, RenderConfig};

pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tradedoc_core=debug")),
        )
        .init();
}

/// Directory holding the sample JSON documents.
pub fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Render `document` (JSON) with `config` (JSON) and write the PDF to
/// `demos/output/<name>.pdf`. An unreadable logo is skipped.
pub fn render_file(
    document: &Path,
    config: &Path,
    logo: Option<&Path>,
    name: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(document)?)?;
    let config = RenderConfig::from_json_str(&fs::read_to_string(config)?)?;

    let logo = logo.and_then(|path| match fs::read(path) {
        Ok(bytes) => LogoImage::from_bytes(bytes)
            .map_err(|e| warn!(path = %path.display(), error = %e, "Skipping logo"))
            .ok(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping logo");
            None
        }
    });

    let rendered = render_json(&value, &config, logo.as_ref())?;

    let out_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("output");
    fs::create_dir_all(&out_dir)?;
    let out_path = out_dir.join(format!("{}.pdf", name));
    fs::write(&out_path, &rendered.bytes)?;

    info!(
        path = %out_path.display(),
        pages = rendered.page_count,
        total_gross = rendered.totals.total_gross,
        "Wrote PDF"
    );
    Ok(out_path)
}
