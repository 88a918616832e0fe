use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::model::Blueprint;

/// Write `blueprint` as JSON to `output`, or to stdout when `output` is `-`.
pub fn emit(blueprint: &Blueprint, output: &Path, pretty: bool) -> Result<()> {
    let text = render(blueprint, pretty)?;

    if output == Path::new("-") {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}").context("Writing blueprint to stdout")?;
        return Ok(());
    }

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Creating {}", dir.display()))?;
    }
    std::fs::write(output, text + "\n").with_context(|| format!("Writing {}", output.display()))?;
    Ok(())
}

pub fn render(blueprint: &Blueprint, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(blueprint)
    } else {
        serde_json::to_string(blueprint)
    };
    text.context("Serializing blueprint")
}
