use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use log::info;

use crate::core::{
    DesignerError,
    TemplateBody,
};

pub const FRONT_LABEL: &str = "=== Front Template ===";
pub const BACK_LABEL: &str = "=== Back Template ===";
pub const STYLING_LABEL: &str = "=== Styling ===";

pub fn render_bundle(body: &TemplateBody) -> String {
    format!(
        "{}\n{}\n\n{}\n{}\n\n{}\n{}\n",
        FRONT_LABEL, body.front, BACK_LABEL, body.back, STYLING_LABEL, body.css
    )
}

pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn export_file_name(name: &str) -> String {
    format!("{}.txt", sanitize_filename(name))
}

/// Writes `<dir>/<name>.txt` and returns its path.
pub fn write_bundle(dir: &Path, name: &str, body: &TemplateBody) -> Result<PathBuf, DesignerError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(name));
    fs::write(&path, render_bundle(body))?;
    info!("Exported template to {}", path.display());
    Ok(path)
}
