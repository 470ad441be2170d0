use crate::constants::README_FILENAME;
use crate::errors::AppletflowError;
use crate::models::project::{primary_document, ProjectFile};
use crate::models::workflow::Workflow;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Html,
    Zip,
}

/// The primary document as a standalone page.
pub fn export_html(files: &[ProjectFile]) -> Result<String, AppletflowError> {
    primary_document(files)
        .map(|f| f.content.clone())
        .ok_or_else(|| AppletflowError::NotFound("No generated files to export".to_string()))
}

/// Every project file plus a generated README, as zip bytes.
pub fn export_zip(files: &[ProjectFile], workflow: &Workflow) -> Result<Vec<u8>, AppletflowError> {
    if files.is_empty() {
        return Err(AppletflowError::NotFound("No generated files to export".to_string()));
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let entries = archive_entries(files);

    for (name, file) in &entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(file.content.as_bytes())?;
    }

    if !entries.iter().any(|(name, _)| name == README_FILENAME) {
        writer.start_file(README_FILENAME, options)?;
        writer.write_all(readme(files, workflow).as_bytes())?;
    }

    let cursor = writer.finish()?;

    Ok(cursor.into_inner())
}

/// Archive path for a file name: relative, with `.`, `..` and empty segments dropped.
fn archive_path(name: &str) -> Option<String> {
    let segments: Vec<&str> = name
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// One entry per archive path, keeping first position and last content.
fn archive_entries(files: &[ProjectFile]) -> Vec<(String, &ProjectFile)> {
    let mut entries: Vec<(String, &ProjectFile)> = Vec::with_capacity(files.len());

    for file in files {
        let Some(path) = archive_path(&file.name) else {
            log::warn!("Skipping export entry with unusable name {:?}", file.name);
            continue;
        };

        match entries.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = file,
            None => entries.push((path, file)),
        }
    }

    entries
}

fn readme(files: &[ProjectFile], workflow: &Workflow) -> String {
    let entry = primary_document(files).map(|f| f.name.as_str()).unwrap_or("index.html");
    let file_list = files
        .iter()
        .map(|f| format!("  - {}", f.name))
        .collect::<Vec<String>>()
        .join("\n");
    let workflow_summary = workflow.describe();

    format!(
        "Generated with AppletFlow\n\
         =========================\n\
         \n\
         This is a static web application. It needs no build step and no server-side code.\n\
         \n\
         Run it locally\n\
         --------------\n\
         1. Unzip the archive.\n\
         2. Open {entry} in a browser, or serve the folder:\n\
         \x20    python3 -m http.server 8000\n\
         \x20  then visit http://localhost:8000/{entry}\n\
         \n\
         Files\n\
         -----\n\
         {file_list}\n\
         \n\
         Workflow\n\
         --------\n\
         {workflow_summary}\n"
    )
}
