use crate::api::types::Response;
use crate::app::App;
use crate::constants::{EXPORT_HTML_FILENAME, EXPORT_ZIP_FILENAME, LAST_PROJECT_KEY};
use crate::errors::AppletflowError;
use crate::models::diff::WorkflowDiff;
use crate::models::export::{export_html, export_zip, ExportFormat};
use crate::models::project::ProjectMetadata;
use crate::services::ai::Completion;
use crate::services::generator::Generator;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(flatten)]
    pub project: ProjectMetadata,
    pub diff: Option<WorkflowDiff>,
    pub inserted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_error: Option<String>,
}

/// One generation of the stored graph: history, last project and preview publish.
/// A failed publish still returns the files.
pub async fn run_generation<C: Completion>(app: &App, ai: &C) -> Result<GenerationResponse, AppletflowError> {
    let _guard = app.generation_lock.acquire()?;

    let workflow = app.workflow()?;
    let generation = Generator::new(ai, &app.history).generate(&workflow).await?;

    let preview_id = app.preview_id()?;
    let (preview_url, preview_error) = match app.preview_store.put(&preview_id, &generation.files).await {
        Ok(()) => (Some(app.preview_store.url(&preview_id)), None),
        Err(e) => {
            log::warn!("Preview publish failed for {}: {}", preview_id, e);

            (None, Some(e.to_string()))
        }
    };

    let project = ProjectMetadata {
        generation_id: generation.history_item.id.clone(),
        created_at: generation.history_item.created_at,
        primary_file: generation.primary,
        files: generation.files,
        preview_id,
        preview_url,
        summary: ProjectMetadata::summary_of(generation.diff.as_ref()),
    };

    app.local_store.set(LAST_PROJECT_KEY, &project)?;

    Ok(GenerationResponse {
        project,
        diff: generation.diff,
        inserted: generation.inserted,
        preview_error,
    })
}

#[post("")]
pub async fn create_generation(app: web::Data<App>) -> Response {
    let response = run_generation(&app, app.ai_client.as_ref()).await?;

    Ok(HttpResponse::Ok().json(response))
}

fn last_project(app: &App) -> Result<ProjectMetadata, AppletflowError> {
    app.local_store
        .get(LAST_PROJECT_KEY)
        .ok_or_else(|| AppletflowError::NotFound("No generation yet".to_string()))
}

#[get("/last")]
pub async fn get_last_generation(app: web::Data<App>) -> Response {
    let project = last_project(&app)?;

    Ok(HttpResponse::Ok().json(project))
}

#[derive(Deserialize)]
pub struct ExportParams {
    #[serde(default)]
    format: ExportFormat,
}

fn attachment(filename: &str) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename.to_string())],
    }
}

#[get("/export")]
pub async fn export_generation(app: web::Data<App>, params: web::Query<ExportParams>) -> Response {
    let project = last_project(&app)?;

    match params.format {
        ExportFormat::Html => {
            let html = export_html(&project.files)?;

            Ok(HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .insert_header(attachment(EXPORT_HTML_FILENAME))
                .body(html))
        }
        ExportFormat::Zip => {
            let workflow = app.workflow()?;
            let bytes = export_zip(&project.files, &workflow)?;

            Ok(HttpResponse::Ok()
                .content_type("application/zip")
                .insert_header(attachment(EXPORT_ZIP_FILENAME))
                .body(bytes))
        }
    }
}
