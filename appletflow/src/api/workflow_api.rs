use crate::api::types::Response;
use crate::app::App;
use crate::models::diff::WorkflowDiff;
use crate::models::edge::WorkflowEdge;
use crate::models::node::{NodeDraft, WorkflowNode};
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[get("")]
pub async fn get_workflow(app: web::Data<App>) -> Response {
    let workflow = app.workflow()?;

    Ok(HttpResponse::Ok().json(workflow))
}

#[derive(Deserialize)]
pub struct SaveWorkflowParams {
    #[serde(default)]
    nodes: Vec<WorkflowNode>,

    #[serde(default)]
    edges: Vec<WorkflowEdge>,
}

/// Wholesale save of the editor state.
#[put("")]
pub async fn save_workflow(app: web::Data<App>, params: web::Json<SaveWorkflowParams>) -> Response {
    let SaveWorkflowParams { nodes, edges } = params.into_inner();

    let workflow = app.mutate_workflow(|workflow| {
        workflow.replace(nodes, edges)?;

        Ok(workflow.clone())
    })?;

    Ok(HttpResponse::Ok().json(workflow))
}

#[derive(Deserialize)]
pub struct CreateNodeParams {
    id: Option<String>,

    #[serde(flatten)]
    draft: NodeDraft,
}

#[post("/nodes")]
pub async fn create_node(app: web::Data<App>, params: web::Json<CreateNodeParams>) -> Response {
    let CreateNodeParams { id, draft } = params.into_inner();

    let node = app.mutate_workflow(|workflow| workflow.add_node(draft, id).cloned())?;

    Ok(HttpResponse::Ok().json(node))
}

#[put("/nodes/{id}")]
pub async fn update_node(app: web::Data<App>, id: web::Path<String>, draft: web::Json<NodeDraft>) -> Response {
    let node = app.mutate_workflow(|workflow| workflow.update_node(&id, draft.into_inner()).cloned())?;

    Ok(HttpResponse::Ok().json(node))
}

#[delete("/nodes/{id}")]
pub async fn delete_node(app: web::Data<App>, id: web::Path<String>) -> Response {
    let node = app.mutate_workflow(|workflow| workflow.delete_node(&id))?;

    Ok(HttpResponse::Ok().json(node))
}

#[post("/edges")]
pub async fn create_edge(app: web::Data<App>, edge: web::Json<WorkflowEdge>) -> Response {
    let edge = app.mutate_workflow(|workflow| workflow.add_edge(edge.into_inner()).cloned())?;

    Ok(HttpResponse::Ok().json(edge))
}

#[delete("/edges/{id}")]
pub async fn delete_edge(app: web::Data<App>, id: web::Path<String>) -> Response {
    app.mutate_workflow(|workflow| workflow.delete_edge(&id))?;

    Ok(HttpResponse::Ok().json(json!({ "id": id.into_inner() })))
}

/// Pending changes against the last generation, `null` when nothing changed.
#[get("/diff")]
pub async fn get_workflow_diff(app: web::Data<App>) -> Response {
    let workflow = app.workflow()?;
    let last = app.history.lock()?.latest().cloned();

    let diff = WorkflowDiff::against_history(&workflow.nodes, &workflow.edges, last.as_ref());

    Ok(HttpResponse::Ok().json(diff))
}
