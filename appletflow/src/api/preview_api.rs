use crate::api::types::Response;
use crate::app::App;
use crate::errors::AppletflowError;
use crate::models::project::ProjectFile;
use crate::services::preview::PreviewStore;
use actix_web::http::header::CACHE_CONTROL;
use actix_web::{get, post, web, HttpResponse};
use serde_json::{json, Value};

/// Accepts `{id?, files}` or a bare files array. Merges into an existing id when one is given.
#[post("")]
pub async fn publish_preview(app: web::Data<App>, body: web::Bytes) -> Response {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppletflowError::BadRequest("Empty body".to_string()));
    }

    let value: Value =
        serde_json::from_slice(&body).map_err(|_| AppletflowError::BadRequest("Invalid JSON".to_string()))?;

    let (id, entries) = match &value {
        Value::Array(entries) => (None, Some(entries)),
        Value::Object(map) => (
            map.get("id").and_then(Value::as_str).filter(|id| !id.trim().is_empty()),
            map.get("files").and_then(Value::as_array),
        ),
        _ => (None, None),
    };

    let files: Vec<ProjectFile> = entries
        .map(|entries| entries.iter().filter_map(ProjectFile::from_value).collect())
        .unwrap_or_default();

    if files.is_empty() {
        return Err(AppletflowError::BadRequest("No files provided".to_string()));
    }

    let id = id.map(str::to_string).unwrap_or_else(PreviewStore::mint_id);

    app.preview_store.put(&id, &files).await?;

    Ok(HttpResponse::Ok()
        .insert_header((CACHE_CONTROL, "no-store"))
        .json(json!({
            "id": id,
            "url": app.preview_store.url(&id),
        })))
}

#[get("/{id}")]
pub async fn get_preview_index(app: web::Data<App>, id: web::Path<String>) -> Response {
    serve_preview_file(&app, &id, None).await
}

#[get("/{id}/{path:.*}")]
pub async fn get_preview_file(app: web::Data<App>, params: web::Path<(String, String)>) -> Response {
    let (id, path) = params.into_inner();

    serve_preview_file(&app, &id, Some(&path)).await
}

async fn serve_preview_file(app: &App, id: &str, path: Option<&str>) -> Response {
    let file = app.preview_store.get(id, path).await.map_err(|e| match e {
        AppletflowError::NotFound(_) => AppletflowError::NotFound("Not found".to_string()),
        other => other,
    })?;

    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header((CACHE_CONTROL, "no-store"))
        .body(file.content))
}

#[cfg(test)]
mod tests {
    use crate::api::routes;
    use crate::app::tests::test_app;
    use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App as ActixWebApp};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn publish_then_serve_and_merge() {
        let app =
            test::init_service(ActixWebApp::new().app_data(web::Data::new(test_app())).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/preview")
            .set_json(json!({"id": "abc", "files": [{"name": "index.html", "content": "<h1>Hi</h1>"}]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], "abc");
        assert_eq!(body["url"], "http://localhost:3001/preview/abc/index.html");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/preview/abc").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/html; charset=utf-8");
        assert_eq!(test::read_body(resp).await, "<h1>Hi</h1>");

        let req = test::TestRequest::post()
            .uri("/preview")
            .set_json(json!({"id": "abc", "files": [{"name": "app.js", "content": "console.log(1)"}]}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/preview/abc/app.js").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "text/javascript; charset=utf-8");

        let req = test::TestRequest::get().uri("/preview/abc/index.html").to_request();
        assert_eq!(test::read_body(test::call_service(&app, req).await).await, "<h1>Hi</h1>");
    }

    #[actix_web::test]
    async fn raw_array_mints_an_id() {
        let app =
            test::init_service(ActixWebApp::new().app_data(web::Data::new(test_app())).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/preview")
            .set_json(json!([{"name": "index.html", "content": "x"}]))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;

        assert!(body["id"].as_str().unwrap().contains('-'));
    }

    #[actix_web::test]
    async fn rejects_bad_bodies() {
        let app =
            test::init_service(ActixWebApp::new().app_data(web::Data::new(test_app())).configure(routes)).await;

        for (payload, message) in [
            ("", "Empty body"),
            ("{not json", "Invalid JSON"),
            (r#"{"files": []}"#, "No files provided"),
            (r#"{"files": [{"content": "nameless"}]}"#, "No files provided"),
        ] {
            let req = test::TestRequest::post()
                .uri("/preview")
                .insert_header((CONTENT_TYPE, "application/json"))
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], message);
        }
    }

    #[actix_web::test]
    async fn unknown_preview_is_not_found() {
        let app =
            test::init_service(ActixWebApp::new().app_data(web::Data::new(test_app())).configure(routes)).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/preview/missing").to_request()).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Not found");

        let req = test::TestRequest::post()
            .uri("/preview")
            .set_json(json!({"id": "x", "files": [{"name": "index.html", "content": "<h1>Hi</h1>"}]}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/preview/x/missing.js").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Not found");
    }
}
