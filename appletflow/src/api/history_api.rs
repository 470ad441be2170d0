use crate::api::types::Response;
use crate::app::App;
use crate::models::diff::WorkflowDiff;
use crate::models::history::GenerationHistoryItem;
use actix_web::{delete, get, web, HttpResponse};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry<'a> {
    #[serde(flatten)]
    item: &'a GenerationHistoryItem,

    /// Change relative to the next older entry.
    change_summary: Option<String>,
}

#[get("")]
pub async fn get_history(app: web::Data<App>) -> Response {
    let history = app.history.lock()?;
    let items = history.items();

    let entries: Vec<HistoryEntry> = items
        .iter()
        .enumerate()
        .map(|(index, item)| HistoryEntry {
            item,
            change_summary: items
                .get(index + 1)
                .and_then(|previous| WorkflowDiff::between(item, previous)),
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "items": entries,
        "total": items.len(),
    })))
}

#[delete("")]
pub async fn clear_history(app: web::Data<App>) -> Response {
    let mut history = app.history.lock()?;
    let cleared = history.len();

    history.clear()?;
    log::info!("cleared {} history item(s)", cleared);

    Ok(HttpResponse::Ok().json(json!({ "cleared": cleared })))
}

#[cfg(test)]
mod tests {
    use crate::api::routes;
    use crate::app::tests::test_app;
    use crate::constants::HISTORY_KEY;
    use crate::models::history::GenerationHistoryItem;
    use crate::models::node::NodeType;
    use crate::models::snapshot::tests::node;
    use crate::models::snapshot::Snapshot;
    use actix_web::{test, web, App as ActixWebApp};
    use serde_json::Value;

    #[actix_web::test]
    async fn lists_with_summaries_and_clears() {
        let app_data = web::Data::new(test_app());
        {
            let mut history = app_data.history.lock().unwrap();
            let first = [node("A", NodeType::Input, "a")];
            let second = [node("A", NodeType::Input, "a"), node("B", NodeType::Show, "b")];

            history
                .record(GenerationHistoryItem::from_snapshot(&Snapshot::build(&first, &[])))
                .unwrap();
            history
                .record(GenerationHistoryItem::from_snapshot(&Snapshot::build(&second, &[])))
                .unwrap();
        }
        let app = test::init_service(ActixWebApp::new().app_data(app_data.clone()).configure(routes)).await;

        let req = test::TestRequest::get().uri("/history").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["total"], 2);
        assert_eq!(body["items"][0]["totalNodes"], 2);
        assert_eq!(body["items"][0]["changeSummary"], "+1 node");
        assert!(body["items"][1]["changeSummary"].is_null());

        let req = test::TestRequest::delete().uri("/history").to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["cleared"], 2);
        assert!(app_data.history.lock().unwrap().is_empty());
        assert!(app_data.local_store.get_raw(HISTORY_KEY).unwrap().is_none());
    }
}
