use crate::api::types::Response;
use crate::app::App;
use crate::errors::AppletflowError;
use crate::services::ai::{AiMessage, Completion};
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse, HttpResponseBuilder};
use serde_json::{json, Value};

/// Forwards `{messages}` to the AI collaborator so the key never reaches the browser.
#[post("")]
pub async fn ai_completion(app: web::Data<App>, body: web::Bytes) -> Response {
    proxy_completion(app.ai_client.as_ref(), &body).await
}

pub async fn proxy_completion<C: Completion>(ai: &C, body: &[u8]) -> Response {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| AppletflowError::BadRequest("Invalid JSON".to_string()))?;

    let messages: Vec<AiMessage> = value
        .get("messages")
        .cloned()
        .and_then(|messages| serde_json::from_value(messages).ok())
        .filter(|messages: &Vec<AiMessage>| !messages.is_empty())
        .ok_or_else(|| AppletflowError::BadRequest("Missing messages".to_string()))?;

    match ai.complete(&messages).await {
        Ok(content) => Ok(HttpResponse::Ok().json(json!({ "content": content }))),
        Err(AppletflowError::AiError(error)) => {
            Ok(HttpResponseBuilder::new(StatusCode::BAD_GATEWAY).json(json!({ "error": error })))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai::tests::ScriptedCompletion;
    use actix_web::body::MessageBody;

    fn body_json(resp: HttpResponse) -> Value {
        let bytes = resp.into_body().try_into_bytes().unwrap();

        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn returns_content() {
        let ai = ScriptedCompletion::replying(vec![Ok("hello".to_string())]);

        let resp = proxy_completion(&ai, br#"{"messages": [{"role": "user", "content": "hi"}]}"#)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp)["content"], "hello");
    }

    #[actix_web::test]
    async fn collaborator_failure_is_bad_gateway() {
        let ai = ScriptedCompletion::replying(vec![Err(AppletflowError::AiError("API key not configured".to_string()))]);

        let resp = proxy_completion(&ai, br#"{"messages": [{"role": "user", "content": "hi"}]}"#)
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp)["error"], "API key not configured");
    }

    #[actix_web::test]
    async fn rejects_bad_requests_without_calling_ai() {
        let ai = ScriptedCompletion::default();

        for (payload, message) in [
            (&b"nope"[..], "Invalid JSON"),
            (&b"{}"[..], "Missing messages"),
            (&br#"{"messages": []}"#[..], "Missing messages"),
        ] {
            match proxy_completion(&ai, payload).await {
                Err(AppletflowError::BadRequest(e)) => assert_eq!(e, message),
                other => panic!("expected bad request, got {:?}", other.map(|r| r.status())),
            }
        }

        assert_eq!(ai.request_count(), 0);
    }
}
