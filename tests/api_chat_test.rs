//! Integration tests for the chat and title generation endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{
        TEST_USER, body_to_json, body_to_string, json_request, test_app, test_app_with_hosts,
    };

    const OPENAI_SSE: &str = r#"data: {"id":"c1","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}

data: {"id":"c2","choices":[{"index":0,"delta":{"content":" guest"},"finish_reason":"stop"}]}

data: [DONE]

"#;

    #[tokio::test]
    #[serial]
    async fn it_streams_a_guest_chat() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-openai-key")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(OPENAI_SSE)
            .create_async()
            .await;
        let (app, _dir) = test_app_with_hosts(&server.url(), &server.url()).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                None,
                json!({
                    "messages": [{ "role": "user", "content": "Hi" }],
                    "model": "gpt-4.1-nano",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        mock.assert_async().await;
        assert!(body.contains(r#"data: {"content":"Hello"}"#));
        assert!(body.contains(r#"data: {"content":" guest"}"#));
        assert!(body.trim_end().ends_with("data: [DONE]"));
    }

    #[tokio::test]
    #[serial]
    async fn it_reads_the_model_from_data() {
        let mut server = mockito::Server::new_async().await;
        let sse = "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hey\"}]},\"finishReason\":\"STOP\"}]}\n\n";
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.0-flash:streamGenerateContent",
            )
            .match_query(mockito::Matcher::UrlEncoded("alt".into(), "sse".into()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse)
            .create_async()
            .await;
        let (app, _dir) = test_app_with_hosts(&server.url(), &server.url()).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                Some(TEST_USER),
                json!({
                    "messages": [{ "role": "user", "content": "Hi" }],
                    "data": { "model": "gemini-2.0-flash" },
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        mock.assert_async().await;
        assert!(body.contains(r#"data: {"content":"Hey"}"#));
    }

    #[tokio::test]
    #[serial]
    async fn it_rejects_unknown_models() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                None,
                json!({
                    "messages": [{ "role": "user", "content": "Hi" }],
                    "model": "gpt-9000",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["error"], "Unknown model");
    }

    #[tokio::test]
    #[serial]
    async fn it_rejects_models_the_user_disabled() {
        let (app, _dir) = test_app().await;

        app.clone()
            .oneshot(json_request(
                "PATCH",
                "/api/user-models",
                Some(TEST_USER),
                json!({ "modelId": "openai-gpt-4-1-nano", "isEnabled": false }),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                Some(TEST_USER),
                json!({
                    "messages": [{ "role": "user", "content": "Hi" }],
                    "model": "gpt-4.1-nano",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn it_reports_provider_errors_in_band() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;
        let (app, _dir) = test_app_with_hosts(&server.url(), &server.url()).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/chat",
                None,
                json!({
                    "messages": [{ "role": "user", "content": "Hi" }],
                    "model": "gpt-4.1-nano",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_string(response.into_body()).await;
        assert!(body.contains(r#"data: {"error":"Something went wrong"#));
        assert!(body.trim_end().ends_with("data: [DONE]"));
    }

    #[tokio::test]
    #[serial]
    async fn it_generates_a_clean_title() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.0-flash-lite-preview-02-05:generateContent",
            )
            .match_header("x-goog-api-key", "test-gemini-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "generationConfig": { "maxOutputTokens": 20 }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"\"Borrow Checker Basics.\""}]}}]}"#,
            )
            .create_async()
            .await;
        let (app, _dir) = test_app_with_hosts(&server.url(), &server.url()).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/generate-title",
                None,
                json!({ "messages": [{ "role": "user", "content": "Explain the borrow checker" }] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        mock.assert_async().await;
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["title"], "Borrow Checker Basics");
    }

    #[tokio::test]
    #[serial]
    async fn it_falls_back_to_the_first_user_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.0-flash-lite-preview-02-05:generateContent",
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"?"}]}}]}"#)
            .create_async()
            .await;
        let (app, _dir) = test_app_with_hosts(&server.url(), &server.url()).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/generate-title",
                None,
                json!({ "messages": [{ "role": "user", "content": "Tacos" }] }),
            ))
            .await
            .unwrap();

        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["title"], "Tacos");
    }

    #[tokio::test]
    #[serial]
    async fn it_handles_title_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "POST",
                "/v1beta/models/gemini-2.0-flash-lite-preview-02-05:generateContent",
            )
            .with_status(503)
            .create_async()
            .await;
        let (app, _dir) = test_app_with_hosts(&server.url(), &server.url()).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/generate-title",
                None,
                json!({ "messages": [] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["error"], "No messages provided");

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/generate-title",
                None,
                json!({ "messages": [{ "role": "user", "content": "Hi" }] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["error"], "Failed to generate title");
    }
}
