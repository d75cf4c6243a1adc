//! Integration tests for the model catalog and preference endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{TEST_USER, body_to_json, get_request, json_request, test_app};

    fn names(models: &Value) -> Vec<String> {
        models
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    #[serial]
    async fn it_lists_the_seeded_catalog() {
        let (app, _dir) = test_app().await;

        let response = app.oneshot(get_request("/api/models", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
        let nano = body
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["name"] == "gpt-4.1-nano")
            .unwrap();
        assert_eq!(nano["provider"], "openai");
        assert_eq!(nano["model_type"], "text");
        assert_eq!(nano["capabilities"], json!(["fast", "tool-calling"]));
    }

    #[tokio::test]
    #[serial]
    async fn it_groups_models_by_type() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(get_request("/api/models?grouped=true", None))
            .await
            .unwrap();

        let body = body_to_json(response.into_body()).await;
        assert_eq!(names(&body["text"]), vec!["gpt-4.1-nano", "gpt-3.5-turbo"]);
        assert_eq!(
            names(&body["multimodal"]),
            vec!["gemini-1.5-flash", "gemini-2.0-flash"]
        );
        assert_eq!(names(&body["reasoning"]), vec!["gpt-4"]);
        assert!(body["visual"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn it_defaults_every_model_to_enabled() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(get_request("/api/user-models", Some(TEST_USER)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        let models = body.as_array().unwrap();
        assert_eq!(models.len(), 5);
        assert!(models.iter().all(|m| m["isEnabled"] == true));
    }

    #[tokio::test]
    #[serial]
    async fn it_disables_a_single_model() {
        let (app, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                "/api/user-models",
                Some(TEST_USER),
                json!({ "modelId": "openai-gpt-4", "isEnabled": false }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["preference"]["model_id"], "openai-gpt-4");
        assert_eq!(body["preference"]["is_enabled"], false);

        let response = app
            .oneshot(get_request("/api/user-models?enabled=true", Some(TEST_USER)))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        let enabled = names(&body);
        assert_eq!(enabled.len(), 4);
        assert!(!enabled.contains(&"gpt-4".to_string()));
    }

    #[tokio::test]
    #[serial]
    async fn it_validates_preference_updates() {
        let (app, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                "/api/user-models",
                Some(TEST_USER),
                json!({ "modelId": "openai-gpt-4" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                "/api/user-models",
                Some(TEST_USER),
                json!({ "modelId": "nope", "isEnabled": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(json_request(
                "PATCH",
                "/api/user-models",
                None,
                json!({ "modelId": "openai-gpt-4", "isEnabled": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[serial]
    async fn it_bulk_disables_by_type_then_resets() {
        let (app, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/user-models/bulk",
                Some(TEST_USER),
                json!({ "action": "disable", "modelType": "multimodal" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["updated"], 2);
        assert_eq!(body["message"], "Successfully disabled 2 models");

        let response = app
            .clone()
            .oneshot(get_request(
                "/api/user-models?enabled=true&grouped=true",
                Some(TEST_USER),
            ))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert!(body["multimodal"].as_array().unwrap().is_empty());
        assert_eq!(body["text"].as_array().unwrap().len(), 2);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/user-models/bulk",
                Some(TEST_USER),
                json!({ "action": "reset" }),
            ))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["updated"], 5);

        let response = app
            .oneshot(get_request("/api/user-models?enabled=true", Some(TEST_USER)))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    #[serial]
    async fn it_prefers_model_type_over_model_ids() {
        let (app, _dir) = test_app().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/user-models/bulk",
                Some(TEST_USER),
                json!({
                    "action": "disable",
                    "modelType": "multimodal",
                    "modelIds": ["openai-gpt-4"],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        assert_eq!(body["message"], "Successfully disabled 2 models");

        let response = app
            .oneshot(get_request("/api/user-models?enabled=true", Some(TEST_USER)))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        let mut enabled = names(&body);
        enabled.sort();
        assert_eq!(enabled, vec!["gpt-3.5-turbo", "gpt-4", "gpt-4.1-nano"]);
    }

    #[tokio::test]
    #[serial]
    async fn it_lists_nothing_enabled_once_everything_is_disabled() {
        let (app, _dir) = test_app().await;

        for model_type in ["text", "multimodal", "reasoning"] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/user-models/bulk",
                    Some(TEST_USER),
                    json!({ "action": "disable", "modelType": model_type }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(get_request("/api/user-models?enabled=true", Some(TEST_USER)))
            .await
            .unwrap();
        let body = body_to_json(response.into_body()).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn it_enables_recommended_models() {
        let (app, _dir) = test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/user-models/bulk",
                Some(TEST_USER),
                json!({ "action": "recommended" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_to_json(response.into_body()).await;
        // gpt-4 only has one capability and isn't fast
        assert_eq!(body["updated"], 4);
    }

    #[tokio::test]
    #[serial]
    async fn it_rejects_invalid_bulk_requests() {
        let (app, _dir) = test_app().await;

        for payload in [
            json!({ "action": "explode" }),
            json!({ "action": "enable" }),
            json!({ "action": "enable", "modelIds": ["does-not-exist"] }),
            json!({}),
        ] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/user-models/bulk",
                    Some(TEST_USER),
                    payload,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
