//! # Façade Flows
//!
//! Typed operations and name-based dispatch through [`BearClient`], with
//! token handling and the runtime's JSON rendering.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bear_xcallback::{
        AddTextParams, BearClient, BridgeError, CreateNoteParams, ErrorKind, GrabUrlParams,
        OpenNoteParams, SearchParams, ValidationError,
    };
    use bridge_runtime::render;
    use serde_json::json;

    use crate::integration::fixtures::{query_param, test_config, Behaviour, FakeBear};

    fn client(bear: &Arc<FakeBear>, token: Option<&str>) -> BearClient {
        let mut config = test_config(Duration::from_secs(5));
        config.auth.token = token.map(str::to_string);
        BearClient::new(config, bear.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_create_note_round_trip() {
        let bear = FakeBear::new(Behaviour::Succeed(
            "identifier=abc-123&title=Meeting%20Notes".into(),
        ));
        let client = client(&bear, Some("TOKEN"));

        let payload = client
            .create_note(CreateNoteParams {
                title: Some("Meeting Notes".into()),
                text: Some("# Hello".into()),
                tags: Some(vec!["work".into(), " urgent ".into()]),
                pin: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payload.identifier().as_deref(), Some("abc-123"));

        let url = bear.last_invocation();
        assert_eq!(query_param(&url, "tags").as_deref(), Some("work,urgent"));
        assert_eq!(query_param(&url, "pin").as_deref(), Some("yes"));
        assert_eq!(query_param(&url, "token"), None);
    }

    #[tokio::test]
    async fn test_grab_url_empty_url_opens_nothing() {
        let bear = FakeBear::new(Behaviour::Silent);
        let client = client(&bear, None);

        let err = client
            .grab_url(GrabUrlParams {
                url: "   ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(bear.invocations().is_empty());
        assert_eq!(client.correlator().stats().snapshot().listeners_opened, 0);
    }

    #[tokio::test]
    async fn test_selected_note_requires_token() {
        let bear = FakeBear::new(Behaviour::Succeed("note=%23%20Draft".into()));

        let err = client(&bear, None)
            .open_note(OpenNoteParams {
                selected: Some(true),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Validation(ValidationError::MissingToken { .. })
        ));
        assert!(bear.invocations().is_empty());

        let payload = client(&bear, None)
            .open_note(OpenNoteParams {
                selected: Some(true),
                token: Some("PER-CALL".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payload.note_text().as_deref(), Some("# Draft"));
        assert_eq!(
            query_param(&bear.last_invocation(), "token").as_deref(),
            Some("PER-CALL")
        );
    }

    #[tokio::test]
    async fn test_search_injects_configured_token() {
        let bear = FakeBear::new(Behaviour::EchoTerm);
        let client = client(&bear, Some("CONFIGURED"));

        let payload = client
            .search(SearchParams {
                term: Some("rust".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payload.notes().unwrap()[0].identifier, "rust");
        assert_eq!(
            query_param(&bear.last_invocation(), "token").as_deref(),
            Some("CONFIGURED")
        );
    }

    #[tokio::test]
    async fn test_replace_text_sets_mode() {
        let bear = FakeBear::new(Behaviour::Succeed("identifier=N1".into()));
        let client = client(&bear, None);

        client
            .replace_text(AddTextParams {
                id: Some("N1".into()),
                text: "new body".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let url = bear.last_invocation();
        assert_eq!(query_param(&url, "mode").as_deref(), Some("replace"));
        assert!(url.query().unwrap().contains("text=new%20body"));
    }

    #[tokio::test]
    async fn test_dispatch_and_render() {
        let bear = FakeBear::new(Behaviour::Succeed("identifier=abc-123".into()));
        let client = client(&bear, None);

        let result = client
            .dispatch("create_note", json!({"title": "From JSON"}))
            .await;
        let rendered = render(&result);
        assert!(rendered.success);
        assert_eq!(rendered.body, json!({"identifier": "abc-123"}));

        let result = client.dispatch("trash_note", json!({})).await;
        let rendered = render(&result);
        assert!(!rendered.success);
        assert_eq!(rendered.body["kind"], "validation");
        assert_eq!(bear.invocations().len(), 1);
    }

    #[tokio::test]
    async fn test_error_callback_renders_data() {
        let bear = FakeBear::new(Behaviour::Fail(
            "errorCode=1&errorMessage=Tag%20not%20found".into(),
        ));
        let client = client(&bear, None);

        let result = client
            .dispatch("delete_tag", json!({"name": "ghost"}))
            .await;
        let rendered = render(&result);
        assert!(!rendered.success);
        assert_eq!(rendered.body["kind"], "callback");
        assert_eq!(rendered.body["code"], -32015);
        assert_eq!(rendered.body["data"]["errorMessage"], "Tag not found");
    }
}
