//! # Exchange Flows
//!
//! Full command/callback cycles through the correlator: the outbound URL
//! reaches a simulated Bear, which answers over real HTTP on the
//! exchange's ephemeral endpoint.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use bear_xcallback::{Action, CommandCorrelator, CommandRequest, ErrorKind};

    use crate::integration::fixtures::{
        callback_port, port_is_free, query_param, test_config, Behaviour, FakeBear,
    };

    fn correlator(bear: &Arc<FakeBear>, timeout: Duration) -> CommandCorrelator {
        CommandCorrelator::new(test_config(timeout), bear.clone()).unwrap()
    }

    // =============================================================================
    // RESOLVED
    // =============================================================================

    #[tokio::test]
    async fn test_create_resolves_with_bear_payload() {
        let bear = FakeBear::new(Behaviour::Succeed(
            "identifier=abc-123&title=Meeting%20Notes".into(),
        ));
        let correlator = correlator(&bear, Duration::from_secs(5));

        let request = CommandRequest::new(Action::Create)
            .with("title", "Meeting Notes")
            .with("text", "# Hello");
        let payload = correlator.execute(request).await.unwrap();

        assert_eq!(payload.identifier().as_deref(), Some("abc-123"));
        assert_eq!(payload.title().as_deref(), Some("Meeting Notes"));
        assert_eq!(payload.len(), 2);

        let url = bear.last_invocation();
        assert_eq!(url.as_str().split('?').next(), Some("bear://x-callback-url/create"));
        assert_eq!(query_param(&url, "text").as_deref(), Some("# Hello"));
        assert!(!url.query().unwrap().contains('+'));
    }

    #[tokio::test]
    async fn test_json_values_are_decoded() {
        let bear = FakeBear::new(Behaviour::Succeed(
            "tags=%5B%7B%22name%22%3A%22work%22%7D%2C%7B%22name%22%3A%22home%22%7D%5D".into(),
        ));
        let correlator = correlator(&bear, Duration::from_secs(5));

        let payload = correlator
            .execute(CommandRequest::new(Action::Tags))
            .await
            .unwrap();
        let tags = payload.tags().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "work");
    }

    #[tokio::test]
    async fn test_callback_shortly_before_deadline_resolves() {
        let bear = FakeBear::delayed(
            Behaviour::Succeed("identifier=just-in-time".into()),
            Duration::from_millis(600),
        );
        let correlator = correlator(&bear, Duration::from_millis(1500));

        let payload = correlator
            .execute(CommandRequest::new(Action::Create))
            .await
            .unwrap();
        assert_eq!(payload.identifier().as_deref(), Some("just-in-time"));
        assert_eq!(correlator.stats().snapshot().timeouts, 0);
    }

    // =============================================================================
    // REJECTED
    // =============================================================================

    #[tokio::test]
    async fn test_no_callback_times_out_and_releases_port() {
        let bear = FakeBear::new(Behaviour::Silent);
        let correlator = correlator(&bear, Duration::from_millis(200));

        let started = Instant::now();
        let err = correlator
            .execute(CommandRequest::new(Action::Create).with("title", "Meeting Notes"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_retryable());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(port_is_free(callback_port(&bear.last_invocation())));
    }

    #[tokio::test]
    async fn test_error_callback_carries_bear_error() {
        let bear = FakeBear::new(Behaviour::Fail(
            "errorCode=3&errorMessage=Note%20not%20found".into(),
        ));
        let correlator = correlator(&bear, Duration::from_secs(5));

        let err = correlator
            .execute(CommandRequest::new(Action::OpenNote).with("id", "missing"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Callback);
        assert!(!err.is_retryable());
        let payload = err.callback_payload().unwrap();
        assert_eq!(payload.error_code().as_deref(), Some("3"));
        assert_eq!(payload.error_message().as_deref(), Some("Note not found"));
        assert_eq!(correlator.stats().snapshot().callback_errors, 1);
    }

    #[tokio::test]
    async fn test_launch_failure_surfaces_before_deadline() {
        let bear = FakeBear::new(Behaviour::LaunchFails);
        let correlator = correlator(&bear, Duration::from_secs(30));

        let started = Instant::now();
        let err = correlator
            .execute(CommandRequest::new(Action::Tags))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(port_is_free(callback_port(&bear.last_invocation())));
    }

    #[tokio::test]
    async fn test_cancellation_closes_listener() {
        let bear = FakeBear::new(Behaviour::Silent);
        let correlator = correlator(&bear, Duration::from_secs(30));

        let err = correlator
            .execute_with_cancel(
                CommandRequest::new(Action::Search).with("term", "rust"),
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(port_is_free(callback_port(&bear.last_invocation())));
        assert_eq!(correlator.stats().snapshot().in_flight, 0);
    }

    #[tokio::test]
    async fn test_validation_failure_never_dispatches() {
        let bear = FakeBear::new(Behaviour::Silent);
        let correlator = correlator(&bear, Duration::from_secs(5));

        let err = correlator
            .execute(CommandRequest::new(Action::Create).with("pin", "maybe"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(bear.invocations().is_empty());
        assert_eq!(correlator.stats().snapshot().listeners_opened, 0);
    }

    // =============================================================================
    // SINGLE SHOT
    // =============================================================================

    #[tokio::test]
    async fn test_stray_request_does_not_settle_exchange() {
        let bear = FakeBear::new(Behaviour::StrayThenSucceed("identifier=real".into()));
        let correlator = correlator(&bear, Duration::from_secs(5));

        let payload = correlator
            .execute(CommandRequest::new(Action::Create))
            .await
            .unwrap();

        assert_eq!(payload.identifier().as_deref(), Some("real"));
        assert_eq!(bear.responses().first(), Some(&404));
    }

    #[tokio::test]
    async fn test_duplicate_callback_is_ignored() {
        let bear = FakeBear::new(Behaviour::SucceedTwice(
            "identifier=first".into(),
            "identifier=second".into(),
        ));
        let correlator = correlator(&bear, Duration::from_secs(5));

        let payload = correlator
            .execute(CommandRequest::new(Action::Create))
            .await
            .unwrap();
        assert_eq!(payload.identifier().as_deref(), Some("first"));

        // Give the second call time to land (or be refused).
        tokio::time::sleep(Duration::from_millis(300)).await;
        let ok_count = bear.responses().iter().filter(|s| **s == 200).count();
        assert_eq!(ok_count, 1);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_exchanges_get_their_own_payload() {
        let bear = FakeBear::new(Behaviour::EchoTerm);
        let correlator = correlator(&bear, Duration::from_secs(5));

        let terms = ["alpha", "beta", "gamma", "delta"];
        let results = futures::future::join_all(terms.iter().map(|term| {
            correlator.execute(CommandRequest::new(Action::Search).with("term", *term))
        }))
        .await;

        for (term, result) in terms.iter().zip(results) {
            let notes = result.unwrap().notes().unwrap();
            assert_eq!(notes.len(), 1);
            assert_eq!(notes[0].identifier, *term);
        }

        let ports: std::collections::HashSet<u16> =
            bear.invocations().iter().map(callback_port).collect();
        assert_eq!(ports.len(), terms.len());
        assert_eq!(correlator.stats().snapshot().resolved, terms.len() as u64);
    }
}
