//! Integration tests for ModelClient against a mock server

use llamadeck_client::{
    CancellationToken, ChatObserver, ChatTranscriptEntry, ClientError, ConversationHistory,
    Endpoint, ErrorKind, ModelClient, ModelSize, PullPhase, PullProgress,
};
use mockito::Matcher;
use serde_json::json;

fn client_for(server: &mockito::Server) -> ModelClient {
    ModelClient::new(Endpoint::resolve(&server.url(), "11434")).unwrap()
}

const PULL_STREAM: &str = concat!(
    "{\"status\":\"pulling manifest\"}\n",
    "{\"status\":\"pulling d1\",\"digest\":\"d1\",\"completed\":50,\"total\":100}\n",
    "{\"status\":\"pulling d1\",\"digest\":\"d1\",\"completed\":100,\"total\":100}\n",
    "{\"status\":\"verifying sha256 digest\"}\n",
    "{\"status\":\"writing manifest\"}\n",
    "{\"status\":\"removing unused layers\"}\n",
    "{\"status\":\"success\"}\n",
);

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_client_creation() {
    let client = ModelClient::from_input("localhost", "11434").unwrap();
    assert_eq!(client.base_url(), "http://localhost:11434");
}

#[test]
fn test_client_creation_empty_host() {
    let result = ModelClient::from_input("", "11434");
    match result {
        Err(ClientError::ConfigError(msg)) => assert!(msg.contains("host is required")),
        _ => panic!("Expected ConfigError"),
    }
}

#[test]
fn test_client_default_endpoint() {
    let client = ModelClient::with_default_endpoint().unwrap();
    assert_eq!(client.base_url(), "http://localhost:11434");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_models_sorted_case_insensitive() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"models":[{"name":"b"},{"name":"Charlie"},{"name":"a"}]}"#)
        .create_async()
        .await;

    let models = client_for(&server).list_models().await.unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "Charlie"]);
}

#[tokio::test]
async fn test_list_models_coerces_fields() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(
            r#"{"models":[
                {"name":"mistral:latest","size":4096000,"modified_at":"2024-01-02T03:04:05Z"},
                {"name":"odd","size":"big","modified_at":"yesterday"},
                {"size":1}
            ]}"#,
        )
        .create_async()
        .await;

    let models = client_for(&server).list_models().await.unwrap();
    assert_eq!(models.len(), 2);

    let mistral = &models[0];
    assert_eq!(mistral.size, ModelSize::Bytes(4096000));
    assert_eq!(mistral.size.display_kb(), "4,000kB");
    assert_eq!(mistral.modified_at.display(), "2024/01/02 03:04");

    let odd = &models[1];
    assert_eq!(odd.size, ModelSize::Unknown);
    assert_eq!(odd.size.display_kb(), "N/A");
    assert_eq!(odd.modified_at.display(), "yesterday");
}

#[tokio::test]
async fn test_list_models_empty() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;

    let models = client_for(&server).list_models().await.unwrap();
    assert!(models.is_empty());
}

#[tokio::test]
async fn test_list_models_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let err = client_for(&server).list_models().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_list_models_server_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/tags")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let err = client_for(&server).list_models().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteOperationFailed);
}

#[tokio::test]
async fn test_list_models_unreachable() {
    // Port 1 is reserved and not expected to accept connections
    let client = ModelClient::from_input("127.0.0.1", "1").unwrap();
    let err = client.list_models().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndpointUnreachable);
}

// ============================================================================
// Delete / verify / version
// ============================================================================

#[tokio::test]
async fn test_delete_model_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/api/delete")
        .match_body(Matcher::Json(json!({ "name": "mistral" })))
        .with_status(200)
        .create_async()
        .await;

    client_for(&server).delete_model("mistral").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_model_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/api/delete")
        .with_status(404)
        .with_body(r#"{"error":"model 'ghost' not found"}"#)
        .create_async()
        .await;

    let err = client_for(&server).delete_model("ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteOperationFailed);
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_delete_model_network_failure() {
    let client = ModelClient::from_input("127.0.0.1", "1").unwrap();
    let err = client.delete_model("mistral").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteOperationFailed);
}

#[tokio::test]
async fn test_delete_model_empty_name() {
    let client = ModelClient::with_default_endpoint().unwrap();
    match client.delete_model("  ").await {
        Err(ClientError::InvalidModelName(msg)) => assert!(msg.contains("cannot be empty")),
        _ => panic!("Expected InvalidModelName error"),
    }
}

#[tokio::test]
async fn test_verify_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/show")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let err = client_for(&server).verify("ghost").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);
}

#[tokio::test]
async fn test_get_version() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/version")
        .with_status(200)
        .with_body(r#"{"version":"0.5.7","build":"abc"}"#)
        .create_async()
        .await;

    let info = client_for(&server).get_version().await.unwrap();
    assert_eq!(info.version, "0.5.7");
    assert_eq!(info.raw["build"], "abc");
}

#[tokio::test]
async fn test_get_version_missing_field() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/version")
        .with_status(200)
        .with_body(r#"{}"#)
        .create_async()
        .await;

    let info = client_for(&server).get_version().await.unwrap();
    assert_eq!(info.version, "Unknown");
}

// ============================================================================
// Pull
// ============================================================================

#[tokio::test]
async fn test_pull_rejects_existing_model() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[{"name":"mistral:latest"}]}"#)
        .create_async()
        .await;
    let pull = server
        .mock("POST", "/api/pull")
        .expect(0)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut observer = |_: &PullProgress| {};
    let err = client_for(&server)
        .pull_model("mistral:latest", &cancel, &mut observer)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ModelAlreadyExists);
    pull.assert_async().await;
}

#[tokio::test]
async fn test_pull_existing_check_is_case_sensitive() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[{"name":"Mistral"}]}"#)
        .create_async()
        .await;
    let pull = server
        .mock("POST", "/api/pull")
        .match_body(Matcher::Json(json!({ "name": "mistral", "insecure": true })))
        .with_status(200)
        .with_body(PULL_STREAM)
        .create_async()
        .await;
    let _show = server
        .mock("POST", "/api/show")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut observer = |_: &PullProgress| {};
    client_for(&server)
        .pull_model("mistral", &cancel, &mut observer)
        .await
        .unwrap();
    pull.assert_async().await;
}

#[tokio::test]
async fn test_pull_reports_progress_sequence() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;
    let _pull = server
        .mock("POST", "/api/pull")
        .with_status(200)
        .with_body(PULL_STREAM)
        .create_async()
        .await;
    let _show = server
        .mock("POST", "/api/show")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut seen: Vec<PullProgress> = Vec::new();
    let mut observer = |p: &PullProgress| seen.push(*p);
    let outcome = client_for(&server)
        .pull_model("tinyllama", &cancel, &mut observer)
        .await
        .unwrap();

    let percents: Vec<f64> = seen.iter().map(|p| p.percent).collect();
    assert_eq!(percents, vec![0.0, 50.0, 95.0, 96.0, 97.0, 98.0, 100.0]);
    assert_eq!(seen.last().unwrap().phase, PullPhase::Complete);
    assert_eq!(outcome.downloaded_bytes, 100);
    assert_eq!(outcome.total_bytes, 100);
    assert_eq!(outcome.layers, 1);
}

#[tokio::test]
async fn test_pull_incomplete_despite_success() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;
    let _pull = server
        .mock("POST", "/api/pull")
        .with_status(200)
        .with_body(concat!(
            "{\"status\":\"pulling d1\",\"digest\":\"d1\",\"completed\":50,\"total\":100}\n",
            "{\"status\":\"success\"}\n",
        ))
        .create_async()
        .await;
    let _show = server
        .mock("POST", "/api/show")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut observer = |_: &PullProgress| {};
    let err = client_for(&server)
        .pull_model("tinyllama", &cancel, &mut observer)
        .await
        .unwrap_err();

    match err {
        ClientError::IncompleteTransfer { downloaded, total } => {
            assert_eq!(downloaded, 50);
            assert_eq!(total, 100);
        }
        other => panic!("Expected IncompleteTransfer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_pull_verification_failure() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;
    let _pull = server
        .mock("POST", "/api/pull")
        .with_status(200)
        .with_body(PULL_STREAM)
        .create_async()
        .await;
    let _show = server
        .mock("POST", "/api/show")
        .with_status(500)
        .with_body("missing")
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut observer = |_: &PullProgress| {};
    let err = client_for(&server)
        .pull_model("tinyllama", &cancel, &mut observer)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);
}

#[tokio::test]
async fn test_pull_in_band_error() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;
    let _pull = server
        .mock("POST", "/api/pull")
        .with_status(200)
        .with_body("{\"status\":\"pulling manifest\"}\n{\"error\":\"pull model manifest: file does not exist\"}\n")
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut observer = |_: &PullProgress| {};
    let err = client_for(&server)
        .pull_model("nope", &cancel, &mut observer)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RemoteOperationFailed);
    assert!(err.to_string().contains("file does not exist"));
}

#[tokio::test]
async fn test_pull_cancelled_before_reading() {
    let mut server = mockito::Server::new_async().await;
    let _tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[]}"#)
        .create_async()
        .await;
    let _pull = server
        .mock("POST", "/api/pull")
        .with_status(200)
        .with_body(PULL_STREAM)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let client = client_for(&server);
    let mut events = client.pull_start("tinyllama", &cancel).await.unwrap();
    cancel.cancel();

    let err = events.next_event().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

// ============================================================================
// Generate
// ============================================================================

#[tokio::test]
async fn test_generate_accumulates_fragments() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::Json(json!({
            "model": "mistral",
            "prompt": "Say hello",
            "stream": true
        })))
        .with_status(200)
        .with_body(concat!(
            "{\"response\":\"Hel\",\"done\":false}\n",
            "{\"response\":\"lo\",\"done\":false}\n",
            "not json at all\n",
            "{\"response\":\" world\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}\n",
        ))
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut history = ConversationHistory::new();
    let mut fragments: Vec<String> = Vec::new();
    let mut observer = |f: &str| fragments.push(f.to_string());

    let entry = client_for(&server)
        .generate("mistral", "Say hello", &mut history, &cancel, &mut observer)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(fragments, vec!["Hel", "lo", " world"]);
    assert_eq!(entry.ai_text, "Hello world");
    assert_eq!(entry.user_text, "Say hello");
    assert_eq!(history.len(), 1);
    assert_eq!(history.last(), Some(&entry));
}

#[tokio::test]
async fn test_generate_observer_sees_single_completion() {
    #[derive(Default)]
    struct Recorder {
        fragments: Vec<String>,
        completions: Vec<ChatTranscriptEntry>,
    }

    impl ChatObserver for Recorder {
        fn on_fragment(&mut self, fragment: &str) {
            self.fragments.push(fragment.to_string());
        }

        fn on_complete(&mut self, entry: &ChatTranscriptEntry) {
            self.completions.push(entry.clone());
        }
    }

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({ "model": "mistral" })))
        .with_status(200)
        .with_body(concat!(
            "{\"response\":\"a\",\"done\":false}\n",
            "{\"response\":\"b\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}\n",
        ))
        .expect(1)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut history = ConversationHistory::new();
    let mut recorder = Recorder::default();

    let entry = client_for(&server)
        .generate("mistral", "q", &mut history, &cancel, &mut recorder)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(recorder.fragments, vec!["a", "b"]);
    assert_eq!(recorder.completions.len(), 1);
    assert_eq!(recorder.completions[0], entry);
    assert_eq!(entry.user_text, "q");
    assert_eq!(entry.ai_text, "ab");
    assert_eq!(history.last(), Some(&entry));
}

#[tokio::test]
async fn test_generate_empty_stream() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut history = ConversationHistory::new();
    let mut observer = |_: &str| {};
    let entry = client_for(&server)
        .generate("mistral", "hi", &mut history, &cancel, &mut observer)
        .await
        .unwrap();

    assert_eq!(entry.ai_text, "");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_generate_unknown_model() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/generate")
        .with_status(404)
        .with_body(r#"{"error":"model 'ghost' not found"}"#)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let mut history = ConversationHistory::new();
    let mut observer = |_: &str| {};
    let err = client_for(&server)
        .generate("ghost", "hi", &mut history, &cancel, &mut observer)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteOperationFailed);
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_generate_rejects_blank_prompt() {
    let client = ModelClient::with_default_endpoint().unwrap();
    let cancel = CancellationToken::new();
    let mut history = ConversationHistory::new();
    let mut observer = |_: &str| {};
    let err = client
        .generate("mistral", "   ", &mut history, &cancel, &mut observer)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::EmptyPrompt));
}
