//! End-to-end tests: full turns through the session loop and orchestrator
//! against a mock streaming endpoint.

use std::collections::HashMap;
use std::io::Cursor;

use gemchat::{Session, Settings, TurnOrchestrator, PROMPT_INSTRUCTION};

fn settings(base_url: &str) -> Settings {
    let mut map = HashMap::new();
    map.insert("key".to_string(), "test-key".to_string());
    map.insert("base_url".to_string(), base_url.to_string());
    Settings::from_map(&map).unwrap()
}

fn sse_record(text: &str) -> String {
    format!(
        "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":\"{text}\"}}],\"role\":\"model\"}}}}]}}\n\n"
    )
}

async fn mock_stream_endpoint(server: &wiremock::MockServer, body: String) {
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path_regex(
            r"/v1beta/models/.+:streamGenerateContent",
        ))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn run_session(server: &wiremock::MockServer, input: &str) -> String {
    let mut output = Vec::new();
    let orchestrator = TurnOrchestrator::new(&settings(&server.uri()));
    Session::new(Cursor::new(input.to_string()), &mut output, orchestrator)
        .run()
        .await
        .unwrap();
    String::from_utf8(output).unwrap()
}

#[tokio::test]
async fn test_streamed_turn_through_session() {
    let server = wiremock::MockServer::start().await;
    let body = format!(
        "{}{}{}",
        sse_record("Hello"),
        sse_record("world"),
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"!\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}],\"usageMetadata\":{\"promptTokenCount\":8,\"candidatesTokenCount\":3,\"totalTokenCount\":11}}\n\n"
    );
    mock_stream_endpoint(&server, body).await;

    let output = run_session(&server, "Hi there\nquit\n").await;
    assert_eq!(output, "you: answer: Hello world ! \nyou: answer: bye\n");

    // One request, carrying the prefixed prompt as a single user turn and
    // the expected query parameters.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert!(query.contains(&("alt".to_string(), "sse".to_string())));
    assert!(query.contains(&("key".to_string(), "test-key".to_string())));

    let body: serde_json::Value = requests[0].body_json().unwrap();
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(
        contents[0]["parts"][0]["text"],
        format!("{PROMPT_INSTRUCTION}Hi there")
    );
}

#[tokio::test]
async fn test_answer_is_folded_into_next_turn_context() {
    let server = wiremock::MockServer::start().await;
    mock_stream_endpoint(&server, sse_record("Paris")).await;

    let output = run_session(&server, "Capital of France?\nAnd its population?\nquit\n").await;
    assert!(output.contains("answer: Paris \n"), "output: {output}");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let second: serde_json::Value = requests[1].body_json().unwrap();
    let prompt = second["contents"][0]["parts"][0]["text"].as_str().unwrap();
    let expected = format!(
        "{PROMPT_INSTRUCTION}Capital of France?\nParis \n{PROMPT_INSTRUCTION}And its population?"
    );
    assert_eq!(prompt, expected);
}

#[tokio::test]
async fn test_quit_first_issues_no_request() {
    let server = wiremock::MockServer::start().await;
    mock_stream_endpoint(&server, sse_record("never sent")).await;

    let output = run_session(&server, "quit\n").await;
    assert_eq!(output, "you: answer: bye\n");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_quit_sentinel_is_case_sensitive() {
    let server = wiremock::MockServer::start().await;
    mock_stream_endpoint(&server, sse_record("forwarded")).await;

    let output = run_session(&server, "Quit\nquit\n").await;
    assert!(output.contains("answer: forwarded \n"), "output: {output}");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert_eq!(prompt, format!("{PROMPT_INSTRUCTION}Quit"));
}

#[tokio::test]
async fn test_http_404_reported_with_status_and_reason() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run_session(&server, "Hello\nquit\n").await;
    assert!(output.contains("error: 404 - Not Found"), "output: {output}");
}

#[tokio::test]
async fn test_failed_turn_keeps_prompt_in_context() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut orchestrator = TurnOrchestrator::new(&settings(&server.uri()));
    let err = orchestrator.run_turn("Hello").await.unwrap_err();
    assert_eq!(err.status_code, Some(404));
    assert_eq!(orchestrator.context().len(), 1);
    assert_eq!(
        orchestrator.context().render(),
        format!("{PROMPT_INSTRUCTION}Hello")
    );
}

#[tokio::test]
async fn test_successful_turn_appends_answer_as_new_entry() {
    let server = wiremock::MockServer::start().await;
    mock_stream_endpoint(&server, sse_record("All good")).await;

    let mut orchestrator = TurnOrchestrator::new(&settings(&server.uri()));
    let answer = orchestrator.run_turn("Status?").await.unwrap();
    assert_eq!(answer, "All good ");
    assert_eq!(orchestrator.context().len(), 2);
    assert_eq!(
        orchestrator.context().render(),
        format!("{PROMPT_INSTRUCTION}Status?\nAll good ")
    );
}

#[tokio::test]
async fn test_malformed_record_is_skipped_mid_stream() {
    let server = wiremock::MockServer::start().await;
    let body = format!(
        "{}data: {{this is not json\n\n{}",
        sse_record("Hello"),
        sse_record("world")
    );
    mock_stream_endpoint(&server, body).await;

    let mut orchestrator = TurnOrchestrator::new(&settings(&server.uri()));
    let answer = orchestrator.run_turn("Hi").await.unwrap();
    assert_eq!(answer, "Hello world ");
}

#[tokio::test]
async fn test_record_without_candidates_contributes_nothing() {
    let server = wiremock::MockServer::start().await;
    let body = format!(
        "{}data: {{\"candidates\":[]}}\n\n{}",
        sse_record("Hello"),
        sse_record("world")
    );
    mock_stream_endpoint(&server, body).await;

    let mut orchestrator = TurnOrchestrator::new(&settings(&server.uri()));
    let answer = orchestrator.run_turn("Hi").await.unwrap();
    assert_eq!(answer, "Hello world ");
}
