//! End-to-end: configuration, MCP transport, chat-completions provider and
//! the tool-calling loop against one in-process server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use mcpagent_agent::{Agent, StreamEvent};
use mcpagent_config::AppConfig;
use mcpagent_core::Error;
use serde_json::{Value, json};

#[derive(Default)]
struct Counters {
    tool_calls: AtomicUsize,
    model_calls: AtomicUsize,
}

async fn mcp(
    State(counters): State<Arc<Counters>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let id = body["id"].clone();
    match body["method"].as_str().unwrap_or_default() {
        "initialize" => (
            [("mcp-session-id", "s-1")],
            axum::Json(json!({"jsonrpc": "2.0", "id": id, "result": {"protocolVersion": "2025-03-26", "capabilities": {}}})),
        )
            .into_response(),
        _ if headers.get("mcp-session-id").is_none() => StatusCode::BAD_REQUEST.into_response(),
        "notifications/initialized" => StatusCode::ACCEPTED.into_response(),
        "tools/list" => axum::Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {"tools": [{
                "name": "lookup",
                "description": "Current weather for a city",
                "inputSchema": {"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}
            }]}
        }))
        .into_response(),
        "tools/call" => {
            counters.tool_calls.fetch_add(1, Ordering::SeqCst);
            let city = body["params"]["arguments"]["city"].as_str().unwrap_or("?");
            let result = if city == "Rome" {
                json!({"content": [{"type": "text", "text": "22C"}]})
            } else {
                json!({"content": [{"type": "text", "text": format!("unknown city {city}")}], "isError": true})
            };
            axum::Json(json!({"jsonrpc": "2.0", "id": id, "result": result})).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn chat(State(counters): State<Arc<Counters>>, axum::Json(body): axum::Json<Value>) -> Response {
    counters.model_calls.fetch_add(1, Ordering::SeqCst);
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let question = messages
        .iter()
        .rev()
        .find(|m| m["role"] == "user")
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();
    let last = messages.last().cloned().unwrap_or_default();

    let message = if last["role"] == "tool" {
        let content = last["content"].as_str().unwrap_or_default();
        if content.contains("error") {
            json!({"role": "assistant", "content": "I could not find that city."})
        } else {
            json!({"role": "assistant", "content": format!("It is {content} in Rome.")})
        }
    } else if question == "hello" {
        json!({"role": "assistant", "content": "Hi there."})
    } else {
        let city = question.trim_start_matches("Weather in ").trim_end_matches('?');
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "lookup", "arguments": json!({"city": city}).to_string()}
            }]
        })
    };

    axum::Json(json!({
        "model": body["model"],
        "choices": [{"message": message}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
    }))
    .into_response()
}

async fn spawn_server(counters: Arc<Counters>) -> String {
    let app = Router::new()
        .route("/mcp", post(mcp).delete(|| async { StatusCode::OK }))
        .route("/v1/chat/completions", post(chat))
        .with_state(counters);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn config_for(base: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.mcp.url = format!("{base}/mcp");
    config.mcp.timeout_secs = 5;
    config.model.api_url = format!("{base}/v1");
    config.model.api_key = Some("sk-test".into());
    config.agent.tracing_enabled = true;
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn answers_through_real_transports() {
    let counters = Arc::new(Counters::default());
    let base = spawn_server(counters.clone()).await;
    let agent = Agent::from_config(&config_for(&base)).await.unwrap();

    assert_eq!(agent.tools()[0].name, "lookup");

    let result = agent.answer("Weather in Rome?", &[]).await.unwrap();
    assert_eq!(result.answer, "It is 22C in Rome.");
    assert_eq!(result.metadata.tool_params(), [json!({"city": "Rome"})]);
    assert_eq!(result.metadata.tool_results(), [json!("22C")]);
    assert_eq!(counters.tool_calls.load(Ordering::SeqCst), 1);
    assert_eq!(counters.model_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn plain_question_skips_tools() {
    let counters = Arc::new(Counters::default());
    let base = spawn_server(counters.clone()).await;
    let agent = Agent::from_config(&config_for(&base)).await.unwrap();

    let result = agent.answer("hello", &[]).await.unwrap();
    assert_eq!(result.answer, "Hi there.");
    assert!(result.metadata.is_empty());
    assert_eq!(counters.tool_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn streaming_reports_remote_tool_error() {
    let counters = Arc::new(Counters::default());
    let base = spawn_server(counters).await;
    let agent = Agent::from_config(&config_for(&base)).await.unwrap();

    let events = agent
        .answer_streaming("Weather in Atlantis?", &[])
        .collect()
        .await
        .unwrap();
    let types: Vec<_> = events.iter().map(StreamEvent::event_type).collect();
    assert_eq!(types, ["start", "tool_call", "tool_error", "final_answer"]);

    match events.last() {
        Some(StreamEvent::FinalAnswer { answer, metadata }) => {
            assert_eq!(answer, "I could not find that city.");
            assert!(metadata.is_failure(0));
        }
        other => panic!("expected FinalAnswer, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_fails_creation() {
    let mut config = AppConfig::default();
    config.mcp.url = "http://127.0.0.1:9/mcp".into();
    config.model.api_key = Some("sk-test".into());

    let err = Agent::from_config(&config).await.unwrap_err();
    assert!(matches!(err, Error::Initialization { stage: "discovery", .. }));
}
