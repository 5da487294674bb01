//! End-to-end runs of the tool-calling loop against the scripted mock LLM
//! and in-process tool providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use toolchat_core::chat::{ChatContext, ChatError, OrchestratorOptions, TurnState};
use toolchat_core::config::{ChatConfig, ServerConfig};
use toolchat_core::logging::{LogLevel, Logger, MemoryLogger, NoOpLogger};
use toolchat_core::providers::{MockProvider, MockStep, ProviderModelConfig};
use toolchat_core::tools::{FnTool, LocalToolProvider, ToolError};
use toolchat_core::types::{CompletionResponse, MessageRole, ToolCallRequest, ToolDescriptor};

fn paper_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "topic": { "type": "string" },
            "max_results": { "type": "integer" }
        },
        "required": ["topic"]
    })
}

fn research_provider(searches: Arc<AtomicUsize>) -> LocalToolProvider {
    let search = FnTool::sync(
        ToolDescriptor::new("search_papers", "Search arXiv for papers on a topic").with_schema(paper_schema()),
        move |args: Map<String, Value>| {
            searches.fetch_add(1, Ordering::SeqCst);
            let max = args.get("max_results").and_then(|v| v.as_u64()).unwrap_or(5);
            let ids: Vec<Value> = (1..=max).map(|i| json!(format!("2401.0000{}", i))).collect();
            Ok(Value::Array(ids))
        },
    );
    let extract = FnTool::sync(
        ToolDescriptor::new("extract_info", "Look up a stored paper"),
        |args: Map<String, Value>| {
            let id = args.get("paper_id").and_then(|v| v.as_str()).unwrap_or_default();
            if id.is_empty() {
                return Err("paper_id is required".into());
            }
            Ok(json!({ "id": id, "title": "Diffusion models" }))
        },
    );
    LocalToolProvider::new().with_tool(search).with_tool(extract)
}

struct Harness {
    mock: Arc<MockProvider>,
    context: ChatContext,
    searches: Arc<AtomicUsize>,
}

async fn harness(steps: Vec<MockStep>, logger: Arc<dyn Logger>) -> Harness {
    let mock = Arc::new(MockProvider::scripted(steps, logger.clone()));
    let context = ChatContext::with_provider(
        ChatConfig::default(),
        mock.clone(),
        ProviderModelConfig::new("mock-model"),
        logger,
    );
    let searches = Arc::new(AtomicUsize::new(0));
    context
        .attach_provider("research", Box::new(research_provider(searches.clone())))
        .await
        .unwrap();
    Harness { mock, context, searches }
}

fn call(id: &str, tool: &str, args: Value) -> ToolCallRequest {
    ToolCallRequest::from_value(id, tool, &args)
}

fn tool_turn(calls: Vec<ToolCallRequest>) -> MockStep {
    MockStep::Reply(CompletionResponse::with_tool_calls("", calls))
}

fn answer(text: &str) -> MockStep {
    MockStep::Reply(CompletionResponse::text(text))
}

#[tokio::test]
async fn searches_two_papers_and_answers() {
    let h = harness(
        vec![
            tool_turn(vec![call("call_1", "search_papers", json!({"topic": "diffusion", "max_results": 2}))]),
            answer("Found 2401.00001 and 2401.00002."),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();

    let reply = chat.process_query("search for 2 papers on diffusion").await.unwrap();
    assert_eq!(reply, "Found 2401.00001 and 2401.00002.");
    assert_eq!(chat.state(), TurnState::FinalResponseReady);
    assert_eq!(h.mock.request_count(), 2);

    let second = &h.mock.requests()[1];
    let tool_message = second.messages.last().unwrap();
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_message.content, "2401.00001, 2401.00002");

    let offered: Vec<_> = second.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(offered, ["search_papers", "extract_info"]);
}

#[tokio::test]
async fn tool_results_follow_call_order() {
    let h = harness(
        vec![
            tool_turn(vec![
                call("a", "extract_info", json!({"paper_id": "2401.00001"})),
                call("b", "search_papers", json!({"topic": "x", "max_results": 1})),
                call("c", "extract_info", json!({"paper_id": "2401.00002"})),
            ]),
            answer("done"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();
    chat.process_query("go").await.unwrap();

    let messages = chat.transcript().messages();
    let assistant = &messages[1];
    assert_eq!(assistant.tool_calls.len(), 3);

    let ids: Vec<_> = messages[2..5]
        .iter()
        .map(|m| {
            assert_eq!(m.role, MessageRole::Tool);
            m.tool_call_id.clone().unwrap()
        })
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert!(messages[2].content.contains("2401.00001"));
    assert_eq!(messages[3].content, "2401.00001");
    assert_eq!(messages[5].role, MessageRole::Assistant);
}

#[tokio::test]
async fn deterministic_tool_gives_identical_text() {
    let args = json!({"topic": "x", "max_results": 3});
    let h = harness(
        vec![
            tool_turn(vec![call("1", "search_papers", args.clone()), call("2", "search_papers", args)]),
            answer("same"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();
    chat.process_query("twice").await.unwrap();

    let messages = chat.transcript().messages();
    assert_eq!(messages[2].content, messages[3].content);
    assert_eq!(h.searches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_tool_is_reported_to_the_llm() {
    let h = harness(
        vec![tool_turn(vec![call("x", "delete_everything", json!({}))]), answer("sorry")],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();

    assert_eq!(chat.process_query("please").await.unwrap(), "sorry");
    let result = &chat.transcript().messages()[2];
    assert_eq!(result.tool_call_id.as_deref(), Some("x"));
    assert!(result.content.contains("unknown"));
}

#[tokio::test]
async fn malformed_arguments_do_not_stop_the_loop() {
    let h = harness(
        vec![
            tool_turn(vec![
                ToolCallRequest::new("bad", "search_papers", "{not json"),
                ToolCallRequest::new("list", "search_papers", "[1, 2]"),
                call("good", "search_papers", json!({"topic": "x", "max_results": 1})),
            ]),
            answer("recovered"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();

    assert_eq!(chat.process_query("try").await.unwrap(), "recovered");
    let messages = chat.transcript().messages();
    assert!(messages[2].content.starts_with("Error:"));
    assert!(messages[2].content.contains("malformed"));
    assert!(messages[3].content.contains("malformed"));
    assert_eq!(messages[4].content, "2401.00001");
    // only the well-formed call reached the tool
    assert_eq!(h.searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_provider_tool_does_not_end_the_turn() {
    let h = harness(
        vec![
            tool_turn(vec![call("p", "boom", json!({}))]),
            tool_turn(vec![call("s", "search_papers", json!({"topic": "x", "max_results": 1}))]),
            answer("recovered"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let volatile = LocalToolProvider::new().with_tool(FnTool::sync(ToolDescriptor::new("boom", "Unstable"), |_| {
        panic!("kaboom")
    }));
    h.context.attach_provider("volatile", Box::new(volatile)).await.unwrap();
    let mut chat = h.context.orchestrator();

    assert_eq!(chat.process_query("go").await.unwrap(), "recovered");
    let messages = chat.transcript().messages();
    assert_eq!(messages[2].tool_call_id.as_deref(), Some("p"));
    assert!(messages[2].content.starts_with("Error:"));
    assert!(messages[2].content.contains("kaboom"));
    assert_eq!(messages[4].content, "2401.00001");
    assert_eq!(chat.state(), TurnState::FinalResponseReady);
}

#[tokio::test]
async fn blank_arguments_mean_no_arguments() {
    let h = harness(
        vec![
            tool_turn(vec![ToolCallRequest::new("e", "extract_info", "  ")]),
            answer("ok"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();
    chat.process_query("nothing").await.unwrap();

    // the tool ran and reported its own failure
    let result = &chat.transcript().messages()[2].content;
    assert!(result.contains("paper_id is required"));
    assert!(!result.contains("malformed"));
}

#[tokio::test]
async fn duplicate_tool_across_providers_is_rejected() {
    let logger = Arc::new(MemoryLogger::new());
    let h = harness(vec![], logger.clone()).await;

    let other = LocalToolProvider::new().with_tool(FnTool::sync(
        ToolDescriptor::new("search_papers", "A second search"),
        |_| Ok(json!("other")),
    ));
    let err = h.context.attach_provider("mirror", Box::new(other)).await.unwrap_err();

    assert!(matches!(err, ToolError::DuplicateToolName { ref name, .. } if name == "search_papers"));
    assert_eq!(h.context.registry().provider_of("search_papers").as_deref(), Some("research"));
    assert!(!h.context.multiplexer().provider_names().contains(&"mirror".to_string()));
    assert!(logger.contains(LogLevel::Error, "search_papers"));
}

#[tokio::test]
async fn unreachable_provider_fails_alone() {
    let h = harness(
        vec![
            tool_turn(vec![call("s", "search_papers", json!({"topic": "x", "max_results": 1}))]),
            answer("still working"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;

    let broken = ServerConfig::stdio("/nonexistent/toolchat-missing-server", Vec::<String>::new());
    let err = h.context.multiplexer().connect("broken", &broken).await.unwrap_err();
    assert!(matches!(err, ToolError::ProviderConnectionFailure { .. }));
    assert_eq!(h.context.multiplexer().provider_names(), ["research"]);

    let mut chat = h.context.orchestrator();
    assert_eq!(chat.process_query("search").await.unwrap(), "still working");
    assert_eq!(chat.transcript().messages()[2].content, "2401.00001");
}

#[tokio::test]
async fn endless_tool_requests_are_abandoned() {
    let steps = (0..5)
        .map(|i| tool_turn(vec![call(&format!("c{}", i), "search_papers", json!({"topic": "x"}))]))
        .collect();
    let h = harness(steps, Arc::new(NoOpLogger)).await;
    let mut chat = h
        .context
        .orchestrator()
        .with_options(OrchestratorOptions::default().with_max_iterations(3));

    let err = chat.process_query("loop").await.unwrap_err();
    assert!(matches!(err, ChatError::ConversationAbandoned { iterations: 3 }));
    assert_eq!(h.mock.request_count(), 3);
    assert!(chat.transcript().is_empty());
    assert_eq!(chat.state(), TurnState::AwaitingUserInput);
}

#[tokio::test]
async fn failed_turn_keeps_earlier_history() {
    let h = harness(
        vec![
            answer("hello"),
            tool_turn(vec![call("s", "search_papers", json!({"topic": "x"}))]),
            MockStep::Fail("upstream 503".into()),
            answer("back again"),
        ],
        Arc::new(NoOpLogger),
    )
    .await;
    let mut chat = h.context.orchestrator();

    chat.process_query("hi").await.unwrap();
    let err = chat.process_query("search").await.unwrap_err();
    assert!(matches!(err, ChatError::LlmRequestFailure(_)));
    assert_eq!(chat.transcript().len(), 2);

    assert_eq!(chat.process_query("again").await.unwrap(), "back again");
    let last_request = h.mock.requests().pop().unwrap();
    let contents: Vec<_> = last_request.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hi", "hello", "again"]);
}

#[tokio::test]
async fn shutdown_closes_providers() {
    let h = harness(vec![], Arc::new(NoOpLogger)).await;
    h.context.shutdown().await;
    assert!(h.context.multiplexer().provider_names().is_empty());
    // a second shutdown has nothing left to close
    h.context.shutdown().await;
}
