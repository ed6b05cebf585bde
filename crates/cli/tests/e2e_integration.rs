//! End-to-end integration tests for the TaskForge agent engine.
//!
//! These tests drive the public API from a task string to its outcome:
//! the ReAct loop against the real built-in tools, the planner and the
//! orchestrator with approval, and the config layer.

use std::sync::{Arc, Mutex};

use taskforge_agent::{
    Advance, FixedApprover, Orchestrator, ReactEngine, SensitivityGate, SpecialistTeam, dispatch,
};
use taskforge_core::agent::AgentConfig;
use taskforge_core::error::{Error, ProviderError};
use taskforge_core::event::{EventSink, StepEvent, StepPhase};
use taskforge_core::message::{Conversation, Message, Role};
use taskforge_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use taskforge_core::tool::ToolCall;
use taskforge_tools::{basic_registry, full_registry};
use tokio::time::Duration;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// the requests it saw.
struct ScriptedProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let n = requests.len();
        if n >= responses.len() {
            panic!("ScriptedProvider exhausted: call #{n}, have {}", responses.len());
        }
        requests.push(request);
        Ok(responses[n].clone())
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    }
}

fn tool_response(tool_calls: Vec<ToolCall>, thought: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls(thought, tool_calls),
        usage: None,
        model: "mock".into(),
    }
}

fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: args,
    }
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<StepEvent>) -> Vec<StepEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn react_engine(provider: Arc<ScriptedProvider>) -> ReactEngine {
    ReactEngine::new(
        provider,
        Arc::new(basic_registry(Duration::from_secs(5))),
        AgentConfig::new("mock"),
    )
}

// ── E2E: ReAct Pipeline ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_react_create_file_then_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let path_str = path.to_string_lossy().to_string();

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(
            vec![make_tool_call(
                "call_1",
                "write_file",
                serde_json::json!({"file_path": path_str, "content": "hello world"}),
            )],
            "I'll create the file.",
        ),
        text_response("The file is written. TASK COMPLETE"),
    ]));

    let (sink, mut rx) = EventSink::channel();
    let engine = react_engine(provider.clone()).with_events(sink);
    let outcome = engine
        .run(&format!("create file {path_str} with content hello world"))
        .await
        .expect("run should succeed");

    assert!(outcome.success);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");

    let events = drain(&mut rx);
    let acts: Vec<_> = events.iter().filter(|e| e.phase == StepPhase::Act).collect();
    assert_eq!(acts.len(), 1);
    assert_eq!(acts[0].data["tool"], "write_file");

    let observe = events
        .iter()
        .find(|e| e.phase == StepPhase::Observe)
        .expect("an observe event");
    assert_eq!(observe.data["result"]["action"], "created");
    assert_eq!(events.last().unwrap().phase, StepPhase::Complete);

    // Second model call sees the tool result answering call_1
    let second = provider.request(1);
    let tool_msg = second
        .messages
        .iter()
        .find(|m| m.role() == Role::Tool)
        .expect("tool message");
    assert!(matches!(tool_msg, Message::Tool { call_id, .. } if call_id == "call_1"));
}

#[tokio::test]
async fn e2e_react_unknown_tool_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("out");

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(
            vec![
                make_tool_call("a", "teleport", serde_json::json!({})),
                make_tool_call(
                    "b",
                    "create_folder",
                    serde_json::json!({"folder_path": folder.to_string_lossy()}),
                ),
            ],
            "",
        ),
        text_response("TASK COMPLETE"),
    ]));

    let engine = react_engine(provider.clone());
    let mut conversation = Conversation::seeded("system", "Task: make a folder");
    let outcome = engine.run_in(&mut conversation).await.unwrap();

    assert!(outcome.success);
    assert!(folder.is_dir());
    assert!(conversation.unresolved_calls().is_empty());

    let tool_messages: Vec<_> = conversation
        .messages()
        .iter()
        .filter(|m| m.role() == Role::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 2);
    assert!(tool_messages[0].content().contains("Unknown tool: teleport"));
}

#[cfg(unix)]
#[tokio::test]
async fn e2e_react_shell_timeout_is_observed() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(
            vec![make_tool_call("s", "run_command", serde_json::json!({"command": "sleep 5"}))],
            "",
        ),
        text_response("Gave up waiting. TASK COMPLETE"),
    ]));

    let engine = ReactEngine::new(
        provider.clone(),
        Arc::new(basic_registry(Duration::from_secs(1))),
        AgentConfig::new("mock"),
    );
    let mut conversation = Conversation::seeded("system", "Task: wait");
    let outcome = engine.run_in(&mut conversation).await.unwrap();

    assert!(outcome.success);
    let tool_msg = conversation
        .messages()
        .iter()
        .find(|m| m.role() == Role::Tool)
        .unwrap();
    assert!(tool_msg.content().contains("timed out after 1 seconds"));
}

#[tokio::test]
async fn e2e_react_exhaustion_is_not_an_error() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("Thinking..."),
        text_response("Still thinking..."),
    ]));
    let engine = react_engine(provider.clone()).with_max_iterations(2);

    let outcome = engine.run("ponder").await.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(provider.calls(), 2);
}

// ── E2E: Planner + Orchestrator ─────────────────────────────────────────

fn team(provider: Arc<ScriptedProvider>) -> SpecialistTeam {
    let tools = full_registry(Duration::from_secs(5));
    SpecialistTeam::new(provider, &AgentConfig::new("mock"), tools.definitions())
}

#[tokio::test]
async fn e2e_plan_code_test_debug_then_write() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("greet.py");
    let target_str = target.to_string_lossy().to_string();

    let provider = Arc::new(ScriptedProvider::new(vec![
        // Planner
        text_response(&format!(
            "Here is the plan:\n```json\n[\n  {{\"agent\": \"coder\", \"instruction\": \"Write greet()\"}},\n  {{\"agent\": \"tester\", \"instruction\": \"Test greet()\"}},\n  {{\"agent\": \"tool\", \"instruction\": \"Write the code to {target_str}\"}}\n]\n```"
        )),
        // Coder
        text_response("def greet():\n    return 'hi'"),
        // Tester
        text_response("test_greet: FAIL (expected 'hello')"),
        // Debugger
        text_response("greet() should return 'hello'"),
        // Tool executor
        tool_response(
            vec![make_tool_call(
                "w",
                "write_file",
                serde_json::json!({"file_path": target_str, "content": "def greet():\n    return 'hello'\n"}),
            )],
            "",
        ),
    ]));

    let team = team(provider.clone());
    let plan = team.plan("a greeter module").await.expect("plan parses");
    assert_eq!(plan.len(), 3);

    let tools = Arc::new(full_registry(Duration::from_secs(5)));
    let (sink, mut rx) = EventSink::channel();
    let mut orchestrator =
        Orchestrator::new(plan, "a greeter module", team, tools).with_events(sink);

    let outcome = orchestrator.run(&FixedApprover(true)).await.unwrap();

    // Debugger answered before the tool step
    assert!(provider.request(3).messages[1].content().starts_with("Test results:"));
    // The tool step received the debugger's output as content
    assert!(provider.request(4).messages[1]
        .content()
        .ends_with("Content: greet() should return 'hello'"));
    assert!(target.exists());
    assert_eq!(outcome.denied_batches, 0);
    assert!(outcome.test_results.unwrap().contains("FAIL"));

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.data["needs_confirmation"] == true));
}

#[tokio::test]
async fn e2e_plan_denied_write_leaves_disk_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("never.txt");

    let provider = Arc::new(ScriptedProvider::new(vec![tool_response(
        vec![
            make_tool_call("r", "read_file_range", serde_json::json!({
                "file_path": target.to_string_lossy(), "start": 0, "end": 1
            })),
            make_tool_call("w", "write_file", serde_json::json!({
                "file_path": target.to_string_lossy(), "content": "x"
            })),
        ],
        "",
    )]));

    let plan = taskforge_core::plan::Plan::from_json(
        r#"[{"agent": "tool_agent", "instruction": "write never.txt"}]"#,
    )
    .unwrap();
    let tools = Arc::new(full_registry(Duration::from_secs(5)));
    let mut orchestrator = Orchestrator::new(plan, "write it", team(provider), tools)
        .with_gate(SensitivityGate::new());

    let Advance::Suspended(pending) = orchestrator.advance().await.unwrap() else {
        panic!("write_file should suspend");
    };
    assert_eq!(pending.sensitive().len(), 1);
    assert_eq!(pending.non_sensitive().len(), 1);

    let next = orchestrator.resume(pending, false).await.unwrap();
    let Advance::Finished(outcome) = next else {
        panic!("single-step plan should finish");
    };
    assert_eq!(outcome.denied_batches, 1);
    assert_eq!(orchestrator.cursor(), 1);
    assert!(!target.exists());
}

#[tokio::test]
async fn e2e_planner_without_json_is_fatal() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_response(
        "Sorry, I can't plan that.",
    )]));
    let err = team(provider).plan("anything").await.unwrap_err();
    assert!(matches!(err, Error::Plan(_)));
}

// ── E2E: Tool Registry Coverage ─────────────────────────────────────────

#[tokio::test]
async fn e2e_all_tools_registered() {
    let registry = full_registry(Duration::from_secs(5));
    let expected = [
        "copy_file",
        "create_folder",
        "grep",
        "move_file",
        "read_file",
        "read_file_range",
        "rename_file",
        "run_cli_command",
        "write_file",
    ];
    assert_eq!(registry.names(), expected);

    let basic = basic_registry(Duration::from_secs(5));
    assert_eq!(
        basic.names(),
        ["create_folder", "read_file", "run_command", "write_file"]
    );

    for name in registry.names() {
        let schema = registry.get(name).unwrap().parameters_schema();
        assert_eq!(schema["type"], "object", "{name} schema should be an object");
    }
}

#[tokio::test]
async fn e2e_file_tools_chain() {
    let dir = tempfile::tempdir().unwrap();
    let registry = full_registry(Duration::from_secs(5));
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");

    let write = dispatch(
        &registry,
        &make_tool_call("1", "write_file", serde_json::json!({
            "file_path": a.to_string_lossy(), "content": "alpha\nbeta\ngamma\n"
        })),
    )
    .await
    .result;
    assert!(write.success);

    let copy = dispatch(
        &registry,
        &make_tool_call("2", "copy_file", serde_json::json!({
            "source_path": a.to_string_lossy(), "destination_path": b.to_string_lossy()
        })),
    )
    .await
    .result;
    assert!(copy.success);

    let grep = dispatch(
        &registry,
        &make_tool_call("3", "grep", serde_json::json!({
            "directory": dir.path().to_string_lossy(), "pattern": "^beta$"
        })),
    )
    .await
    .result;
    let hits = grep.payload.as_str().unwrap();
    assert_eq!(hits.lines().count(), 2);
    assert!(hits.lines().all(|l| l.ends_with(":2:beta")));
}

// ── E2E: Configuration ──────────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_defaults_drive_the_engine() {
    let config = taskforge_config::AppConfig::default();
    config.validate().expect("defaults are valid");

    let agent = config.agent_config();
    assert_eq!(agent.model, "gemini-2.5-flash");
    assert_eq!(agent.max_iterations, 15);
    assert_eq!(agent.completion_marker, "TASK COMPLETE");

    let reparsed: taskforge_config::AppConfig =
        toml_roundtrip(&taskforge_config::AppConfig::default_toml());
    assert_eq!(reparsed.default_model, config.default_model);
    assert_eq!(reparsed.tools.shell_timeout_secs, 30);
}

fn toml_roundtrip(text: &str) -> taskforge_config::AppConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, text).unwrap();
    taskforge_config::AppConfig::load_from(&path).expect("default TOML should load")
}
