//! Tests for the operations assistant loop
//!
//! - Plain-language confirmations after tool use
//! - Safe-copy and restore invariants against the engine
//! - Tool failures fed back to the model instead of failing the turn
//! - Round ceiling, vendor errors and the fallback reply

mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use ops_dashboard::agent::plain::contains_jargon;
use ops_dashboard::agent::provider::{Completion, Turn};
use ops_dashboard::agent::{Agent, FALLBACK_REPLY};
use ops_dashboard::error::{AgentError, ProviderError};
use ops_dashboard::n8n::CREATE_ALLOWED_FIELDS;
use ops_dashboard::registry::WorkflowRegistry;
use ops_dashboard::types::ChatMessage;

fn agent(engine: &Arc<FakeEngine>, max_rounds: usize) -> Agent {
    Agent::new(engine.clone(), Arc::new(WorkflowRegistry::default()), max_rounds)
}

fn ask(text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(text)]
}

// ═══════════════════════════════════════════════════════════════════════════
// Toggling
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_turn_off_blog_creator() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "toolu_1",
            "toggle_workflow",
            json!({"workflow_id": BLOG_CREATOR, "action": "deactivate"}),
        )]),
        text("Done — the Blog Creator is now turned off."),
    ]);

    let reply = agent(&engine, 8)
        .converse(&provider, &ask("turn off the blog creator"))
        .await
        .unwrap();

    assert_eq!(reply, "Done — the Blog Creator is now turned off.");
    assert!(!contains_jargon(&reply));
    assert!(!engine.is_active(BLOG_CREATOR));
    assert_eq!(engine.calls(), vec![format!("deactivate {}", BLOG_CREATOR)]);

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], vec![Turn::User("turn off the blog creator".into())]);
    let results = last_results(&requests[1]);
    assert_eq!(results[0].0, "toolu_1");
    assert_eq!(results[0].1["success"], true);
    assert_eq!(results[0].1["message"], "Blog Creator has been turned off.");
}

#[tokio::test]
async fn test_toggle_is_idempotent() {
    let engine = Arc::new(FakeEngine::seeded());
    let on = || {
        tool_round(vec![call(
            "t",
            "toggle_workflow",
            json!({"workflow_id": PURCHASES, "action": "activate"}),
        )])
    };
    let provider = ScriptedProvider::new(vec![on(), on(), text("Purchases is on.")]);

    agent(&engine, 8)
        .converse(&provider, &ask("turn purchases on, really"))
        .await
        .unwrap();

    assert!(engine.is_active(PURCHASES));
    let requests = provider.requests();
    assert_eq!(last_results(&requests[1])[0].1["success"], true);
    assert_eq!(last_results(&requests[2])[0].1["message"], "Purchases has been turned on.");
    assert_eq!(engine.active_ids().len(), 4);
}

// ═══════════════════════════════════════════════════════════════════════════
// Safe copy and restore
// ═══════════════════════════════════════════════════════════════════════════

fn edited_blog_creator() -> serde_json::Value {
    json!({
        "id": BLOG_CREATOR,
        "name": "Blog Creator (Weekly)",
        "active": true,
        "nodes": [{"id": "1", "name": "Schedule", "type": "n8n-nodes-base.scheduleTrigger"}],
        "connections": {},
        "settings": {"timezone": "UTC"},
        "tags": ["blog"],
        "versionId": "abc"
    })
}

#[tokio::test]
async fn test_safe_copy_leaves_only_the_copy_active() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "c1",
            "create_safe_copy",
            json!({
                "original_id": BLOG_CREATOR,
                "modified_workflow": edited_blog_creator(),
                "change_summary": "Posts weekly instead of daily"
            }),
        )]),
        text("Done, the Blog Creator now posts weekly."),
    ]);

    agent(&engine, 8)
        .converse(&provider, &ask("make the blog weekly"))
        .await
        .unwrap();

    let results = last_results(&provider.requests()[1]);
    let result = &results[0].1;
    assert_eq!(result["success"], true);
    assert_eq!(result["originalId"], BLOG_CREATOR);
    assert_eq!(result["newId"], "copy-1");
    assert_eq!(result["changeSummary"], "Posts weekly instead of daily");

    assert!(!engine.is_active(BLOG_CREATOR));
    assert!(engine.is_active("copy-1"));
    assert_eq!(
        engine.calls(),
        vec![
            format!("deactivate {}", BLOG_CREATOR),
            "create".to_string(),
            "activate copy-1".to_string(),
        ]
    );

    let body = &engine.created_bodies()[0];
    for key in body.as_object().unwrap().keys() {
        assert!(CREATE_ALLOWED_FIELDS.contains(&key.as_str()), "unexpected field {}", key);
    }
    assert_eq!(body["name"], "Blog Creator (Weekly)");
}

#[tokio::test]
async fn test_safe_copy_without_name_is_labelled_edited() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "c1",
            "create_safe_copy",
            json!({
                "original_id": VOICE_AGENT,
                "modified_workflow": {"nodes": [], "connections": {}},
                "change_summary": "Shorter greeting"
            }),
        )]),
        text("Done."),
    ]);

    agent(&engine, 8).converse(&provider, &ask("shorten the greeting")).await.unwrap();

    let body = &engine.created_bodies()[0];
    assert_eq!(body["name"], "AI Voice Agent (Edited)");
    assert_eq!(body["settings"], json!({}));
}

#[tokio::test]
async fn test_restore_is_inverse_of_safe_copy() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "c1",
            "create_safe_copy",
            json!({
                "original_id": BLOG_CREATOR,
                "modified_workflow": edited_blog_creator(),
                "change_summary": "Weekly"
            }),
        )]),
        tool_round(vec![call(
            "c2",
            "restore_original",
            json!({"original_id": BLOG_CREATOR, "modified_copy_id": "copy-1"}),
        )]),
        text("The original Blog Creator is back on."),
    ]);

    agent(&engine, 8).converse(&provider, &ask("edit then undo")).await.unwrap();

    assert!(engine.is_active(BLOG_CREATOR));
    assert!(!engine.is_active("copy-1"));
    let results = last_results(&provider.requests()[2]);
    let restore = &results[0].1;
    assert_eq!(restore["message"], "Original workflow restored.");
}

#[tokio::test]
async fn test_failed_copy_reactivates_original() {
    let engine = Arc::new(FakeEngine::seeded());
    engine.fail_create();
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "c1",
            "create_safe_copy",
            json!({
                "original_id": BLOG_CREATOR,
                "modified_workflow": edited_blog_creator(),
                "change_summary": "Weekly"
            }),
        )]),
        text("Sorry, I couldn't make that change. Nothing was changed."),
    ]);

    let reply = agent(&engine, 8).converse(&provider, &ask("make it weekly")).await.unwrap();

    assert!(reply.starts_with("Sorry"));
    assert!(engine.is_active(BLOG_CREATOR));
    let results = last_results(&provider.requests()[1]);
    let result = &results[0].1;
    assert_eq!(result["error"], "n8n API error: 400");
}

#[tokio::test]
async fn test_failed_copy_leaves_switched_off_original_off() {
    let engine = Arc::new(FakeEngine::seeded());
    engine.switch_off(BLOG_CREATOR);
    engine.fail_create();
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "c1",
            "create_safe_copy",
            json!({
                "original_id": BLOG_CREATOR,
                "modified_workflow": edited_blog_creator(),
                "change_summary": "Weekly"
            }),
        )]),
        text("Sorry, I couldn't make that change."),
    ]);

    agent(&engine, 8).converse(&provider, &ask("make it weekly")).await.unwrap();

    assert!(!engine.is_active(BLOG_CREATOR));
    assert!(!engine.calls().contains(&format!("activate {}", BLOG_CREATOR)));
    let results = last_results(&provider.requests()[1]);
    assert_eq!(results[0].1["error"], "n8n API error: 400");
}

#[tokio::test]
async fn test_failed_copy_activation_keeps_one_active_version() {
    let engine = Arc::new(FakeEngine::seeded());
    engine.fail_activation_of("copy-1");
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![call(
            "c1",
            "create_safe_copy",
            json!({
                "original_id": BLOG_CREATOR,
                "modified_workflow": edited_blog_creator(),
                "change_summary": "Weekly"
            }),
        )]),
        text("That didn't work, so I left things as they were."),
    ]);

    agent(&engine, 8).converse(&provider, &ask("make it weekly")).await.unwrap();

    assert!(engine.is_active(BLOG_CREATOR));
    assert!(!engine.is_active("copy-1"));
    assert_eq!(
        engine.calls().last().map(String::as_str),
        Some(format!("activate {}", BLOG_CREATOR).as_str())
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Tool errors
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_tool_errors_are_returned_to_the_model() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![
            call("a", "get_workflow_detail", json!({"workflow_id": "missing"})),
            call("b", "delete_workflow", json!({"workflow_id": BLOG_CREATOR})),
            call("c", "toggle_workflow", json!({"workflow_id": BLOG_CREATOR, "action": "pause"})),
        ]),
        text("I couldn't find that one."),
    ]);

    let reply = agent(&engine, 8).converse(&provider, &ask("show me")).await.unwrap();
    assert_eq!(reply, "I couldn't find that one.");

    let results = last_results(&provider.requests()[1]);
    assert_eq!(results[0].1["error"], "n8n API error: 404");
    assert_eq!(results[1].1["error"], "Unknown tool: delete_workflow");
    assert!(
        results[2].1["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid input for toggle_workflow")
    );
    assert!(engine.is_active(BLOG_CREATOR));
}

#[tokio::test]
async fn test_concurrent_calls_are_correlated_by_id() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![
        tool_round(vec![
            call("first", "get_workflows", json!({})),
            call("second", "get_workflow_detail", json!({"workflow_id": NEW_CUSTOMER})),
        ]),
        text("All four are on."),
    ]);

    agent(&engine, 8).converse(&provider, &ask("status?")).await.unwrap();

    let requests = provider.requests();
    match &requests[1][1] {
        Turn::ToolCalls { calls, .. } => assert_eq!(calls.len(), 2),
        other => panic!("expected tool calls turn, got {:?}", other),
    }
    let results = last_results(&requests[1]);
    assert_eq!(results[0].0, "first");
    let summaries = results[0].1.as_array().unwrap();
    assert_eq!(summaries.len(), 4);
    assert_eq!(summaries[0]["totalRuns"], 0);
    assert!(summaries[0].get("successRate").is_some());
    assert_eq!(results[1].0, "second");
    assert_eq!(results[1].1["id"], NEW_CUSTOMER);
}

// ═══════════════════════════════════════════════════════════════════════════
// Loop termination
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_round_ceiling_stops_the_loop() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::repeating(Completion::ToolCalls {
        text: None,
        calls: vec![call("x", "get_workflows", json!({}))],
    });

    let err = agent(&engine, 3)
        .converse(&provider, &ask("loop forever"))
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::TooManyRounds(3)));
    assert_eq!(provider.requests().len(), 4);
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![Err(ProviderError::Api {
        provider: "anthropic",
        status: 529,
        body: "overloaded".into(),
    })]);

    let err = agent(&engine, 8).converse(&provider, &ask("hi")).await.unwrap_err();
    assert!(matches!(err, AgentError::Provider(ProviderError::Api { status: 529, .. })));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_empty_reply_uses_fallback() {
    let engine = Arc::new(FakeEngine::seeded());

    let provider = ScriptedProvider::new(vec![Ok(Completion::Text(None))]);
    let reply = agent(&engine, 8).converse(&provider, &ask("hi")).await.unwrap();
    assert_eq!(reply, FALLBACK_REPLY);

    let provider = ScriptedProvider::new(vec![text("   ")]);
    let reply = agent(&engine, 8).converse(&provider, &ask("hi")).await.unwrap();
    assert_eq!(reply, FALLBACK_REPLY);
}

#[tokio::test]
async fn test_reply_is_filtered_to_plain_language() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![text(
        "The webhook node executed fine. Its trigger fires daily.",
    )]);

    let reply = agent(&engine, 8).converse(&provider, &ask("how is it?")).await.unwrap();

    assert_eq!(reply, "The connection step ran fine. Its start fires daily.");
    assert!(!contains_jargon(&reply));
}

#[tokio::test]
async fn test_transcript_history_is_forwarded() {
    let engine = Arc::new(FakeEngine::seeded());
    let provider = ScriptedProvider::new(vec![text("Yes.")]);
    let transcript = vec![
        ChatMessage::user("is the blog on?"),
        ChatMessage::assistant("Yes, it's on."),
        ChatMessage::user("sure?"),
    ];

    agent(&engine, 8).converse(&provider, &transcript).await.unwrap();

    assert_eq!(
        provider.requests()[0],
        vec![
            Turn::User("is the blog on?".into()),
            Turn::Assistant("Yes, it's on.".into()),
            Turn::User("sure?".into()),
        ]
    );
}
