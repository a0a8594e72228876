//! Intent authorization as seen through agents and the relay.

use std::sync::Arc;

use tokio::task::JoinSet;

use intentmail::{AgentError, Relay, SendOutcome};
use intentmail_core::IntentName;
use intentmail_perms::PermsError;
use intentmail_testkit::{TestAgent, TestNetwork};

fn names(raw: &[&str]) -> Vec<IntentName> {
    raw.iter().map(|n| IntentName::new(*n).unwrap()).collect()
}

fn blocked(outcome: &SendOutcome) -> Vec<IntentName> {
    match outcome {
        SendOutcome::Denied(auth) => auth.blocked.clone(),
        SendOutcome::Delivered { .. } => Vec::new(),
    }
}

/// Bob with a public `news` intent and a privileged `task` intent.
async fn bob_with_intents(net: &TestNetwork) -> TestAgent {
    let bob = net.agent("bob").await;
    bob.declare_intent("news", "Announcements", false).await.unwrap();
    bob.declare_intent("task", "Run a task on my behalf", true)
        .await
        .unwrap();
    bob
}

#[tokio::test]
async fn test_chat_is_open_to_everyone() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    for handle in ["alice", "carol", "dave"] {
        let sender = net.agent(handle).await;
        assert!(sender.send_text("bob", &["chat"], "hi").await.unwrap().is_delivered());
    }
    assert_eq!(bob.receive().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_public_intent_needs_no_grant() {
    let net = TestNetwork::new();
    let _bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;

    let outcome = alice.send_text("bob", &["news"], "release").await.unwrap();
    assert!(outcome.is_delivered());
}

#[tokio::test]
async fn test_privileged_intent_requires_grant() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;

    let denied = alice.send_text("bob", &["task"], "do it").await.unwrap();
    assert_eq!(blocked(&denied), names(&["task"]));
    assert_eq!(
        denied.bounce_message("bob").as_deref(),
        Some("ask bob to grant you access to: task")
    );

    assert!(bob.grant("alice", "task").await.unwrap());
    assert!(!bob.grant("alice", "task").await.unwrap());

    let delivered = alice.send_text("bob", &["task"], "do it").await.unwrap();
    assert!(delivered.is_delivered());
    assert!(delivered.bounce_message("bob").is_none());

    let inbox = bob.receive().await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].verified().unwrap().intent_names(), names(&["task"]));
}

#[tokio::test]
async fn test_grants_are_per_sender() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;
    let carol = net.agent("carol").await;

    bob.grant("alice", "task").await.unwrap();

    assert!(alice.send_text("bob", &["task"], "a").await.unwrap().is_delivered());
    let outcome = carol.send_text("bob", &["task"], "c").await.unwrap();
    assert_eq!(blocked(&outcome), names(&["task"]));
}

#[tokio::test]
async fn test_revoke_takes_effect_immediately() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;

    bob.grant("alice", "task").await.unwrap();
    assert!(alice.send_text("bob", &["task"], "1").await.unwrap().is_delivered());

    assert!(bob.revoke("alice", "task").await.unwrap());
    assert!(!bob.revoke("alice", "task").await.unwrap());

    let outcome = alice.send_text("bob", &["task"], "2").await.unwrap();
    assert!(!outcome.is_delivered());

    // Only the first message made it.
    assert_eq!(bob.receive().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_undeclared_intent_is_blocked() {
    let net = TestNetwork::new();
    let _bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;

    let outcome = alice.send_text("bob", &["payments"], "pay").await.unwrap();
    assert_eq!(blocked(&outcome), names(&["payments"]));
}

#[tokio::test]
async fn test_multi_intent_messages_are_all_or_nothing() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;

    let outcome = alice
        .send_text("bob", &["chat", "task", "news", "billing", "task"], "mixed")
        .await
        .unwrap();
    assert_eq!(blocked(&outcome), names(&["task", "billing"]));
    assert_eq!(net.relay.pending("bob").await, 0);
    assert_eq!(
        outcome.bounce_message("bob").as_deref(),
        Some("ask bob to grant you access to: task, billing")
    );

    bob.grant("alice", "task").await.unwrap();
    let outcome = alice
        .send_text("bob", &["chat", "task", "news"], "mixed")
        .await
        .unwrap();
    assert!(outcome.is_delivered());
}

#[tokio::test]
async fn test_check_permission_matches_send() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;

    let auth = alice.check_permission("bob", &["chat", "task"]).await.unwrap();
    assert!(!auth.allowed);
    assert_eq!(auth.blocked, names(&["task"]));

    bob.grant("alice", "task").await.unwrap();
    let auth = alice.check_permission("bob", &["chat", "task"]).await.unwrap();
    assert!(auth.allowed);
    assert!(auth.blocked.is_empty());
}

#[tokio::test]
async fn test_chat_cannot_be_removed_or_privileged() {
    let net = TestNetwork::new();
    let bob = net.agent("bob").await;

    let err = bob.remove_intent("chat").await.unwrap_err();
    assert!(matches!(err, AgentError::Permission(PermsError::ReservedIntent(_))));

    let err = bob.declare_intent("chat", "VIP only", true).await.unwrap_err();
    assert!(matches!(err, AgentError::Permission(PermsError::ReservedIntent(_))));

    // Re-describing stays public.
    let chat = bob.declare_intent("chat", "Say hello", false).await.unwrap();
    assert!(!chat.privileged);
    let alice = net.agent("alice").await;
    alice.send_text("bob", &[], "hi").await.unwrap();
    let inbox = bob.receive().await.unwrap();
    assert_eq!(inbox[0].verified().unwrap().intents[0].description, "Say hello");
}

#[tokio::test]
async fn test_removed_intent_blocks_until_redeclared() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;
    bob.grant("alice", "task").await.unwrap();

    bob.remove_intent("task").await.unwrap();
    let outcome = alice.send_text("bob", &["task"], "x").await.unwrap();
    assert_eq!(blocked(&outcome), names(&["task"]));

    bob.declare_intent("task", "Back again", true).await.unwrap();
    assert!(alice.send_text("bob", &["task"], "y").await.unwrap().is_delivered());

    let err = bob.remove_intent("nonexistent").await.unwrap_err();
    assert!(matches!(err, AgentError::Permission(PermsError::IntentNotFound(_))));
}

#[tokio::test]
async fn test_grant_needs_a_known_handle() {
    let net = TestNetwork::new();
    let bob = net.agent("bob").await;

    let err = bob.grant("nobody", "task").await.unwrap_err();
    assert!(matches!(err, AgentError::UnknownRecipient(_)));
}

#[tokio::test]
async fn test_directory_view_hides_other_grants() {
    let net = TestNetwork::new();
    let bob = bob_with_intents(&net).await;
    let alice = net.agent("alice").await;
    let carol = net.agent("carol").await;
    bob.grant("alice", "task").await.unwrap();
    bob.grant("carol", "news").await.unwrap();

    let view = net
        .relay
        .fetch_directory_view("bob", &alice.fingerprint())
        .await
        .unwrap();
    let grants = view.grants();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].grantee, alice.fingerprint());

    let full = net.relay.directory("bob").await.unwrap();
    assert_eq!(full.grants().len(), 2);
    assert!(full.has_grant(&carol.fingerprint(), &IntentName::new("news").unwrap()));

    let catalog = net.relay.fetch_intents("bob").await.unwrap();
    let declared: Vec<&str> = catalog.keys().map(IntentName::as_str).collect();
    assert_eq!(declared, vec!["chat", "news", "task"]);
}

#[tokio::test]
async fn test_invalid_intent_names_are_rejected() {
    let net = TestNetwork::new();
    let bob = net.agent("bob").await;
    let alice = net.agent("alice").await;

    assert!(matches!(
        bob.declare_intent("not valid", "x", false).await.unwrap_err(),
        AgentError::Permission(PermsError::InvalidIntentName(_))
    ));
    assert!(matches!(
        alice.send_text("bob", &["bad name"], "x").await.unwrap_err(),
        AgentError::InvalidInput(_)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_all_land_and_publish() {
    let net = TestNetwork::new();
    let bob = Arc::new(bob_with_intents(&net).await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let handle = format!("sender-{i}");
        net.agent(&handle).await;
        handles.push(handle);
    }

    let mut tasks = JoinSet::new();
    for handle in handles.clone() {
        let bob = Arc::clone(&bob);
        tasks.spawn(async move { bob.grant(&handle, "task").await.unwrap() });
    }
    while let Some(changed) = tasks.join_next().await {
        assert!(changed.unwrap());
    }

    assert_eq!(bob.directory().grants().len(), 8);
    let published = net.relay.directory("bob").await.unwrap();
    assert_eq!(published, bob.directory());
}
