//! Concurrent dispatch against one shared context.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tether_host::sandbox::LaunchSettings;
use tether_host::{HostContext, TargetRegistry};
use tether_proto::{CommandRequest, SessionRequest};
use tether_spec::SpecRegistry;

const SPEC: &str = include_str!("../../../specs/sandbox.json");
const CALLS: usize = 64;

fn context() -> Arc<HostContext> {
    let spec = Arc::new(SpecRegistry::from_json_str(SPEC).unwrap());
    Arc::new(HostContext::new(
        spec,
        TargetRegistry::sandbox(LaunchSettings::default()),
    ))
}

fn guid(message: &Value) -> String {
    message["_guid"].as_str().unwrap().to_string()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_new_page_yields_distinct_resolvable_guids() {
    let context = context();
    let session = context
        .open_session(SessionRequest::new("chromium", vec![]))
        .await;
    let browser = guid(&session.message);

    let mut tasks = Vec::with_capacity(CALLS);
    for _ in 0..CALLS {
        let context = context.clone();
        let browser = browser.clone();
        tasks.push(tokio::spawn(async move {
            context
                .dispatch(CommandRequest::new("Browser", browser, "newPage", vec![]))
                .await
        }));
    }

    let mut guids = HashSet::new();
    for task in tasks {
        let response = task.await.unwrap();
        assert!(!response.error, "{:?}", response.message);
        guids.insert(guid(&response.message));
    }
    assert_eq!(guids.len(), CALLS);

    for page in &guids {
        assert!(context.objects().contains(page).await);
        let url = context
            .dispatch(CommandRequest::new("Page", page.clone(), "url", vec![]))
            .await;
        assert!(!url.error);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_are_independent_roots() {
    let context = context();

    let mut tasks = Vec::new();
    for target in ["chromium", "firefox", "webkit"] {
        let context = context.clone();
        tasks.push(tokio::spawn(async move {
            context
                .open_session(SessionRequest::new(target, vec![]))
                .await
        }));
    }

    let mut roots = HashSet::new();
    for task in tasks {
        roots.insert(guid(&task.await.unwrap().message));
    }
    assert_eq!(roots.len(), 3);
}
