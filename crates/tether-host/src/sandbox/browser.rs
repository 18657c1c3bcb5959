use super::page::Page;
use super::{Engine, LaunchSettings};
use crate::error::InvocationError;
use crate::object::{Outcome, RemoteObject};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Root object of a sandbox session.
pub struct Browser {
    guid: String,
    target: String,
    settings: LaunchSettings,
    engine: Engine,
    pages: Mutex<Vec<Arc<Page>>>,
    connected: AtomicBool,
}

impl Browser {
    pub(super) fn new(engine: Engine, target: &str, settings: LaunchSettings) -> Self {
        Self {
            guid: engine.next_guid("Browser"),
            target: target.to_string(),
            settings,
            engine,
            pages: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    fn version(&self) -> String {
        let mode = if self.settings.headless {
            "headless"
        } else {
            "headed"
        };
        format!(
            "{}/sandbox-{} ({})",
            self.target,
            env!("CARGO_PKG_VERSION"),
            mode
        )
    }

    fn ensure_connected(&self) -> Result<(), InvocationError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(InvocationError::Failed("Browser has been closed".to_string()))
        }
    }
}

#[async_trait]
impl RemoteObject for Browser {
    fn class_name(&self) -> &str {
        "Browser"
    }

    fn guid(&self) -> Option<&str> {
        Some(&self.guid)
    }

    async fn invoke(&self, member: &str, _args: Vec<Value>) -> Result<Outcome, InvocationError> {
        match member {
            "newPage" => {
                self.ensure_connected()?;
                let page = Page::open(&self.engine);
                debug!("{} opened {}", self.guid, page.guid().unwrap_or_default());
                self.pages.lock().await.push(page.clone());
                Ok(Outcome::object(page))
            }
            "pages" => {
                let pages = self.pages.lock().await;
                Ok(Outcome::List(
                    pages
                        .iter()
                        .filter(|p| !p.is_closed())
                        .map(|p| Outcome::object(p.clone()))
                        .collect(),
                ))
            }
            "version" => Ok(json!(self.version()).into()),
            "browserType" => Ok(json!(self.target).into()),
            "isConnected" => Ok(json!(self.connected.load(Ordering::Acquire)).into()),
            "close" => {
                self.connected.store(false, Ordering::Release);
                for page in self.pages.lock().await.iter() {
                    page.close();
                }
                Ok(Outcome::null())
            }
            other => Err(InvocationError::no_such_member("Browser", other)),
        }
    }
}
