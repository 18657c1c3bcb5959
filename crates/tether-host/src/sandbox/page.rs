use super::input::{Keyboard, Mouse};
use super::{string_arg, Engine};
use crate::error::InvocationError;
use crate::object::{Outcome, RemoteObject};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct PageState {
    url: String,
    content: String,
    inputs: HashMap<String, String>,
    clicks: Vec<String>,
}

/// A tab. Exposes `mouse` and `keyboard` as scoped sub-targets.
pub struct Page {
    guid: String,
    state: Mutex<PageState>,
    main_frame: Arc<Frame>,
    mouse: Arc<Mouse>,
    keyboard: Arc<Keyboard>,
    closed: AtomicBool,
}

impl Page {
    pub(super) fn open(engine: &Engine) -> Arc<Page> {
        let guid = engine.next_guid("Page");
        let frame_guid = engine.next_guid("Frame");

        Arc::new_cyclic(|page| Page {
            guid,
            state: Mutex::new(PageState {
                url: "about:blank".to_string(),
                ..Default::default()
            }),
            main_frame: Arc::new(Frame {
                guid: frame_guid,
                page: page.clone(),
            }),
            mouse: Arc::new(Mouse::default()),
            keyboard: Arc::new(Keyboard::default()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(super) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn ensure_open(&self) -> Result<(), InvocationError> {
        if self.is_closed() {
            Err(InvocationError::Failed(
                "Target page has been closed".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn url(&self) -> String {
        self.state.lock().await.url.clone()
    }
}

fn extract_title(html: &str) -> &str {
    let Some(start) = html.find("<title>") else {
        return "";
    };
    let rest = &html[start + "<title>".len()..];
    match rest.find("</title>") {
        Some(end) => rest[..end].trim(),
        None => "",
    }
}

#[async_trait]
impl RemoteObject for Page {
    fn class_name(&self) -> &str {
        "Page"
    }

    fn guid(&self) -> Option<&str> {
        Some(&self.guid)
    }

    async fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Outcome, InvocationError> {
        match member {
            "goto" => {
                self.ensure_open()?;
                let url = string_arg(member, &args, 0, "url")?;
                if url.is_empty() {
                    return Err(InvocationError::bad_arguments(member, "url is empty"));
                }
                let mut state = self.state.lock().await;
                state.url = url;
                state.content.clear();
                state.inputs.clear();
                Ok(Outcome::null())
            }
            "url" => Ok(json!(self.url().await).into()),
            "title" => {
                let state = self.state.lock().await;
                Ok(json!(extract_title(&state.content)).into())
            }
            "setContent" => {
                self.ensure_open()?;
                let html = string_arg(member, &args, 0, "html")?;
                self.state.lock().await.content = html;
                Ok(Outcome::null())
            }
            "content" => Ok(json!(self.state.lock().await.content).into()),
            "click" => {
                self.ensure_open()?;
                let selector = string_arg(member, &args, 0, "selector")?;
                self.state.lock().await.clicks.push(selector);
                Ok(Outcome::null())
            }
            "clicks" => Ok(json!(self.state.lock().await.clicks).into()),
            "fill" => {
                self.ensure_open()?;
                let selector = string_arg(member, &args, 0, "selector")?;
                let value = string_arg(member, &args, 1, "value")?;
                self.state.lock().await.inputs.insert(selector, value);
                Ok(Outcome::null())
            }
            "inputValue" => {
                let selector = string_arg(member, &args, 0, "selector")?;
                let state = self.state.lock().await;
                match state.inputs.get(&selector) {
                    Some(value) => Ok(json!(value).into()),
                    None => Err(InvocationError::Failed(format!(
                        "No element matches selector {}",
                        selector
                    ))),
                }
            }
            "evaluate" => {
                self.ensure_open()?;
                Ok(args.into_iter().next().unwrap_or(Value::Null).into())
            }
            "video" => {
                let path = format!("videos/{}.webm", self.guid.replace('@', "-"));
                Ok(Outcome::object(Arc::new(Video { path })))
            }
            "mainFrame" => Ok(Outcome::object(self.main_frame.clone())),
            "close" => {
                self.close();
                Ok(Outcome::null())
            }
            "isClosed" => Ok(json!(self.is_closed()).into()),
            other => Err(InvocationError::no_such_member("Page", other)),
        }
    }

    fn scoped(&self, member: &str) -> Option<Arc<dyn RemoteObject>> {
        match member {
            "mouse" => Some(self.mouse.clone() as Arc<dyn RemoteObject>),
            "keyboard" => Some(self.keyboard.clone() as Arc<dyn RemoteObject>),
            _ => None,
        }
    }
}

/// The top-level frame of a page.
pub struct Frame {
    guid: String,
    page: Weak<Page>,
}

#[async_trait]
impl RemoteObject for Frame {
    fn class_name(&self) -> &str {
        "Frame"
    }

    fn guid(&self) -> Option<&str> {
        Some(&self.guid)
    }

    async fn invoke(&self, member: &str, _args: Vec<Value>) -> Result<Outcome, InvocationError> {
        let page = self
            .page
            .upgrade()
            .ok_or_else(|| InvocationError::Failed("Frame was detached".to_string()))?;

        match member {
            "url" => Ok(json!(page.url().await).into()),
            "name" => Ok(json!("").into()),
            "page" => Ok(Outcome::object(page)),
            other => Err(InvocationError::no_such_member("Frame", other)),
        }
    }
}

/// A recording. Carries no engine identity of its own.
pub struct Video {
    path: String,
}

#[async_trait]
impl RemoteObject for Video {
    fn class_name(&self) -> &str {
        "Video"
    }

    fn guid(&self) -> Option<&str> {
        None
    }

    async fn invoke(&self, member: &str, _args: Vec<Value>) -> Result<Outcome, InvocationError> {
        match member {
            "path" => Ok(json!(self.path).into()),
            other => Err(InvocationError::no_such_member("Video", other)),
        }
    }
}
