//! Sandbox engine: a deterministic in-memory browser.
//!
//! Stands in for a real automation engine behind the [`RemoteObject`] seam so
//! the host binary can be run and tested without launching anything. Objects
//! with engine identity are numbered `"<Type>@<n>"`; `Video` carries none and
//! relies on the host's identity policy.
//!
//! [`RemoteObject`]: crate::object::RemoteObject

mod browser;
mod input;
mod page;

pub use browser::Browser;
pub use input::{Keyboard, Mouse};
pub use page::{Frame, Page, Video};

use crate::error::InvocationError;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Options applied to every browser the engine launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchSettings {
    pub headless: bool,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self { headless: true }
    }
}

impl LaunchSettings {
    /// Applies per-session overrides: `[{"headless": false}]`.
    pub fn with_args(mut self, args: &[Value]) -> Self {
        if let Some(headless) = args
            .first()
            .and_then(|opts| opts.get("headless"))
            .and_then(Value::as_bool)
        {
            self.headless = headless;
        }
        self
    }
}

/// Shared identity counter for every object the engine creates.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    ids: Arc<AtomicU64>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_guid(&self, class: &str) -> String {
        let n = self.ids.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}@{}", class, n)
    }

    pub fn launch(&self, target: &str, settings: LaunchSettings) -> Arc<Browser> {
        Arc::new(Browser::new(self.clone(), target, settings))
    }
}

pub(crate) fn string_arg(
    member: &str,
    args: &[Value],
    index: usize,
    name: &str,
) -> Result<String, InvocationError> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| InvocationError::bad_arguments(member, format!("{} must be a string", name)))
}

pub(crate) fn number_arg(
    member: &str,
    args: &[Value],
    index: usize,
    name: &str,
) -> Result<f64, InvocationError> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| InvocationError::bad_arguments(member, format!("{} must be a number", name)))
}
