/*!
 * Script runner: drives a session from a JSON list of steps
 *
 * ```json
 * [
 *   {"call": "newPage", "bind": "page"},
 *   {"on": "page", "call": "goto", "args": ["https://example.test/"]},
 *   {"on": "page", "call": "keyboard.type", "args": ["hello"]}
 * ]
 * ```
 *
 * `on` defaults to `root`, the session's root handle. A dotted `call` walks
 * scoped sub-targets before the final member.
 */

use crate::error::{Result, TetherError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tether_connect::{ConnectError, RemoteHandle, Reply};
use tether_proto::SCOPE_SEPARATOR;
use tracing::{debug, info};

pub const ROOT_BINDING: &str = "root";

fn default_on() -> String {
    ROOT_BINDING.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Binding the call is made on
    #[serde(default = "default_on")]
    pub on: String,

    /// Member name, optionally behind scoped hops (`mouse.click`)
    pub call: String,

    #[serde(default)]
    pub args: Vec<Value>,

    /// Name to bind a returned handle to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| TetherError::Script {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| TetherError::Script {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// What one step produced
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// 1-based position in the script
    pub step: usize,
    pub on: String,
    pub call: String,
    /// Result in wire form; handles appear as `{_guid, _type}`
    pub result: Value,
    pub bound: Option<String>,
}

/// Runs every step against `root`, reporting each outcome as it completes.
///
/// Stops at the first failing step.
pub fn run<F>(script: &Script, root: &RemoteHandle, mut on_step: F) -> Result<Vec<StepOutcome>>
where
    F: FnMut(&StepOutcome),
{
    let mut bindings: HashMap<String, RemoteHandle> = HashMap::new();
    bindings.insert(ROOT_BINDING.to_string(), root.clone());

    let mut outcomes = Vec::with_capacity(script.len());
    for (index, step) in script.steps.iter().enumerate() {
        let number = index + 1;
        let target = bindings
            .get(&step.on)
            .ok_or_else(|| TetherError::UnknownBinding {
                step: number,
                name: step.on.clone(),
            })?;
        debug!("Step {}: {}.{}", number, step.on, step.call);

        let reply = invoke(target, &step.call, step.args.clone()).map_err(|source| {
            TetherError::Step {
                step: number,
                call: step.call.clone(),
                source,
            }
        })?;
        let result = reply.to_json();

        if let Some(name) = &step.bind {
            let handle = reply.into_handle().map_err(|source| TetherError::Step {
                step: number,
                call: step.call.clone(),
                source,
            })?;
            info!("Bound {} to {}", name, handle.guid());
            bindings.insert(name.clone(), handle);
        }

        let outcome = StepOutcome {
            step: number,
            on: step.on.clone(),
            call: step.call.clone(),
            result,
            bound: step.bind.clone(),
        };
        on_step(&outcome);
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn invoke(
    target: &RemoteHandle,
    call: &str,
    args: Vec<Value>,
) -> std::result::Result<Reply, ConnectError> {
    let mut hops = call.split(SCOPE_SEPARATOR);
    let first = hops.next().unwrap_or_default();
    let rest: Vec<&str> = hops.collect();

    let Some((member, scopes)) = rest.split_last() else {
        return target.call(first, args);
    };

    let mut scoped = target.scope(first)?;
    for hop in scopes {
        scoped = scoped.scope(hop)?;
    }
    scoped.call(member, args)
}
