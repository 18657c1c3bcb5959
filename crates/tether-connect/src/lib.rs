//! Tether Connect: the client half of the bridge
//!
//! Remote objects are driven through [`RemoteHandle`]s whose methods come from
//! a declarative class specification rather than from compiled-in types. A call on a handle
//! either runs a native method locally or becomes one `POST /command` round
//! trip; object references in the answer come back as new handles.
//!
//! # Architecture
//!
//! - [`StubTable`]: per-class native and forwarding methods, built from the class registry
//! - [`Transmogrifier`]: tagged response payloads to handles
//! - [`Transport`]: blocking request/response exchange, [`HttpTransport`] over loopback
//! - [`HostProcess`]: spawns the host, waits for readiness and reaps it
//! - [`Session`]: ties the above together and yields a [`SessionRoot`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tether_connect::{LaunchOptions, Session};
//! use tether_spec::SpecRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = Arc::new(SpecRegistry::load("specs/sandbox.json")?);
//! let options = LaunchOptions::new("tether-host", "specs/sandbox.json", "chromium");
//! let browser = Session::new(spec).launch(&options, vec![])?;
//!
//! let page = browser.call("newPage", vec![])?.into_handle()?;
//! page.scope("keyboard")?.call("type", vec!["hello".into()])?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handle;
pub mod session;
pub mod stubs;
pub mod supervisor;
pub mod transmogrify;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::ConnectError;
pub use handle::{RemoteHandle, ScopedHandle, SessionContext};
pub use session::{Session, SessionRoot};
pub use stubs::{NativeFn, Stub, StubTable};
pub use supervisor::{allocate_port, HostProcess, LaunchOptions};
pub use transmogrify::{Constructor, Reply, Transmogrifier};
pub use transport::{HttpTransport, Transport};

pub type Result<T> = std::result::Result<T, ConnectError>;
