//! Tether Host: the process that owns the remote object graph.
//!
//! The host loads the specification, constructs root objects on `POST /session`,
//! dispatches `POST /command` against its object table and exits on
//! `GET /shutdown`. The automation engine sits behind the [`RemoteObject`]
//! trait; the bundled [`sandbox`] engine implements it in memory.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether_host::{sandbox::LaunchSettings, server, HostContext, TargetRegistry};
//! use tether_spec::SpecRegistry;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let spec = Arc::new(SpecRegistry::load("specs/sandbox.json")?);
//! let context = Arc::new(HostContext::new(
//!     spec,
//!     TargetRegistry::sandbox(LaunchSettings::default()),
//! ));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
//! server::serve(listener, context, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod object;
pub mod sandbox;
pub mod server;
pub mod table;
pub mod targets;

pub use dispatch::HostContext;
pub use error::{DispatchError, HostError, InvocationError};
pub use object::{Outcome, RemoteObject};
pub use table::{IdentityPolicy, ObjectTable};
pub use targets::{RootFactory, TargetRegistry};
