/*!
 * Tether - spec-driven remote object bridge
 *
 * The `tether` crate is the command-line front of the bridge. It loads a
 * [`TetherConfig`], starts a supervised host through `tether-connect` and
 * drives the session from a JSON [`script`].
 *
 * The bridge itself lives in the workspace crates:
 * - `tether-proto`: wire envelopes and reference tags
 * - `tether-spec`: the class/member specification registry
 * - `tether-host`: remote object registry, dispatcher and HTTP front
 * - `tether-connect`: stub tables, result transmogrifier, process supervisor
 */

pub mod cli_style;
pub mod config;
pub mod error;
pub mod logging;
pub mod script;

pub use config::{LogLevel, TetherConfig};
pub use error::{Result, TetherError, EXIT_FATAL, EXIT_PARTIAL, EXIT_SUCCESS};
pub use script::{Script, Step, StepOutcome};

pub use tether_connect::{LaunchOptions, RemoteHandle, Reply, Session, SessionRoot};
pub use tether_spec::SpecRegistry;
