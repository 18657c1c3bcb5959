//! Tether Spec: the declarative class/member description driving the bridge
//!
//! The specification is the single authority on what can be called: the client
//! builds its stub tables from it and the host refuses any command it does not
//! declare, whatever the underlying object would accept.
//!
//! # Example
//!
//! ```
//! use tether_spec::SpecRegistry;
//!
//! let registry = SpecRegistry::from_json_str(
//!     r#"{ "classes": [ { "name": "Widget", "members": [ { "name": "press" } ] } ] }"#,
//! )
//! .unwrap();
//!
//! assert!(registry.declares("Widget", "press"));
//! assert!(registry.members_of("Gadget").is_empty());
//! ```

pub mod error;
pub mod registry;

pub use error::{Result, SpecError};
pub use registry::{ArgSpec, ClassSpec, MemberDescriptor, MemberKind, MemberMap, SpecRegistry};
