//! Specification registry: class name to callable members.

use crate::error::{Result, SpecError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// How a member behaves when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// Ordinary call returning a value or a remote object
    #[default]
    Method,

    /// Attribute read, called with no arguments
    Property,

    /// Yields a scoped sub-target for the rest of a single request
    Scope,
}

/// One declared argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    #[serde(default)]
    pub optional: bool,
}

/// Shape of a member: its kind, arguments and the class it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    #[serde(default)]
    pub kind: MemberKind,

    #[serde(default)]
    pub args: Vec<ArgSpec>,

    /// Class name of the produced object or scoped sub-target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
}

impl MemberDescriptor {
    /// Number of arguments that must be supplied.
    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|a| !a.optional).count()
    }

    pub fn is_scope(&self) -> bool {
        self.kind == MemberKind::Scope
    }
}

/// Members of one class, ordered by name.
pub type MemberMap = BTreeMap<String, MemberDescriptor>;

/// A declared class and its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    pub name: String,
    pub members: MemberMap,
}

/// Renders a member as `name(arg: type, [opt: type]) -> Returns`.
pub struct Signature<'a> {
    name: &'a str,
    descriptor: &'a MemberDescriptor,
}

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descriptor.kind == MemberKind::Property {
            write!(f, "{}", self.name)?;
        } else {
            write!(f, "{}(", self.name)?;
            for (i, arg) in self.descriptor.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                let ty = arg.ty.as_deref().unwrap_or("any");
                if arg.optional {
                    write!(f, "[{}: {}]", arg.name, ty)?;
                } else {
                    write!(f, "{}: {}", arg.name, ty)?;
                }
            }
            f.write_str(")")?;
        }
        if let Some(returns) = &self.descriptor.returns {
            write!(f, " -> {}", returns)?;
        }
        Ok(())
    }
}

impl ClassSpec {
    pub fn signature<'a>(&'a self, member: &'a str) -> Option<Signature<'a>> {
        self.members
            .get_key_value(member)
            .map(|(name, descriptor)| Signature { name, descriptor })
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    classes: Vec<RawClass>,
}

#[derive(Deserialize)]
struct RawClass {
    name: String,
    #[serde(default)]
    members: Vec<RawMember>,
}

#[derive(Deserialize)]
struct RawMember {
    name: String,
    #[serde(flatten)]
    descriptor: MemberDescriptor,
}

/// Read-only lookup of every declared class.
///
/// Built once; shared behind an `Arc` by the host dispatcher and the client
/// stub tables.
#[derive(Debug, Clone, Default)]
pub struct SpecRegistry {
    classes: HashMap<String, ClassSpec>,
    empty: MemberMap,
}

impl SpecRegistry {
    /// Loads a specification from disk.
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpecError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let registry = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents)?,
            _ => Self::from_json_str(&contents)?,
        };

        info!(
            "Loaded specification {} ({} classes)",
            path.display(),
            registry.classes.len()
        );
        Ok(registry)
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(source)?;
        Self::build(doc)
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let doc: Document = toml::from_str(source)?;
        Self::build(doc)
    }

    fn build(doc: Document) -> Result<Self> {
        let mut classes = HashMap::with_capacity(doc.classes.len());

        for raw in doc.classes {
            if raw.name.is_empty() {
                return Err(SpecError::EmptyName(raw.name));
            }

            let mut members = MemberMap::new();
            for member in raw.members {
                if member.name.is_empty() {
                    return Err(SpecError::EmptyName(raw.name));
                }
                if members.contains_key(&member.name) {
                    return Err(SpecError::DuplicateMember {
                        class: raw.name,
                        member: member.name,
                    });
                }
                members.insert(member.name, member.descriptor);
            }

            debug!("Class {} declares {} members", raw.name, members.len());

            if classes.contains_key(&raw.name) {
                return Err(SpecError::DuplicateClass(raw.name));
            }
            classes.insert(
                raw.name.clone(),
                ClassSpec {
                    name: raw.name,
                    members,
                },
            );
        }

        Ok(Self {
            classes,
            empty: MemberMap::new(),
        })
    }

    /// Members of a class; empty for classes the specification does not know.
    pub fn members_of(&self, class: &str) -> &MemberMap {
        self.classes
            .get(class)
            .map(|c| &c.members)
            .unwrap_or(&self.empty)
    }

    pub fn member(&self, class: &str, member: &str) -> Option<&MemberDescriptor> {
        self.members_of(class).get(member)
    }

    /// Whether `member` is declared on `class`. Exact, case-sensitive match.
    pub fn declares(&self, class: &str, member: &str) -> bool {
        self.member(class, member).is_some()
    }

    pub fn class(&self, name: &str) -> Option<&ClassSpec> {
        self.classes.get(name)
    }

    /// Declared classes in name order.
    pub fn classes(&self) -> Vec<&ClassSpec> {
        let mut all: Vec<&ClassSpec> = self.classes.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
