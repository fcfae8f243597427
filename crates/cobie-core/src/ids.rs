//! Repository identifiers, codes and change states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the generated dynamic schema.
pub const DYNAMIC_SCHEMA_NAME: &str = "COBieConnectorDynamic";

/// Alias of the generated dynamic schema.
pub const DYNAMIC_SCHEMA_ALIAS: &str = "cbd";

/// Code spec every COBie element code is scoped by.
pub const CODE_SPEC_NAME: &str = "COBieConnectorDynamicCOBie";

/// Identifier of a persisted repository entity (element, model, category,
/// relationship instance or code spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// The repository root subject every job subject lives under.
    pub const ROOT_SUBJECT: ElementId = ElementId(1);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Element identity: unique by the whole `(spec, scope, value)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Code {
    pub spec: ElementId,
    pub scope: ElementId,
    pub value: String,
}

impl Code {
    pub fn new(spec: ElementId, scope: ElementId, value: impl Into<String>) -> Self {
        Self {
            spec,
            scope,
            value: value.into(),
        }
    }

    /// Build the code value for a row: table name immediately followed by the
    /// key value, e.g. `Space101`.
    pub fn value_for(table: &str, key: &str) -> String {
        format!("{}{}", table, key)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.spec, self.scope, self.value)
    }
}

/// Classification of a source item against the previously synchronized state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    New,
    Changed,
    Unchanged,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::New => "new",
            ItemState::Changed => "changed",
            ItemState::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_value_concatenates() {
        assert_eq!(Code::value_for("Space", "101"), "Space101");
    }

    #[test]
    fn test_codes_differ_by_scope() {
        let a = Code::new(ElementId(2), ElementId(10), "Space101");
        let b = Code::new(ElementId(2), ElementId(11), "Space101");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "0x2:0xa:Space101");
    }
}
