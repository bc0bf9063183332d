//! Key grammar.
//!
//! ```text
//! Type
//! Type|Component
//! Type|Component|Method|ParamType1|ParamType2
//! Type|Component|Method|ParamType1|ParamType2|$Value1$Value2|Scope
//! ```
//!
//! Type names, component ids, method names and scopes must not contain
//! [`KEY_SEPARATOR`]. This is not checked.

use serde::Serialize;

/// Separates the fields of a key. Every occurrence marks an ancestor boundary.
pub const KEY_SEPARATOR: char = '|';

/// Prefixed to every encoded argument value inside the value field.
pub const ARGUMENT_SEPARATOR: char = '$';

/// The nesting level a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyLevel {
    /// Every entry cached for a component type.
    Type,
    /// Every entry cached for one component instance.
    Component,
    /// Every entry cached for one method, regardless of arguments.
    Signature,
    /// Exactly one call: arguments plus optional scope.
    Full,
}

impl KeyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyLevel::Type => "type",
            KeyLevel::Component => "component",
            KeyLevel::Signature => "signature",
            KeyLevel::Full => "full",
        }
    }

    /// Levels that can be addressed directly for bulk invalidation.
    pub fn is_removable(&self) -> bool {
        !matches!(self, KeyLevel::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_coarsest_first() {
        assert!(KeyLevel::Type < KeyLevel::Component);
        assert!(KeyLevel::Component < KeyLevel::Signature);
        assert!(KeyLevel::Signature < KeyLevel::Full);
    }

    #[test]
    fn only_full_level_is_not_removable() {
        assert!(KeyLevel::Type.is_removable());
        assert!(KeyLevel::Signature.is_removable());
        assert!(!KeyLevel::Full.is_removable());
    }

    #[test]
    fn level_serializes_as_snake_case() {
        let json = serde_json::to_string(&KeyLevel::Signature).expect("serialize level");
        assert_eq!(json, "\"signature\"");
        assert_eq!(KeyLevel::Signature.as_str(), "signature");
    }
}
