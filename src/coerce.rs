//! Coercion rules for loosely typed arguments coming from a host binding.

/// What kind of value a host argument turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Loose {
    /// The argument was not passed at all.
    Absent,
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array,
    Function,
    Object,
    /// Symbols, bigints and anything else not listed above.
    Other,
}

impl Loose {
    /// The string payload, if the value is a string.
    pub(crate) fn into_string(self) -> Option<String> {
        match self {
            Loose::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Plain objects only; arrays and functions do not count.
    pub(crate) fn is_object(&self) -> bool {
        matches!(self, Loose::Object)
    }

    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Loose::Absent | Loose::Undefined | Loose::Null => false,
            Loose::Bool(b) => *b,
            Loose::Number(n) => *n != 0.0 && !n.is_nan(),
            Loose::Str(s) => !s.is_empty(),
            Loose::Array | Loose::Function | Loose::Object | Loose::Other => true,
        }
    }

    /// Boolean flag that defaults to `true` when left out.
    pub(crate) fn to_boolean_or_true(&self) -> bool {
        match self {
            Loose::Absent | Loose::Undefined => true,
            other => other.is_truthy(),
        }
    }
}
