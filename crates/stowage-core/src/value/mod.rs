
use derive_more::From;
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

///
/// Value
///
/// Column value as seen by the update pipeline.
/// Ordering is total: variants rank first, then payloads compare naturally.
/// Keys and unique-index values are built from these, so `Eq` and `Hash`
/// must agree with `Ord`.
///

#[derive(
    Clone, Debug, Default, Deserialize, Eq, From, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Value {
    #[default]
    #[from(ignore)]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Blob(Vec<u8>),
    #[serde(with = "ulid_text")]
    Ulid(Ulid),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stable lowercase label for the variant, used in diagnostics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Ulid(_) => "ulid",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Blob(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Ulid(v) => write!(f, "{v}"),
        }
    }
}

/// Render a value list the way key values appear in diagnostics.
#[must_use]
pub fn format_values(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(ToString::to_string).collect();

    format!("{{{}}}", parts.join(", "))
}

// ULIDs travel as their canonical 26-character text form.
mod ulid_text {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use ulid::Ulid;

    pub(super) fn serialize<S: Serializer>(value: &Ulid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Ulid, D::Error> {
        let text = String::deserialize(deserializer)?;

        Ulid::from_string(&text).map_err(D::Error::custom)
    }
}
