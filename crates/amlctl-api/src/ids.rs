// ── Record identity ──
//
// Every backend record carries an identifier that this client never
// invents. The backend mixes UUIDs, integer primary keys and opaque
// reference strings ("T1", "CUS-0042"); `EntityId` folds all three
// behind one comparable, hashable type.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any backend record.
///
/// Canonical numeric strings and JSON numbers normalise to the same
/// variant, so an id echoed back as `"12"` still matches a record that
/// arrived as `12`. Any text that would not survive that normalisation
/// (`"007"`, an upper-case UUID) stays a `Key` and is sent back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum EntityId {
    Uuid(Uuid),
    Numeric(u64),
    Key(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self::Numeric(n),
            RawId::Text(s) => Self::from(s),
        })
    }
}

impl EntityId {
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            Self::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    /// The identifier as it appears in a URL path segment.
    pub fn path_segment(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Key(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Numeric(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        let canonical_uuid = Uuid::parse_str(&s)
            .ok()
            .filter(|u| u.hyphenated().to_string() == s);
        if let Some(u) = canonical_uuid {
            return Self::Uuid(u);
        }
        match s.parse::<u64>() {
            Ok(n) if n.to_string() == s => Self::Numeric(n),
            _ => Self::Key(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_from_uuid_string() {
        let id = EntityId::from("550e8400-e29b-41d4-a716-446655440000");
        assert!(id.as_uuid().is_some());
    }

    #[test]
    fn entity_id_from_numeric_string() {
        let id = EntityId::from("42");
        assert_eq!(id.as_numeric(), Some(42));
    }

    #[test]
    fn entity_id_from_reference_key() {
        let id: EntityId = "T1".parse().unwrap();
        assert_eq!(id, EntityId::Key("T1".into()));
        assert_eq!(id.path_segment(), "T1");
    }

    #[test]
    fn entity_id_deserializes_mixed_shapes() {
        let ids: Vec<EntityId> =
            serde_json::from_str(r#"[7, "CUS-1", "550e8400-e29b-41d4-a716-446655440000"]"#)
                .unwrap();
        assert_eq!(ids[0], EntityId::Numeric(7));
        assert_eq!(ids[1], EntityId::Key("CUS-1".into()));
        assert!(ids[2].as_uuid().is_some());
    }

    #[test]
    fn zero_padded_ids_keep_their_digits() {
        let id: EntityId = serde_json::from_str(r#""007""#).unwrap();
        assert_eq!(id.path_segment(), "007");
        assert_eq!(id.as_numeric(), None);

        let user_id: EntityId = serde_json::from_str(r#""0042""#).unwrap();
        assert_eq!(serde_json::to_string(&user_id).unwrap(), r#""0042""#);
        assert_ne!(user_id, EntityId::Numeric(42));
    }

    #[test]
    fn non_canonical_uuid_text_is_sent_back_verbatim() {
        let raw = "550E8400-E29B-41D4-A716-446655440000";
        let id = EntityId::from(raw);
        assert_eq!(id.to_string(), raw);
        assert_eq!(id, EntityId::Key(raw.into()));
    }

    #[test]
    fn numeric_and_string_forms_compare_equal_after_parsing() {
        let from_number: EntityId = serde_json::from_str("12").unwrap();
        let from_string: EntityId = serde_json::from_str(r#""12""#).unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, EntityId::from("12"));
    }
}
