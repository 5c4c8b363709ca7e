//! Branded ID newtypes for type safety.
//!
//! Every stored entity has a distinct ID type implemented as a newtype
//! wrapper around `String`. This prevents accidentally passing an article
//! ID where an event ID is expected.
//!
//! All IDs are random UUID v4 rendered in canonical hyphenated form; the
//! pool is small enough that collisions are not a concern over its lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new random UUID v4 string.
fn new_v4() -> String {
    Uuid::new_v4().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v4())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Unique identifier for an event in the pool.
    EventId
}

branded_id! {
    /// Unique identifier for a written article.
    ArticleId
}

branded_id! {
    /// Unique identifier for a reflection essay.
    ReflectionId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_new_is_uuid_v4() {
        let id = EventId::new();
        let parsed = Uuid::parse_str(id.as_str()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::Random));
    }

    #[test]
    fn ids_are_unique() {
        let a = EventId::new();
        let b = EventId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn from_string() {
        let id = ArticleId::from_string("custom-id".to_owned());
        assert_eq!(id.as_str(), "custom-id");
    }

    #[test]
    fn deref_to_str() {
        let id = EventId::from("hello");
        let s: &str = &id;
        assert_eq!(s, "hello");
    }

    #[test]
    fn display() {
        let id = ReflectionId::from("display-me");
        assert_eq!(format!("{id}"), "display-me");
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let id = EventId::from("serde-test");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"serde-test\"");
        let back: EventId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
