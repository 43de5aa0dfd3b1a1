use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database id.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw id value.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered user, owned by the user domain.
    UserId
);
entity_id!(
    /// Identifier of an author, owned by the author domain.
    AuthorId
);
entity_id!(
    /// Identifier of a category, owned by the category domain.
    CategoryId
);
entity_id!(
    /// Identifier of a book, owned by the library domain.
    BookId
);
entity_id!(
    /// Identifier of a borrowing record, owned by the library domain.
    BorrowingId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrips_through_i64() {
        let id = BookId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(BookId::from(i64::from(id)), id);
    }

    #[test]
    fn id_serializes_transparently() {
        let id = UserId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_display_as_plain_integers() {
        assert_eq!(AuthorId::new(13).to_string(), "13");
    }
}
