//! Integer primary keys, one newtype per table.

/// Declares a `SERIAL` key newtype.
///
/// Keys cross the wire as bare JSON numbers and bind straight into queries
/// (with the `postgres` feature); rows are read as `i32` and wrapped with
/// `new`.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

entity_id!(
    /// Key of a `users` row.
    UserId
);
entity_id!(
    /// Key of a `categories` row.
    CategoryId
);
entity_id!(
    /// Key of a `products` row.
    ProductId
);
entity_id!(
    /// Key of an `orders` row.
    OrderId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_plain_numbers_on_the_wire() {
        assert_eq!(serde_json::to_string(&CategoryId::new(7)).unwrap(), "7");

        let parsed: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_i32(), 42);
        assert_eq!(parsed.to_string(), "42");
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        assert!(serde_json::from_str::<OrderId>("\"abc\"").is_err());
    }
}
