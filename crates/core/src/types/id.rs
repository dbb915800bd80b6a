//! Newtype IDs for type-safe entity references.
//!
//! Every persisted entity is identified by a UUID assigned by the content
//! store. Use the `define_id!` macro to create wrappers that prevent mixing
//! IDs from different collections.

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `from_uuid()`, `as_uuid()`, `random()`
/// - `From<Uuid>`, `Into<Uuid>` and `FromStr` implementations
///
/// The calling crate must depend on `uuid` and `serde`.
///
/// # Example
///
/// ```rust
/// # use folio_core::define_id;
/// define_id!(AlbumId);
/// define_id!(TrackId);
///
/// let album = AlbumId::random();
/// let track = TrackId::from_uuid(album.as_uuid());
///
/// // These are different types, so this won't compile:
/// // let _: AlbumId = track;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random (v4) ID.
            #[must_use]
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(HeroImageId);
define_id!(PortfolioItemId);
define_id!(NewsPostId);
define_id!(SubmissionId);
define_id!(SiteSettingId);
define_id!(AdminUserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parses_from_string() {
        let raw = "0f8fad5b-d9cb-469f-a165-70867728950e";
        let id: NewsPostId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn test_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<HeroImageId>().is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = SubmissionId::random();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
