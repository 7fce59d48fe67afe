//! Macros for defining validated text values.

/// Defines a free-form text newtype.
///
/// The value is trimmed on construction and must be non-empty and at most
/// `max` characters long. Deserialization validates the same way, so a
/// request payload containing an invalid value is rejected as a whole.
///
/// # Example
///
/// ```rust
/// # use common::define_text;
/// define_text! {
///     #[doc = "Title of a book."]
///     struct Title(max = 10);
/// }
///
/// assert_eq!(Title::new("  Dune ").unwrap().as_ref(), "Dune");
/// assert!(Title::new("   ").is_none());
/// assert!(Title::new("The Left Hand of Darkness").is_none());
/// ```
#[macro_export]
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        struct $name:ident(max = $max:literal);
    ) => {
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[doc = $doc]
        pub struct $name(::std::string::String);

        impl $name {
            /// Maximum length of this value in characters.
            pub const MAX_LEN: usize = $max;

            /// Creates a new value out of the provided `text`, if it's valid.
            #[must_use]
            pub fn new(
                text: impl ::core::convert::Into<::std::string::String>,
            ) -> ::core::option::Option<Self> {
                let text = text.into();
                let trimmed = text.trim();
                (!trimmed.is_empty() && trimmed.chars().count() <= $max)
                    .then(|| Self(trimmed.to_owned()))
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut ::core::fmt::Formatter<'_>,
            ) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::new(s).ok_or(::core::concat!(
                    "invalid `",
                    ::core::stringify!($name),
                    "`",
                ))
            }
        }

        impl $crate::private::serde::Serialize for $name {
            fn serialize<S>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::private::serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> $crate::private::serde::Deserialize<'de> for $name {
            fn deserialize<D>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::private::serde::Deserializer<'de>,
            {
                let s = <::std::string::String as
                    $crate::private::serde::Deserialize>::deserialize(
                        deserializer,
                    )?;
                Self::new(s).ok_or_else(|| {
                    <D::Error as $crate::private::serde::de::Error>::custom(
                        ::std::format!(
                            "invalid `{}`: must be 1 to {} characters long",
                            ::core::stringify!($name),
                            $max,
                        ),
                    )
                })
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &'a [u8],
            ) -> ::core::result::Result<
                Self,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                <::std::string::String as
                    $crate::private::postgres_types::FromSql>::from_sql(
                        ty, raw,
                    )
                    .map(Self)
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <::std::string::String as
                    $crate::private::postgres_types::FromSql>::accepts(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> ::core::result::Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                <::std::string::String as
                    $crate::private::postgres_types::ToSql>::to_sql(
                        &self.0, ty, w,
                    )
            }

            fn accepts(ty: &$crate::private::postgres_types::Type) -> bool {
                <::std::string::String as
                    $crate::private::postgres_types::ToSql>::accepts(ty)
            }
        }
    };
}
