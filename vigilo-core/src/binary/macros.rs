/// Implement [`Deserialize`][crate::binary::Deserialize] for a struct by
/// reading its fields in declaration order.
#[macro_export]
macro_rules! deserialize_structure {
    (type $T:ty { $($field:ident),* $(,)? }) => {
        impl $crate::binary::Deserialize for $T {
            fn deserialize(
                deserializer: &mut $crate::binary::Deserializer<impl ::std::io::Read>,
            ) -> ::std::result::Result<Self, $crate::binary::Error> {
                Ok(Self {
                    $($field: $crate::binary::ResultContextExt::context(
                        deserializer.deserialize(),
                        concat!(
                            "cannot deserialize field `",
                            stringify!($field),
                            "` of ",
                            stringify!($T),
                        ),
                    )?,)*
                })
            }
        }
    };
}

/// Implement [`Deserialize`][crate::binary::Deserialize] for a `bitflags`
/// type by reading its underlying integer. Unknown bits are retained.
#[macro_export]
macro_rules! deserialize_bitflags {
    ($T:ty) => {
        impl $crate::binary::Deserialize for $T {
            fn deserialize(
                deserializer: &mut $crate::binary::Deserializer<impl ::std::io::Read>,
            ) -> ::std::result::Result<Self, $crate::binary::Error> {
                Ok(Self::from_bits_retain(deserializer.deserialize()?))
            }
        }
    };
}
