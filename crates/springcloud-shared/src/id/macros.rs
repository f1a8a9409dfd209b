/// Declares a typed resource identifier below a resource group.
///
/// Every identifier starts with `/subscriptions/{subscription_id}/resourceGroups/{resource_group}`
/// followed by `/providers/{namespace}` and the listed `field => "key"` pairs. The macro
/// generates the struct, a constructor, strict ([`FromStr`](std::str::FromStr)) and
/// case-insensitive parsing, [`Display`](std::fmt::Display) in canonical form and serde
/// support via the string form.
macro_rules! resource_id {
    (
        $(#[$meta:meta])*
        $name:ident in $namespace:literal {
            $($field:ident => $key:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            pub subscription_id: String,
            pub resource_group: String,
            $(pub $field: String,)+
        }

        impl $name {
            pub const LAYOUT: &'static [$crate::id::Segment] = &[
                $crate::id::Segment::user("subscriptions"),
                $crate::id::Segment::user("resourceGroups"),
                $crate::id::Segment::fixed("providers", $namespace),
                $($crate::id::Segment::user($key),)+
            ];

            pub fn new(
                subscription_id: impl Into<String>,
                resource_group: impl Into<String>,
                $($field: impl Into<String>,)+
            ) -> Self {
                Self {
                    subscription_id: subscription_id.into(),
                    resource_group: resource_group.into(),
                    $($field: $field.into(),)+
                }
            }

            /// Parses the identifier, accepting keys in any casing.
            pub fn parse_insensitively(input: &str) -> Result<Self, $crate::id::ParseError> {
                $crate::id::parse_segments(input, Self::LAYOUT, $crate::id::Casing::Insensitive)
                    .map(Self::from_values)
            }

            fn from_values(values: Vec<String>) -> Self {
                // The parser guarantees one value per user segment
                let mut values = values.into_iter();
                Self {
                    subscription_id: values.next().unwrap_or_default(),
                    resource_group: values.next().unwrap_or_default(),
                    $($field: values.next().unwrap_or_default(),)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::id::ParseError;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                $crate::id::parse_segments(input, Self::LAYOUT, $crate::id::Casing::Sensitive)
                    .map(Self::from_values)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                $crate::id::format_segments(
                    f,
                    Self::LAYOUT,
                    &[
                        self.subscription_id.as_str(),
                        self.resource_group.as_str(),
                        $(self.$field.as_str(),)+
                    ],
                )
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let input = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                input.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}
