/// Declares a closed set of wire strings as a Rust enum.
///
/// Parsing trims and ignores ASCII case, and a JSON `null` falls back to the
/// declared default. A `lenient` enum also deserializes any unknown value to
/// the default, with a warning; `FromStr` stays strict for both kinds.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (default = $default:ident, lenient) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        string_enum!(@common $(#[$meta])* $name, $default, $($variant => $text),+);

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                let parsed = match &raw {
                    serde_json::Value::Null => Some($name::default()),
                    serde_json::Value::String(s) => s
                        .parse::<$name>()
                        .or_else(|_| s.trim().replace([' ', '_'], "-").parse::<$name>())
                        .ok(),
                    _ => None,
                };
                Ok(parsed.unwrap_or_else(|| {
                    tracing::warn!(
                        value = %raw,
                        fallback = $name::default().as_str(),
                        "unknown {} value",
                        stringify!($name)
                    );
                    $name::default()
                }))
            }
        }
    };
    (
        $(#[$meta:meta])*
        pub enum $name:ident (default = $default:ident) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        string_enum!(@common $(#[$meta])* $name, $default, $($variant => $text),+);

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <Option<String> as serde::Deserialize>::deserialize(deserializer)?;
                match raw {
                    None => Ok($name::default()),
                    Some(s) => s.parse().map_err(serde::de::Error::custom),
                }
            }
        }
    };
    (@common $(#[$meta:meta])* $name:ident, $default:ident, $($variant:ident => $text:literal),+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("unknown {} value '{}'", stringify!($name), wanted))
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}
