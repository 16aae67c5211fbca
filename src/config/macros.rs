/// Configuration macro for single-declaration config structs
///
/// `config_struct!` takes each field as `name: Type = default` and generates:
/// - the struct with public fields
/// - a `Default` implementation built from the declared defaults
/// - serde derives with `#[serde(default)]`, so a TOML file only needs the
///   keys it wants to override
///
/// # Example
/// ```
/// procureflow_realtime::config_struct! {
///     pub struct ExampleConfig {
///         url: String = "ws://localhost:8080/websocket".to_string(),
///         max_attempts: u32 = 5,
///     }
/// }
///
/// let cfg: ExampleConfig = toml::from_str("max_attempts = 3").unwrap();
/// assert_eq!(cfg.max_attempts, 3);
/// assert_eq!(cfg.url, "ws://localhost:8080/websocket");
/// ```
#[macro_export]
macro_rules! config_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_name:ident: $field_type:ty = $default_value:expr
            ),*
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field_name: $field_type,
            )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $field_name: $default_value,
                    )*
                }
            }
        }
    };
}
