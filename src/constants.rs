/// Suffix naming the backward edge of a track (`X` / `X-re`)
pub const DEFAULT_REVERSE_EDGE_SUFFIX: &str = "-re";

/// Log filter used when neither the config nor `RUST_LOG` sets one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Environment variable holding the path of the controller config file
pub const CONFIG_ENV_VAR: &str = "ROUTE_CONTROL_CONFIG";

/// Speed limit for tracks that do not state one, in m/s
pub const DEFAULT_MAX_SPEED: f64 = 27.8;
