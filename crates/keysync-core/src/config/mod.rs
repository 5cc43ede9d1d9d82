// Keysync Config API
// File based platform tables and checked key overrides

pub mod parser;

pub use parser::{parse_number, CheckedKeyToml, Config, ConfigError, ConfigToml, PlatformToml};
