// Gestrs Config API
// Parsing of persisted activator strings

pub mod activator_parser;

pub use activator_parser::{parse_activator_string, ActivatorParseError};
