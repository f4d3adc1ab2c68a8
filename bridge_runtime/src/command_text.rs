use std::collections::BTreeMap;

use thiserror::Error;

use crate::args::{parse_args, ParsedArgs};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandLineError {
    #[error("Invalid command format")]
    InvalidFormat,
}

/// A parsed command: lowercase name, named arguments, and bare positional
/// values in the order they appeared.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    name: String,
    /// The name exactly as the caller typed it.
    literal_name: String,
    args: BTreeMap<String, Value>,
    positional: Vec<Value>,
}

impl Invocation {
    pub fn new(name: impl Into<String>, parsed: ParsedArgs) -> Self {
        let literal_name = name.into();
        Self {
            name: literal_name.to_ascii_lowercase(),
            literal_name,
            args: parsed.named,
            positional: parsed.positional,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn literal_name(&self) -> &str {
        &self.literal_name
    }

    pub fn args(&self) -> &BTreeMap<String, Value> {
        &self.args
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Named argument with a positional fallback.
    pub fn field(&self, key: &str, position: usize) -> Option<&Value> {
        self.args.get(key).or_else(|| self.positional.get(position))
    }

    pub fn number(&self, key: &str, position: usize) -> Option<f64> {
        self.field(key, position).and_then(Value::as_f64)
    }

    pub fn count(&self, key: &str, position: usize) -> Option<u32> {
        self.field(key, position).and_then(Value::as_count)
    }

    /// Text view of a field; blank strings count as absent.
    pub fn text(&self, key: &str, position: usize) -> Option<String> {
        self.field(key, position)
            .map(Value::to_text)
            .filter(|text| !text.trim().is_empty())
    }

    /// Named-only boolean switch.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.args.get(key).and_then(Value::as_bool)
    }
}

/// Split `"<name> <rest>"` into an [`Invocation`].
///
/// The name is the leading run of ASCII letters, digits and underscores;
/// everything after it is handed to [`parse_args`].
pub fn parse_command_line(input: &str) -> Result<Invocation, CommandLineError> {
    let trimmed = input.trim();
    let name_len = trimmed
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_'))
        .map(|(index, _)| index)
        .unwrap_or(trimmed.len());
    if name_len == 0 {
        return Err(CommandLineError::InvalidFormat);
    }

    let (name, rest) = trimmed.split_at(name_len);
    Ok(Invocation::new(name, parse_args(rest)))
}
