//! Comma-separated `key=value` argument parsing.
//!
//! Keys and values are trimmed. Tokens with an empty key are dropped.
//! Tokens without `=` never reach the named mapping; they are kept in order
//! as positional values so terse invocations (`mine 10,20`) can be adapted
//! by [`crate::Invocation::field`]. There is no escaping: a `,` or `=`
//! inside a value cannot be expressed.

use std::collections::BTreeMap;

use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub named: BTreeMap<String, Value>,
    pub positional: Vec<Value>,
}

impl ParsedArgs {
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }
}

pub fn parse_args(input: &str) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                parsed
                    .named
                    .insert(key.to_string(), Value::from_token(value.trim()));
            }
            None => parsed.positional.push(Value::from_token(token)),
        }
    }
    parsed
}
