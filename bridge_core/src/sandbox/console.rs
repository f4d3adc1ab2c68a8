//! A tiny statement language for the sandbox's privileged console.
//!
//! Statements are separated by `;`. Each is a verb followed by
//! whitespace-separated operands:
//!
//! ```text
//! give <item> [count]
//! teleport <x> <y>
//! damage <amount>
//! heal <amount>
//! ```

use crate::world::{Position, WorldError};

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Give { item: String, count: u32 },
    Teleport(Position),
    Damage(f64),
    Heal(f64),
}

pub fn parse(source: &str) -> Result<Vec<Statement>, WorldError> {
    source
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(parse_statement)
        .collect()
}

fn parse_statement(statement: &str) -> Result<Statement, WorldError> {
    let mut words = statement.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let operands: Vec<&str> = words.collect();
    match (verb, operands.as_slice()) {
        ("give", [item]) => Ok(Statement::Give {
            item: item.to_string(),
            count: 1,
        }),
        ("give", [item, count]) => Ok(Statement::Give {
            item: item.to_string(),
            count: number(count)?,
        }),
        ("teleport", [x, y]) => Ok(Statement::Teleport(Position::new(number(x)?, number(y)?))),
        ("damage", [amount]) => Ok(Statement::Damage(number(amount)?)),
        ("heal", [amount]) => Ok(Statement::Heal(number(amount)?)),
        ("give" | "teleport" | "damage" | "heal", _) => Err(WorldError::Rejected(format!(
            "wrong operands for {verb}: {statement}"
        ))),
        _ => Err(WorldError::Rejected(format!("unknown console verb: {verb}"))),
    }
}

fn number<T: std::str::FromStr>(token: &str) -> Result<T, WorldError> {
    token
        .parse()
        .map_err(|_| WorldError::Rejected(format!("not a number: {token}")))
}
