//! Dice roller tool for `NdS`, `NdS+M` and `NdS-M` notation.

use async_trait::async_trait;
use agentquest_core::error::ToolError;
use agentquest_core::tool::{Tool, ToolResult};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation '{0}'. Use standard notation like '1d20' or '2d6+3'.")]
    InvalidNotation(String),

    #[error("Number of dice and sides must be positive integers.")]
    NotPositive,

    #[error("At most {MAX_DICE} dice of at most {MAX_SIDES} sides can be rolled at once.")]
    TooLarge,
}

/// A parsed `NdS[+|-M]` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i64,
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let notation = s.trim().to_lowercase();
        let invalid = || DiceError::InvalidNotation(s.trim().to_string());

        let (count, rest) = notation.split_once('d').ok_or_else(invalid)?;
        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (sides, m) = rest.split_at(pos);
                let value: i64 = parse_digits(&m[1..]).ok_or_else(invalid)?.into();
                (sides, if m.starts_with('-') { -value } else { value })
            }
            None => (rest, 0),
        };

        let count = parse_digits(count).ok_or_else(invalid)?;
        let sides = parse_digits(sides).ok_or_else(invalid)?;

        if count == 0 || sides == 0 {
            return Err(DiceError::NotPositive);
        }
        if count > MAX_DICE || sides > MAX_SIDES {
            return Err(DiceError::TooLarge);
        }

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

/// Strictly ASCII digits; rejects signs, spaces and empty input.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// The outcome of one roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roll {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub total: i64,
}

impl DiceExpression {
    pub fn roll(&self, rng: &mut impl Rng) -> Roll {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.random_range(1..=self.sides))
            .collect();
        let total = rolls.iter().map(|&r| i64::from(r)).sum::<i64>() + self.modifier;
        Roll {
            expression: *self,
            rolls,
            total,
        }
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rolled {}: {:?}", self.expression, self.rolls)?;
        match self.expression.modifier {
            0 => {}
            m if m > 0 => write!(f, " + {m}")?,
            m => write!(f, " - {}", -m)?,
        }
        write!(f, " = {}", self.total)
    }
}

pub struct DiceRollerTool;

#[async_trait]
impl Tool for DiceRollerTool {
    fn name(&self) -> &str {
        "roll_dice"
    }

    fn description(&self) -> &str {
        "Roll dice in standard notation (e.g., '1d20', '2d6', '1d20+2'). Useful for determining outcomes of actions."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "notation": {
                    "type": "string",
                    "description": "Dice notation such as '1d20', '2d6+3' or '1d8-1'"
                }
            },
            "required": ["notation"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let notation = arguments["notation"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'notation' argument".into()))?;

        match notation.parse::<DiceExpression>() {
            Ok(expr) => {
                let roll = expr.roll(&mut rand::rng());
                Ok(ToolResult::ok(roll.to_string()).with_data(serde_json::json!({
                    "rolls": roll.rolls,
                    "modifier": expr.modifier,
                    "total": roll.total,
                })))
            }
            Err(e) => Ok(ToolResult::failure(format!("Error: {e}"))),
        }
    }
}
