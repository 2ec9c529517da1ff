//! Rule tables parsed from `key;text;colorABGR;distance;sound` files.
//!
//! Two ordering policies apply and they are independent:
//! - at load time a repeated key overwrites the earlier rule in place;
//! - at lookup time the first rule (in file order) whose key occurs in the
//!   candidate wins, and nothing further down is considered. Rule order in
//!   the file is therefore part of the contract.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

use super::model::{AlertRule, TriggerDistance};
use crate::core::model::Rgba;

const FIELD_COUNT: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected 5 fields, found {found}")]
    FieldCount { line: usize, found: usize },
}

/// Ordered rule table. Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTable {
    rules: Vec<AlertRule>,
    index: HashMap<String, usize>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rule lines. Blank lines, `#` comments and lines without a
    /// semicolon are skipped.
    pub fn parse<I, S>(lines: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (idx, raw) in lines.into_iter().enumerate() {
            let line = raw.as_ref().trim().trim_start_matches('\u{feff}');
            if line.is_empty() || line.starts_with('#') || !line.contains(';') {
                continue;
            }
            table.insert(parse_rule(line, idx + 1)?);
        }
        Ok(table)
    }

    /// Insert a rule; a rule with the same key is replaced where it stands.
    pub fn insert(&mut self, rule: AlertRule) {
        match self.index.get(&rule.key) {
            Some(&pos) => self.rules[pos] = rule,
            None => {
                self.index.insert(rule.key.clone(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    /// First rule whose key is a substring of `candidate`.
    pub fn lookup(&self, candidate: &str) -> Option<&AlertRule> {
        self.rules.iter().find(|rule| candidate.contains(rule.key.as_str()))
    }

    /// Rule whose key equals `key` exactly.
    pub fn get(&self, key: &str) -> Option<&AlertRule> {
        self.index.get(key).map(|&pos| &self.rules[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlertRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromStr for RuleTable {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.lines())
    }
}

fn parse_rule(line: &str, line_no: usize) -> Result<AlertRule, ParseError> {
    let fields: Vec<&str> = line.splitn(FIELD_COUNT, ';').map(str::trim).collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            line: line_no,
            found: fields.len(),
        });
    }

    let color = Rgba::parse_abgr_hex(fields[2]).unwrap_or_else(|| {
        log::warn!("line {}: invalid color {:?}, using transparent", line_no, fields[2]);
        Rgba::from_abgr(0)
    });

    Ok(AlertRule {
        key: fields[0].to_string(),
        text: fields[1].to_string(),
        color,
        distance: TriggerDistance::parse(fields[3]),
        sound: fields[4].to_string(),
    })
}
