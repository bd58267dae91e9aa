//! Fill-in-the-blanks text templates.
//!
//! Slots are written `{name}`. `{{` and `}}` produce literal braces. Every
//! slot must be bound at render time; nothing is ever defaulted.

use std::collections::{BTreeSet, HashMap};

use crate::error::{GenError, GenResult};

/// Values bound to slot names.
pub type Bindings = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text.
    pub fn parse(text: &str) -> GenResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, ch)) if ch.is_ascii_alphanumeric() || ch == '_' => name.push(ch),
                            Some((at, _)) => {
                                return Err(GenError::MalformedTemplate {
                                    offset: at,
                                    message: "invalid character in slot name",
                                })
                            }
                            None => {
                                return Err(GenError::MalformedTemplate {
                                    offset,
                                    message: "unterminated slot",
                                })
                            }
                        }
                    }
                    if name.is_empty() {
                        return Err(GenError::MalformedTemplate {
                            offset,
                            message: "empty slot name",
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(name));
                }
                '}' => {
                    return Err(GenError::MalformedTemplate {
                        offset,
                        message: "unmatched '}'",
                    })
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Text(literal));
        }
        Ok(Self { segments })
    }

    /// Distinct slot names, sorted.
    pub fn slots(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect()
    }

    /// Fail unless every slot is accepted by `known`.
    pub fn check_slots(&self, consumer: &str, known: impl Fn(&str) -> bool) -> GenResult<()> {
        match self.slots().into_iter().find(|slot| !known(slot)) {
            Some(slot) => Err(GenError::UnknownSlot {
                slot: slot.to_string(),
                consumer: consumer.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Fill every slot from `bindings`.
    pub fn render(&self, bindings: &Bindings) -> GenResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = bindings
                        .get(name)
                        .ok_or_else(|| GenError::UnboundSlot { slot: name.clone() })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

impl std::str::FromStr for Template {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
