#![forbid(unsafe_code)]

//! Compound selectors: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`.
//!
//! No combinators and no selector lists. `li.active[data-id="3"]` parses;
//! `ul > li` and `a, b` do not.

use std::str::FromStr;

use crate::document::{Document, DomError, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Id(String),
    Class(String),
    Has(String),
    Equals(String, String),
}

/// A parsed compound selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    tag: Option<String>,
    parts: Vec<Part>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident<'a>(input: &'a str, original: &str) -> Result<(&'a str, &'a str), DomError> {
    let end = input
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(input.len(), |(i, _)| i);
    if end == 0 {
        return Err(DomError::InvalidSelector(original.to_string()));
    }
    Ok(input.split_at(end))
}

impl Selector {
    /// Parse a compound selector.
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector(input.to_string());
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let mut selector = Self::default();
        let mut rest = trimmed;
        if let Some(after) = rest.strip_prefix('*') {
            rest = after;
        } else if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let (tag, after) = take_ident(rest, input)?;
            selector.tag = Some(tag.to_ascii_lowercase());
            rest = after;
        }

        while let Some(c) = rest.chars().next() {
            match c {
                '#' => {
                    let (id, after) = take_ident(&rest[1..], input)?;
                    selector.parts.push(Part::Id(id.to_string()));
                    rest = after;
                }
                '.' => {
                    let (class, after) = take_ident(&rest[1..], input)?;
                    selector.parts.push(Part::Class(class.to_string()));
                    rest = after;
                }
                '[' => {
                    let close = rest.find(']').ok_or_else(invalid)?;
                    let body = rest[1..close].trim();
                    rest = &rest[close + 1..];
                    match body.split_once('=') {
                        None => {
                            let (name, tail) = take_ident(body, input)?;
                            if !tail.is_empty() {
                                return Err(invalid());
                            }
                            selector.parts.push(Part::Has(name.to_string()));
                        }
                        Some((name, value)) => {
                            let (name, tail) = take_ident(name.trim(), input)?;
                            if !tail.is_empty() {
                                return Err(invalid());
                            }
                            let value = unquote(value.trim()).ok_or_else(invalid)?;
                            selector
                                .parts
                                .push(Part::Equals(name.to_string(), value.to_string()));
                        }
                    }
                }
                _ => return Err(invalid()),
            }
        }
        Ok(selector)
    }

    /// Whether `node` is an element matching every part of this selector.
    #[must_use]
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(tag) = doc.tag(node) else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|t| t != tag) {
            return false;
        }
        self.parts.iter().all(|part| match part {
            Part::Id(id) => doc.attribute(node, "id") == Some(id.as_str()),
            Part::Class(class) => doc.has_class(node, class),
            Part::Has(name) => doc.has_attribute(node, name),
            Part::Equals(name, value) if name == "class" => {
                doc.classes(node).join(" ") == *value
            }
            Part::Equals(name, value) => doc.attribute(node, name) == Some(value.as_str()),
        })
    }
}

fn unquote(value: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote) {
            return inner.strip_suffix(quote);
        }
    }
    (!value.is_empty() && value.chars().all(is_ident_char)).then_some(value)
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
