//! CSS-subset selector engine.
//!
//! Supported grammar: tag names, `*`, `#id`, `.class` (token membership),
//! `[attr]` / `[attr=value]`, descendant (whitespace) and child (`>`)
//! combinators, and comma-separated alternation. Anything else is rejected
//! with [`DomError::UnsupportedSelector`], including a leading combinator.
//!
//! Matching is rightmost-first: a candidate must satisfy the last compound
//! selector itself, then its ancestor chain must satisfy the rest. Scoped
//! queries ([`Document::select`]) may climb to, but never above, the search
//! root.

use std::str::FromStr;

use indextree::NodeId;

use crate::arena::Document;
use crate::error::{DomError, Result};

/// A parsed selector list (comma-separated alternation of chains).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Vec<SelectorPart>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    step: SelectorStep,
    /// Relation to the previous (left) part; `None` on the leftmost part.
    combinator: Option<Combinator>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SelectorStep {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrCondition {
    Exists(String),
    Eq(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(selector: &str) -> Result<Self> {
        let mut groups = Vec::new();
        for group in split_groups(selector)? {
            groups.push(parse_chain(&group)?);
        }
        Ok(Self { groups })
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Document {
    /// All elements under `root` matching `selector`, in document order.
    /// Alternation arms share one pre-order walk, so results are naturally
    /// deduplicated and ordered.
    pub fn select(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let sel = Selector::parse(selector)?;
        Ok(self
            .descendants(root)
            .filter(|&id| self.matches_selector(id, &sel, Some(root)))
            .collect())
    }

    /// First element under `root` matching `selector`, in document order.
    pub fn select_one(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let sel = Selector::parse(selector)?;
        Ok(self
            .descendants(root)
            .find(|&id| self.matches_selector(id, &sel, Some(root))))
    }

    /// Whether `node` itself satisfies `selector`. The rightmost compound is
    /// evaluated against the node, ancestor constraints against its real
    /// ancestors.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        let sel = Selector::parse(selector)?;
        Ok(self.matches_selector(node, &sel, None))
    }

    /// Walk `node`, then its ancestors, returning the first that matches;
    /// `None` once the root boundary is passed.
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let sel = Selector::parse(selector)?;
        Ok(node
            .ancestors(&self.arena)
            .find(|&a| self.matches_selector(a, &sel, None)))
    }

    fn matches_selector(&self, id: NodeId, sel: &Selector, scope: Option<NodeId>) -> bool {
        if !self.is_element(id) {
            return false;
        }
        sel.groups
            .iter()
            .any(|chain| self.matches_chain(id, chain, scope))
    }

    fn matches_chain(&self, id: NodeId, parts: &[SelectorPart], scope: Option<NodeId>) -> bool {
        let Some((last, rest)) = parts.split_last() else {
            return false;
        };
        if !self.matches_step(id, &last.step) {
            return false;
        }
        if rest.is_empty() {
            return true;
        }
        match last.combinator.unwrap_or(Combinator::Descendant) {
            Combinator::Child => self
                .scoped_parent(id, scope)
                .is_some_and(|p| self.matches_chain(p, rest, scope)),
            Combinator::Descendant => {
                let mut current = self.scoped_parent(id, scope);
                while let Some(ancestor) = current {
                    if self.matches_chain(ancestor, rest, scope) {
                        return true;
                    }
                    current = self.scoped_parent(ancestor, scope);
                }
                false
            }
        }
    }

    /// Parent usable as an ancestor constraint: elements only, and never
    /// above the search root.
    fn scoped_parent(&self, id: NodeId, scope: Option<NodeId>) -> Option<NodeId> {
        if Some(id) == scope {
            return None;
        }
        let parent = self.parent(id)?;
        if !self.is_element(parent) {
            return None;
        }
        Some(parent)
    }

    fn matches_step(&self, id: NodeId, step: &SelectorStep) -> bool {
        let Ok(elem) = self.element(id) else {
            return false;
        };
        if let Some(tag) = &step.tag
            && !elem.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(want) = &step.id
            && elem.attrs.get("id") != Some(want)
        {
            return false;
        }
        for class in &step.classes {
            let has = elem
                .attrs
                .get("class")
                .is_some_and(|c| c.split_whitespace().any(|t| t == class));
            if !has {
                return false;
            }
        }
        for cond in &step.attrs {
            let ok = match cond {
                AttrCondition::Exists(name) => elem.attrs.contains_key(name),
                AttrCondition::Eq(name, value) => elem.attrs.get(name) == Some(value),
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

/// Split on commas outside brackets.
fn split_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(DomError::UnsupportedSelector(selector.to_string()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            ',' if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(DomError::UnsupportedSelector(selector.to_string()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(DomError::UnsupportedSelector(selector.to_string()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(DomError::UnsupportedSelector(selector.to_string()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

/// Split a single chain into compound tokens and `>` combinator tokens.
fn tokenize(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;

    for ch in selector.chars() {
        match ch {
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                if bracket_depth == 0 {
                    return Err(DomError::UnsupportedSelector(selector.to_string()));
                }
                bracket_depth -= 1;
                current.push(ch);
            }
            '>' if bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
                tokens.push(">".to_string());
            }
            ch if ch.is_ascii_whitespace() && bracket_depth == 0 => {
                if !current.trim().is_empty() {
                    tokens.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 {
        return Err(DomError::UnsupportedSelector(selector.to_string()));
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    Ok(tokens)
}

fn parse_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(DomError::UnsupportedSelector(selector.to_string()));
    }

    let tokens = tokenize(selector)?;
    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokens {
        if token == ">" {
            if pending.is_some() || parts.is_empty() {
                return Err(DomError::UnsupportedSelector(selector.to_string()));
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let step = parse_step(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(DomError::UnsupportedSelector(selector.to_string()));
    }
    Ok(parts)
}

fn parse_step(part: &str) -> Result<SelectorStep> {
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal {
                    return Err(DomError::UnsupportedSelector(part.to_string()));
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                i += 1;
                let Some((id, next)) = parse_ident(part, i) else {
                    return Err(DomError::UnsupportedSelector(part.to_string()));
                };
                if step.id.replace(id).is_some() {
                    return Err(DomError::UnsupportedSelector(part.to_string()));
                }
                i = next;
            }
            b'.' => {
                i += 1;
                let Some((class, next)) = parse_ident(part, i) else {
                    return Err(DomError::UnsupportedSelector(part.to_string()));
                };
                step.classes.push(class);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr_condition(part, i)?;
                step.attrs.push(cond);
                i = next;
            }
            _ => {
                // Tag names must come first in a compound selector
                if step.tag.is_some()
                    || step.universal
                    || step.id.is_some()
                    || !step.classes.is_empty()
                    || !step.attrs.is_empty()
                {
                    return Err(DomError::UnsupportedSelector(part.to_string()));
                }
                let Some((tag, next)) = parse_ident(part, i) else {
                    return Err(DomError::UnsupportedSelector(part.to_string()));
                };
                step.tag = Some(tag);
                i = next;
            }
        }
    }

    if step == SelectorStep::default() {
        return Err(DomError::UnsupportedSelector(part.to_string()));
    }
    Ok(step)
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let mut end = start;
    for (idx, ch) in src[start..].char_indices() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' {
            end = start + idx + ch.len_utf8();
        } else {
            break;
        }
    }
    if end == start {
        None
    } else {
        Some((src[start..end].to_string(), end))
    }
}

fn parse_attr_condition(src: &str, start: usize) -> Result<(AttrCondition, usize)> {
    let rest = &src[start + 1..];
    let Some(end) = rest.find(']') else {
        return Err(DomError::UnsupportedSelector(src.to_string()));
    };
    let inner = rest[..end].trim();
    let cond = match inner.split_once('=') {
        None => {
            if inner.is_empty() {
                return Err(DomError::UnsupportedSelector(src.to_string()));
            }
            AttrCondition::Exists(inner.to_string())
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomError::UnsupportedSelector(src.to_string()));
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            AttrCondition::Eq(name.to_string(), value.to_string())
        }
    };
    Ok((cond, start + 1 + end + 1))
}
