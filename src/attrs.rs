//! Attribute, class-list, and inline-style facet.
//!
//! Attributes are an insertion-ordered map per element. The class attribute
//! is viewed as a whitespace-separated token list; the style attribute is
//! backed by a parsed key/value mapping that is the source of truth for
//! style writes. Both follow the same convention: when the view becomes
//! empty, the attribute is deleted rather than left as an empty string.

use indexmap::IndexMap;
use indextree::NodeId;

use crate::arena::Document;
use crate::error::Result;

impl Document {
    /// Attribute value by name. `None` for absent attributes and for
    /// non-element handles.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)
            .ok()
            .and_then(|elem| elem.attrs.get(name))
            .map(String::as_str)
    }

    /// Set an attribute, overwriting in place if present (the attribute keeps
    /// its original position) and appending otherwise. Writing `style`
    /// re-seeds the parsed style mapping so the two stay consistent.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let elem = self.element_mut(id)?;
        elem.attrs.insert(name.to_string(), value.to_string());
        if name == "style" {
            elem.style = parse_style(value);
        }
        Ok(())
    }

    /// Remove an attribute, returning the old value if it existed.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        let elem = self.element_mut(id)?;
        let old = elem.attrs.shift_remove(name);
        if name == "style" {
            elem.style.clear();
        }
        Ok(old)
    }

    /// Class tokens in attribute order. Empty for elements without a class
    /// attribute and for non-element handles.
    pub fn class_list(&self, id: NodeId) -> Vec<String> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// True if the element carries the exact class token.
    pub fn has_class(&self, id: NodeId, token: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == token))
    }

    /// Append a class token; a no-op if the token is already present.
    pub fn add_class(&mut self, id: NodeId, token: &str) -> Result<()> {
        let elem = self.element_mut(id)?;
        let current = elem.attrs.get("class").cloned().unwrap_or_default();
        if current.split_whitespace().any(|t| t == token) {
            return Ok(());
        }
        let joined = if current.is_empty() {
            token.to_string()
        } else {
            format!("{current} {token}")
        };
        elem.attrs.insert("class".to_string(), joined);
        Ok(())
    }

    /// Remove a class token if present; deleting the attribute entirely when
    /// the last token goes.
    pub fn remove_class(&mut self, id: NodeId, token: &str) -> Result<()> {
        let elem = self.element_mut(id)?;
        let Some(current) = elem.attrs.get("class").cloned() else {
            return Ok(());
        };
        if !current.split_whitespace().any(|t| t == token) {
            return Ok(());
        }
        let kept: Vec<&str> = current.split_whitespace().filter(|t| *t != token).collect();
        if kept.is_empty() {
            elem.attrs.shift_remove("class");
        } else {
            elem.attrs.insert("class".to_string(), kept.join(" "));
        }
        Ok(())
    }

    /// The parsed style mapping, in declaration order.
    pub fn style(&self, id: NodeId) -> Result<&IndexMap<String, String>> {
        Ok(&self.element(id)?.style)
    }

    /// Merge key/value pairs into the style mapping (last write wins per key,
    /// already-set keys keep their position) and re-serialize the whole
    /// mapping back to the `style` attribute.
    pub fn set_style<K, V, I>(&mut self, id: NodeId, pairs: I) -> Result<()>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let elem = self.element_mut(id)?;
        for (key, value) in pairs {
            elem.style.insert(key.into(), value.into());
        }
        if elem.style.is_empty() {
            elem.attrs.shift_remove("style");
        } else {
            let serialized = serialize_style(&elem.style);
            elem.attrs.insert("style".to_string(), serialized);
        }
        Ok(())
    }
}

/// Parse a style attribute string. Segments split on `;`, each on the first
/// `:`, so values containing colons (URLs) survive intact.
pub(crate) fn parse_style(s: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for segment in s.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if let Some((key, value)) = segment.split_once(':') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

/// Serialize a style mapping as `"key: value; key: value"`.
pub(crate) fn serialize_style(map: &IndexMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
