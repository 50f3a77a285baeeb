// SPDX-License-Identifier: MIT OR Apache-2.0

//! The owned element tree and its lookup operations.
//!
//! Lookups are case-insensitive on local names and ignore prefixes; the
//! namespace-qualified variants additionally filter on the resolved
//! namespace URI.

/// An attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Local name (no prefix).
    pub name: String,
    /// Prefix as written, when present (`xml` in `xml:base`).
    pub prefix: Option<String>,
    /// Resolved namespace URI, when the prefix is bound.
    pub namespace: Option<String>,
    /// Unescaped attribute value.
    pub value: String,
}

/// An element with its resolved namespace, attributes, children, and
/// directly contained text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Local name (no prefix).
    pub name: String,
    /// Resolved namespace URI, when declared.
    pub namespace: Option<String>,
    /// Attributes in document order, namespace declarations included.
    pub attributes: Vec<XmlAttribute>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated direct text and CDATA content, unescaped.
    pub text: String,
}

impl XmlElement {
    /// Trimmed direct text content.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// First child whose local name matches `name` (case-insensitive).
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All children whose local name matches `name`, in document order.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }

    /// First child matching both namespace URI and local name.
    #[must_use]
    pub fn child_ns(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| {
            c.name.eq_ignore_ascii_case(name) && c.namespace.as_deref() == Some(namespace)
        })
    }

    /// Trimmed text of the first child named `name`, when non-empty.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(|c| c.text().to_string()).filter(|t| !t.is_empty())
    }

    /// Value of the first attribute whose local name matches `name`
    /// (case-insensitive, prefix ignored).
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name) && a.prefix.as_deref() != Some("xmlns"))
            .map(|a| a.value.as_str())
    }

    /// Value of the first attribute matching both namespace URI and local
    /// name.
    #[must_use]
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| {
                a.name.eq_ignore_ascii_case(name) && a.namespace.as_deref() == Some(namespace)
            })
            .map(|a| a.value.as_str())
    }

    /// Repeated elements that may or may not sit under a wrapper of their
    /// plural name: direct children named `item` first, then children named
    /// `item` of every child named `wrapper`.
    #[must_use]
    pub fn wrapped_or_repeated<'a>(&'a self, wrapper: &'a str, item: &'a str) -> Vec<&'a XmlElement> {
        let mut out: Vec<&XmlElement> = self.children_named(item).collect();
        for w in self.children_named(wrapper) {
            out.extend(w.children_named(item));
        }
        out
    }

    /// Namespace declarations on this element: `(prefix, uri)` pairs, the
    /// default declaration carrying `None`.
    #[must_use]
    pub fn namespace_declarations(&self) -> Vec<(Option<String>, String)> {
        self.attributes
            .iter()
            .filter_map(|a| {
                if a.prefix.as_deref() == Some("xmlns") {
                    Some((Some(a.name.clone()), a.value.clone()))
                } else if a.prefix.is_none() && a.name.eq_ignore_ascii_case("xmlns") {
                    Some((None, a.value.clone()))
                } else {
                    None
                }
            })
            .collect()
    }

    /// `true` when the element has at least one child element.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(name: &str) -> XmlElement {
        XmlElement {
            name: name.into(),
            ..XmlElement::default()
        }
    }

    #[test]
    fn child_lookup_is_case_insensitive() {
        let mut root = el("manifest");
        root.children.push(el("Organizations"));
        assert!(root.child("organizations").is_some());
        assert!(root.child("ORGANIZATIONS").is_some());
        assert!(root.child("resources").is_none());
    }

    #[test]
    fn attr_lookup_ignores_prefix_but_not_declarations() {
        let mut root = el("resource");
        root.attributes.push(XmlAttribute {
            name: "base".into(),
            prefix: Some("xml".into()),
            namespace: Some("http://www.w3.org/XML/1998/namespace".into()),
            value: "shared/".into(),
        });
        root.attributes.push(XmlAttribute {
            name: "adlcp".into(),
            prefix: Some("xmlns".into()),
            namespace: None,
            value: "http://www.adlnet.org/xsd/adlcp_v1p3".into(),
        });
        assert_eq!(root.attr("BASE"), Some("shared/"));
        // The xmlns:adlcp declaration must not be found as an "adlcp" attr.
        assert_eq!(root.attr("adlcp"), None);
        let decls = root.namespace_declarations();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].0.as_deref(), Some("adlcp"));
    }

    #[test]
    fn wrapped_or_repeated_collects_both_shapes() {
        let mut root = el("sequencing");
        root.children.push(el("objective"));
        let mut wrapper = el("objectives");
        wrapper.children.push(el("objective"));
        wrapper.children.push(el("objective"));
        root.children.push(wrapper);
        assert_eq!(root.wrapped_or_repeated("objectives", "objective").len(), 3);
    }

    #[test]
    fn text_is_trimmed() {
        let mut root = el("title");
        root.text = "  Golf \n".into();
        assert_eq!(root.text(), "Golf");
    }
}
