//! A small owned XML element tree with safe, defaulting field access.
//!
//! Upstream responses are parsed with `quick-xml`'s namespace-aware reader
//! into [`XmlNode`] trees. Lookups never fail: a missing node, parent, or text
//! is reported as `None`, and [`XmlNode::text_or`] substitutes the caller's
//! default.
//!
//! [`collect_elements`] streams a document and materializes every matching
//! element as its own subtree. A document that is not well-formed fails as a
//! whole; an element whose content cannot be decoded (bad entity, invalid
//! UTF-8) fails on its own and the rest of the document is still read.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// Errors produced while reading XML
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlError {
    /// The document is not well-formed
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The document has no root element
    #[error("XML document has no root element")]
    NoRoot,

    /// An element's content could not be decoded
    #[error("undecodable XML content in <{element}>: {reason}")]
    Decode { element: String, reason: String },
}

/// One element of a parsed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Namespace URI the element name resolved to
    pub namespace: Option<String>,
    /// Local element name (prefix stripped)
    pub name: String,
    /// Attributes by local name, namespace declarations excluded
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlNode>,
    text: Option<String>,
}

impl XmlNode {
    /// Parse a whole document and return its root element
    pub fn parse(xml: &str) -> Result<XmlNode, XmlError> {
        let mut roots = collect_elements(xml, &Selector::root())?;
        match roots.pop() {
            Some(root) => root,
            None => Err(XmlError::NoRoot),
        }
    }

    /// Text content of this element including nested elements, in document
    /// order. `None` when the element holds no text at all.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First direct child with the given namespace and local name
    pub fn child_ns(&self, namespace: &str, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// All direct children with the given local name
    pub fn children_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlNode> + 'n
    where
        'a: 'n,
    {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All direct children with the given namespace and local name
    pub fn children_ns<'a, 'n>(
        &'a self,
        namespace: &'n str,
        name: &'n str,
    ) -> impl Iterator<Item = &'a XmlNode> + 'n
    where
        'a: 'n,
    {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// Every descendant element in document order, excluding `self`
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// All descendants with the given local name, in document order
    pub fn find_all<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlNode> + 'n
    where
        'a: 'n,
    {
        self.descendants().filter(move |n| n.name == name)
    }

    /// Resolve a `/`-separated path of local names.
    ///
    /// The first segment matches any descendant, later segments match direct
    /// children; the first match in document order wins. `"Journal/Title"`
    /// finds the `Title` child of the first `Journal` that has one.
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        let segments: Vec<&str> = path
            .trim_start_matches(".//")
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let (first, rest) = segments.split_first()?;

        self.descendants()
            .filter(|n| n.name == *first)
            .find_map(|candidate| candidate.resolve_children(rest))
    }

    /// Text at `path`, or `default` when the node, a parent, or the text is absent
    pub fn text_or(&self, path: &str, default: &str) -> String {
        self.find(path)
            .and_then(XmlNode::text)
            .unwrap_or(default)
            .to_string()
    }

    fn resolve_children(&self, segments: &[&str]) -> Option<&XmlNode> {
        match segments.split_first() {
            None => Some(self),
            Some((name, rest)) => self
                .children
                .iter()
                .filter(|c| c.name == *name)
                .find_map(|child| child.resolve_children(rest)),
        }
    }

    fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }
}

/// Pre-order iterator over the descendants of an [`XmlNode`]
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, XmlNode>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<&'a XmlNode> {
        loop {
            let level = self.stack.last_mut()?;
            match level.next() {
                Some(node) => {
                    self.stack.push(node.children.iter());
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Where in the document a [`Selector`] may match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    /// Only the root element
    Root,
    /// Only direct children of the root
    Child,
    /// Any element below the root
    Descendant,
}

/// Which elements [`collect_elements`] materializes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selector<'a> {
    namespace: Option<&'a str>,
    name: Option<&'a str>,
    depth: Depth,
}

impl<'a> Selector<'a> {
    /// The root element, whatever its name
    pub fn root() -> Self {
        Self {
            namespace: None,
            name: None,
            depth: Depth::Root,
        }
    }

    /// Elements with this local name anywhere below the root
    pub fn descendants(name: &'a str) -> Self {
        Self {
            namespace: None,
            name: Some(name),
            depth: Depth::Descendant,
        }
    }

    /// Elements with this local name directly under the root
    pub fn children(name: &'a str) -> Self {
        Self {
            namespace: None,
            name: Some(name),
            depth: Depth::Child,
        }
    }

    /// Additionally require the element to be in this namespace
    pub fn in_namespace(mut self, namespace: &'a str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    fn matches(&self, namespace: Option<&str>, name: &[u8], depth: usize) -> bool {
        let depth_ok = match self.depth {
            Depth::Root => depth == 0,
            Depth::Child => depth == 1,
            Depth::Descendant => depth >= 1,
        };
        depth_ok
            && self.name.map_or(true, |n| n.as_bytes() == name)
            && self.namespace.map_or(true, |ns| namespace == Some(ns))
    }
}

/// Stream `xml` and build a subtree for every element matching `selector`.
///
/// The outer `Err` means the document itself is unusable. Each inner
/// `Result` is one matched element; an inner `Err` affects only that element.
/// Matches nested inside another match are returned as part of the outer
/// subtree only.
pub fn collect_elements(
    xml: &str,
    selector: &Selector<'_>,
) -> Result<Vec<Result<XmlNode, XmlError>>, XmlError> {
    let mut reader = NsReader::from_str(xml);
    let mut items = Vec::new();
    let mut capture: Option<TreeBuilder> = None;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let (namespace, event) = match reader.read_resolved_event() {
            Ok((resolved, event)) => (namespace_of(resolved), event),
            Err(e) => return Err(XmlError::Malformed(e.to_string())),
        };

        match event {
            Event::Start(start) | Event::Empty(start) if depth == 0 && saw_root => {
                return Err(XmlError::Malformed(format!(
                    "second root element <{}>",
                    String::from_utf8_lossy(start.local_name().as_ref())
                )));
            }
            Event::Start(start) => {
                saw_root = true;
                open(&mut capture, selector, namespace, &start, depth);
                depth += 1;
            }
            Event::Empty(start) => {
                saw_root = true;
                open(&mut capture, selector, namespace, &start, depth);
                close(&mut capture, &mut items);
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| XmlError::Malformed("unmatched end tag".to_string()))?;
                close(&mut capture, &mut items);
            }
            Event::Text(text) => {
                if let Some(builder) = capture.as_mut() {
                    builder.push_text(text.unescape().map_err(|e| e.to_string()));
                }
            }
            Event::CData(data) => {
                if let Some(builder) = capture.as_mut() {
                    let decoded = String::from_utf8(data.into_inner().into_owned())
                        .map(Cow::Owned)
                        .map_err(|e| e.to_string());
                    builder.push_text(decoded);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(XmlError::Malformed(format!(
            "document ended with {} unclosed element(s)",
            depth
        )));
    }
    if !saw_root {
        return Err(XmlError::NoRoot);
    }

    Ok(items)
}

fn namespace_of(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn open(
    capture: &mut Option<TreeBuilder>,
    selector: &Selector<'_>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    depth: usize,
) {
    if let Some(builder) = capture.as_mut() {
        builder.open(namespace, start);
    } else if selector.matches(namespace.as_deref(), start.local_name().as_ref(), depth) {
        let mut builder = TreeBuilder::default();
        builder.open(namespace, start);
        *capture = Some(builder);
    }
}

fn close(capture: &mut Option<TreeBuilder>, items: &mut Vec<Result<XmlNode, XmlError>>) {
    if let Some(builder) = capture.as_mut() {
        if let Some(finished) = builder.close() {
            items.push(finished);
            *capture = None;
        }
    }
}

/// Assembles one captured subtree. A decoding failure is remembered and
/// reported when the subtree closes, so the surrounding stream stays in step.
#[derive(Debug, Default)]
struct TreeBuilder {
    stack: Vec<XmlNode>,
    error: Option<XmlError>,
}

impl TreeBuilder {
    fn open(&mut self, namespace: Option<String>, start: &BytesStart<'_>) {
        let name = match std::str::from_utf8(start.local_name().as_ref()) {
            Ok(name) => name.to_string(),
            Err(e) => {
                self.fail("?", e.to_string());
                String::from("?")
            }
        };

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let decoded = attr.map_err(|e| e.to_string()).and_then(|attr| {
                if attr.key.as_namespace_binding().is_some() {
                    return Ok(None);
                }
                let key = std::str::from_utf8(attr.key.local_name().as_ref())
                    .map_err(|e| e.to_string())?
                    .to_string();
                let value = attr.unescape_value().map_err(|e| e.to_string())?;
                Ok(Some((key, value.into_owned())))
            });
            match decoded {
                Ok(Some(pair)) => attributes.push(pair),
                Ok(None) => {}
                Err(reason) => self.fail(&name, reason),
            }
        }

        self.stack.push(XmlNode {
            namespace,
            name,
            attributes,
            children: Vec::new(),
            text: None,
        });
    }

    fn push_text(&mut self, text: Result<Cow<'_, str>, String>) {
        match text {
            Ok(text) => {
                for node in self.stack.iter_mut() {
                    node.text.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Err(reason) => {
                let element = self
                    .stack
                    .last()
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                self.fail(&element, reason);
            }
        }
    }

    /// Returns the finished subtree once its outermost element closes
    fn close(&mut self) -> Option<Result<XmlNode, XmlError>> {
        let node = self.stack.pop()?;
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                None
            }
            None => Some(match self.error.take() {
                Some(err) => Err(err),
                None => Ok(node),
            }),
        }
    }

    fn fail(&mut self, element: &str, reason: String) {
        if self.error.is_none() {
            self.error = Some(XmlError::Decode {
                element: element.to_string(),
                reason,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE: &str = r#"<?xml version="1.0"?>
<Set>
  <Article>
    <Journal><Title>Nature</Title></Journal>
    <ArticleTitle>Effect of <i>insulin</i> on mice</ArticleTitle>
    <Empty/>
    <Category term="q-bio" label="Biology"/>
  </Article>
</Set>"#;

    #[test]
    fn test_parse_and_lookup() {
        let root = XmlNode::parse(ARTICLE).unwrap();
        assert_eq!(root.name, "Set");

        assert_eq!(root.text_or("Journal/Title", "none"), "Nature");
        assert_eq!(root.text_or("ArticleTitle", "none"), "Effect of insulin on mice");
        assert_eq!(root.find("Category").and_then(|c| c.attr("term")), Some("q-bio"));
    }

    #[test]
    fn test_missing_path_returns_default() {
        let root = XmlNode::parse(ARTICLE).unwrap();

        assert_eq!(root.text_or("Missing", "fallback"), "fallback");
        assert_eq!(root.text_or("Journal/Missing", "fallback"), "fallback");
        assert_eq!(root.text_or("Missing/Title", "fallback"), "fallback");
        // present node without text
        assert_eq!(root.text_or("Empty", "fallback"), "fallback");
        assert!(root.find("").is_none());
    }

    #[test]
    fn test_find_tries_every_candidate_parent() {
        let root =
            XmlNode::parse("<r><PubDate><Month>1</Month></PubDate><PubDate><Year>2020</Year></PubDate></r>")
                .unwrap();
        assert_eq!(root.text_or("PubDate/Year", "Unknown"), "2020");
        assert!(root.find("PubDate").unwrap().child("Year").is_none());
    }

    fn first_named<'a>(root: &'a XmlNode, name: String) -> Option<&'a XmlNode> {
        root.find_all(&name).next()
    }

    #[test]
    fn test_lookups_outlive_name_arguments() {
        let root = XmlNode::parse("<r><a><b>x</b></a><b>y</b></r>").unwrap();

        let found = {
            let path = String::from(".//a/b");
            root.find(&path)
        };
        assert_eq!(found.and_then(XmlNode::text), Some("x"));

        assert_eq!(first_named(&root, "b".to_string()).and_then(XmlNode::text), Some("x"));

        let children: Vec<&XmlNode> = {
            let name = String::from("b");
            root.children_named(&name).collect::<Vec<_>>()
        };
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text(), Some("y"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = XmlNode::parse("<a><b><c/></b><d/></a>").unwrap();
        let names: Vec<&str> = root.descendants().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "d"]);
    }

    #[test]
    fn test_namespaces_resolved() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
            <entry><arxiv:primary_category term="cs.AI"/><category term="cs.LG"/></entry>
        </feed>"#;
        let root = XmlNode::parse(xml).unwrap();
        let entry = root.child_ns("http://www.w3.org/2005/Atom", "entry").unwrap();

        let atom: Vec<_> = entry
            .children_ns("http://www.w3.org/2005/Atom", "category")
            .collect();
        assert_eq!(atom.len(), 1);
        assert_eq!(atom[0].attr("term"), Some("cs.LG"));
        assert_eq!(
            entry.children[0].namespace.as_deref(),
            Some("http://arxiv.org/schemas/atom")
        );
        // xmlns declarations are not attributes
        assert!(root.attributes.is_empty());
    }

    #[test]
    fn test_collect_isolates_bad_items() {
        let xml = "<set><item>ok</item><item>bad &nosuch; entity</item><item>also ok</item></set>";
        let items = collect_elements(xml, &Selector::descendants("item")).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().text(), Some("ok"));
        assert!(matches!(items[1], Err(XmlError::Decode { .. })));
        assert_eq!(items[2].as_ref().unwrap().text(), Some("also ok"));
    }

    #[test]
    fn test_children_selector_ignores_deeper_matches() {
        let xml = "<feed><entry><entry/></entry><x><entry/></x></feed>";
        let items = collect_elements(xml, &Selector::children("entry")).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().children.len(), 1);
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            XmlNode::parse("<a><b></a>"),
            Err(XmlError::Malformed(_))
        ));
        assert!(matches!(XmlNode::parse("<a><b>"), Err(XmlError::Malformed(_))));
        assert_eq!(XmlNode::parse(""), Err(XmlError::NoRoot));
        assert_eq!(XmlNode::parse("not xml at all"), Err(XmlError::NoRoot));
        assert!(matches!(XmlNode::parse("<a/><b/>"), Err(XmlError::Malformed(_))));
    }

    #[test]
    fn test_cdata_is_text() {
        let root = XmlNode::parse("<a><![CDATA[x < y]]></a>").unwrap();
        assert_eq!(root.text(), Some("x < y"));
    }
}
