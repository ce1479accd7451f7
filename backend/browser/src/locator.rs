//! Element locators and the structural path algorithm.
//!
//! Most UI elements are addressed by a stable attribute (name, class, CSS).
//! Nodes without one are addressed by a [`StructuralPath`]: the chain of tag
//! names from the document root down to the node, with a 1-based position
//! wherever a parent has several children sharing the same tag.

use std::fmt;

use scraper::ElementRef;
use serde::{Deserialize, Serialize};

/// How the browser adapter should find an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// `name` attribute match.
    ByName(String),
    /// Single class name match.
    ByClass(String),
    /// CSS selector.
    ByCss(String),
    /// Tag/position path from the document root.
    ByStructuralPath(StructuralPath),
}

impl Locator {
    pub fn name(value: impl Into<String>) -> Self {
        Locator::ByName(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        Locator::ByClass(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::ByCss(value.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::ByName(v) => write!(f, "name={v}"),
            Locator::ByClass(v) => write!(f, "class={v}"),
            Locator::ByCss(v) => write!(f, "css={v}"),
            Locator::ByStructuralPath(p) => write!(f, "path={p}"),
        }
    }
}

/// Element tag with its optional namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedTag {
    pub prefix: Option<String>,
    pub local: String,
}

impl QualifiedTag {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }
}

impl fmt::Display for QualifiedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// One level of a structural path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    pub tag: QualifiedTag,
    /// 1-based rank among same-tag siblings; `None` when the tag is unique.
    pub position: Option<usize>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{}[{pos}]", self.tag),
            None => write!(f, "{}", self.tag),
        }
    }
}

/// Root-to-node address, rendered as `/html/body/p[1]/i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuralPath {
    pub segments: Vec<PathSegment>,
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl From<StructuralPath> for Locator {
    fn from(path: StructuralPath) -> Self {
        Locator::ByStructuralPath(path)
    }
}

/// Minimal view of a document tree needed to compute structural paths.
///
/// Non-element nodes (text, comments, the document itself) report no tag.
pub trait StructuralNode: Clone {
    fn tag(&self) -> Option<QualifiedTag>;
    fn parent_node(&self) -> Option<Self>;
    fn child_nodes(&self) -> Vec<Self>;
    fn is_same(&self, other: &Self) -> bool;
}

/// Compute the structural path of `node`.
///
/// A text node is addressed through its parent element. The walk stops at the
/// first ancestor without a tag, i.e. the document root. Returns `None` when
/// no element is reachable.
pub fn structural_path<N: StructuralNode>(node: &N) -> Option<StructuralPath> {
    let mut current = if node.tag().is_some() {
        Some(node.clone())
    } else {
        node.parent_node()
    };

    let mut segments = Vec::new();
    while let Some(element) = current {
        let Some(tag) = element.tag() else { break };
        let parent = element.parent_node();
        let position = parent
            .as_ref()
            .and_then(|p| same_tag_rank(p, &element, &tag));
        segments.push(PathSegment { tag, position });
        current = parent;
    }

    if segments.is_empty() {
        return None;
    }
    segments.reverse();
    Some(StructuralPath { segments })
}

/// Rank of `element` among the children of `parent` sharing `tag`, or `None`
/// when it is the only one.
fn same_tag_rank<N: StructuralNode>(parent: &N, element: &N, tag: &QualifiedTag) -> Option<usize> {
    let siblings: Vec<N> = parent
        .child_nodes()
        .into_iter()
        .filter(|child| child.tag().as_ref() == Some(tag))
        .collect();
    if siblings.len() < 2 {
        return None;
    }
    siblings
        .iter()
        .position(|sibling| sibling.is_same(element))
        .map(|idx| idx + 1)
}

impl<'a> StructuralNode for ElementRef<'a> {
    fn tag(&self) -> Option<QualifiedTag> {
        let name = &self.value().name;
        Some(QualifiedTag {
            prefix: name.prefix.as_deref().map(str::to_string),
            local: name.local.to_string(),
        })
    }

    fn parent_node(&self) -> Option<Self> {
        self.parent().and_then(ElementRef::wrap)
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children().filter_map(ElementRef::wrap).collect()
    }

    fn is_same(&self, other: &Self) -> bool {
        std::ptr::eq(self.value(), other.value())
    }
}

/// First element following `element` among its siblings.
pub fn next_sibling_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    /// Hand-built tree so namespace prefixes and text nodes can be modelled
    /// exactly, independent of an HTML parser's normalisation.
    struct Arena {
        nodes: Vec<FixtureData>,
    }

    struct FixtureData {
        tag: Option<QualifiedTag>,
        parent: Option<usize>,
        children: Vec<usize>,
    }

    impl Arena {
        fn new() -> Self {
            Self {
                nodes: vec![FixtureData {
                    tag: None,
                    parent: None,
                    children: vec![],
                }],
            }
        }

        fn add(&mut self, parent: usize, tag: Option<QualifiedTag>) -> usize {
            let id = self.nodes.len();
            self.nodes.push(FixtureData {
                tag,
                parent: Some(parent),
                children: vec![],
            });
            self.nodes[parent].children.push(id);
            id
        }

        fn node(&self, id: usize) -> FixtureNode<'_> {
            FixtureNode { arena: self, id }
        }
    }

    #[derive(Clone)]
    struct FixtureNode<'a> {
        arena: &'a Arena,
        id: usize,
    }

    impl<'a> StructuralNode for FixtureNode<'a> {
        fn tag(&self) -> Option<QualifiedTag> {
            self.arena.nodes[self.id].tag.clone()
        }

        fn parent_node(&self) -> Option<Self> {
            self.arena.nodes[self.id].parent.map(|id| self.arena.node(id))
        }

        fn child_nodes(&self) -> Vec<Self> {
            self.arena.nodes[self.id]
                .children
                .iter()
                .map(|&id| self.arena.node(id))
                .collect()
        }

        fn is_same(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    #[test]
    fn html_path_indexes_repeated_paragraphs_only() {
        let html = Html::parse_document(
            "<html><head><title>title</title></head>\
             <body><p>p <i>1</i></p><p>p <i>2</i></p></body></html>",
        );
        let selector = Selector::parse("body > p > i").unwrap();
        let first_i = html.select(&selector).next().unwrap();
        let path = structural_path(&first_i).unwrap();
        assert_eq!(path.to_string(), "/html/body/p[1]/i");
    }

    #[test]
    fn html_path_for_second_paragraph() {
        let html = Html::parse_document(
            "<html><body><p>p <i>1</i></p><p>p <i>2</i></p></body></html>",
        );
        let selector = Selector::parse("p").unwrap();
        let second_p = html.select(&selector).nth(1).unwrap();
        assert_eq!(
            structural_path(&second_p).unwrap().to_string(),
            "/html/body/p[2]"
        );
    }

    #[test]
    fn namespaced_siblings_are_ranked_per_prefix() {
        let mut arena = Arena::new();
        let doc = arena.add(0, Some(QualifiedTag::new("doc")));
        arena.add(doc, Some(QualifiedTag::prefixed("ns1", "elm")));
        arena.add(doc, Some(QualifiedTag::prefixed("ns2", "elm")));
        let target = arena.add(doc, Some(QualifiedTag::prefixed("ns2", "elm")));

        let path = structural_path(&arena.node(target)).unwrap();
        assert_eq!(path.to_string(), "/doc/ns2:elm[2]");
    }

    #[test]
    fn sole_prefixed_tag_has_no_index() {
        let mut arena = Arena::new();
        let doc = arena.add(0, Some(QualifiedTag::new("doc")));
        let target = arena.add(doc, Some(QualifiedTag::prefixed("ns1", "elm")));
        arena.add(doc, Some(QualifiedTag::prefixed("ns2", "elm")));

        let path = structural_path(&arena.node(target)).unwrap();
        assert_eq!(path.to_string(), "/doc/ns1:elm");
        assert_eq!(path.segments[1].tag.prefix.as_deref(), Some("ns1"));
    }

    #[test]
    fn text_node_resolves_to_parent_element() {
        let mut arena = Arena::new();
        let html = arena.add(0, Some(QualifiedTag::new("html")));
        let body = arena.add(html, Some(QualifiedTag::new("body")));
        arena.add(body, Some(QualifiedTag::new("div")));
        let second = arena.add(body, Some(QualifiedTag::new("div")));
        let text = arena.add(second, None);

        let from_text = structural_path(&arena.node(text)).unwrap();
        let from_div = structural_path(&arena.node(second)).unwrap();
        assert_eq!(from_text, from_div);
        assert_eq!(from_text.to_string(), "/html/body/div[2]");
    }

    #[test]
    fn document_root_has_no_path() {
        let arena = Arena::new();
        assert!(structural_path(&arena.node(0)).is_none());
    }

    #[test]
    fn path_is_deterministic() {
        let html = Html::parse_document(
            "<html><body><ul><li>a</li><li>b</li><li>c</li></ul></body></html>",
        );
        let selector = Selector::parse("li").unwrap();
        let third = html.select(&selector).nth(2).unwrap();
        let first = structural_path(&third).unwrap();
        let second = structural_path(&third).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "/html/body/ul/li[3]");
    }

    #[test]
    fn parsed_colon_tags_keep_their_full_name() {
        let html = Html::parse_document(
            "<doc><ns1:elm></ns1:elm><ns2:elm></ns2:elm><ns2:elm></ns2:elm></doc>",
        );
        let doc = html
            .select(&Selector::parse("doc").unwrap())
            .next()
            .unwrap();
        let last = doc.child_nodes().pop().unwrap();
        assert_eq!(
            structural_path(&last).unwrap().to_string(),
            "/html/body/doc/ns2:elm[2]"
        );
    }

    #[test]
    fn next_sibling_skips_text() {
        let html = Html::parse_document(
            "<html><body><div class=\"day\">1</div>\n  <div class=\"day\">2</div></body></html>",
        );
        let first = html
            .select(&Selector::parse("div.day").unwrap())
            .next()
            .unwrap();
        let next = next_sibling_element(first).unwrap();
        assert_eq!(next.text().collect::<String>(), "2");
        assert_eq!(
            structural_path(&next).unwrap().to_string(),
            "/html/body/div[2]"
        );
    }

    #[test]
    fn locator_display_names_the_strategy() {
        assert_eq!(Locator::name("q").to_string(), "name=q");
        assert_eq!(Locator::css("a > b").to_string(), "css=a > b");
        let path = StructuralPath {
            segments: vec![PathSegment {
                tag: QualifiedTag::new("html"),
                position: None,
            }],
        };
        assert_eq!(Locator::from(path).to_string(), "path=/html");
    }
}
