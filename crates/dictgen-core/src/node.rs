//! Renderer-agnostic output tree
//!
//! Expansion results are assembled from three node kinds: literal text,
//! ordered groups, and spans produced by a post-pass transform. Renderers
//! live outside this crate; the tree only records structure and text.

use serde::{Deserialize, Serialize};

/// A node of the expansion output tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputNode {
    /// Literal text
    Raw(String),
    /// Ordered children with no meaning beyond their order
    Group(Vec<OutputNode>),
    /// Children produced by the post-pass transform named by the tag
    Transformed(String, Vec<OutputNode>),
}

impl OutputNode {
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    pub fn group(children: impl IntoIterator<Item = OutputNode>) -> Self {
        Self::Group(children.into_iter().collect())
    }

    pub fn transformed(tag: impl Into<String>, children: impl IntoIterator<Item = OutputNode>) -> Self {
        Self::Transformed(tag.into(), children.into_iter().collect())
    }

    /// An empty group
    pub fn empty() -> Self {
        Self::Group(Vec::new())
    }

    /// Child nodes; `Raw` has none
    pub fn children(&self) -> &[OutputNode] {
        match self {
            OutputNode::Raw(_) => &[],
            OutputNode::Group(children) | OutputNode::Transformed(_, children) => children,
        }
    }

    /// Tag of a transformed node
    pub fn transform_tag(&self) -> Option<&str> {
        match self {
            OutputNode::Transformed(tag, _) => Some(tag),
            _ => None,
        }
    }

    /// True if the subtree carries no text at all
    pub fn is_empty(&self) -> bool {
        match self {
            OutputNode::Raw(text) => text.is_empty(),
            OutputNode::Group(children) | OutputNode::Transformed(_, children) => {
                children.iter().all(OutputNode::is_empty)
            }
        }
    }

    /// Concatenated text of every `Raw` node, depth first
    pub fn flatten_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            OutputNode::Raw(text) => out.push_str(text),
            OutputNode::Group(children) | OutputNode::Transformed(_, children) => {
                for child in children {
                    child.write_text(out);
                }
            }
        }
    }

    /// Every `Raw` text in depth-first order
    pub fn raw_texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        self.collect_raw(&mut texts);
        texts
    }

    fn collect_raw<'a>(&'a self, texts: &mut Vec<&'a str>) {
        match self {
            OutputNode::Raw(text) => texts.push(text),
            OutputNode::Group(children) | OutputNode::Transformed(_, children) => {
                for child in children {
                    child.collect_raw(texts);
                }
            }
        }
    }
}

impl From<&str> for OutputNode {
    fn from(text: &str) -> Self {
        Self::raw(text)
    }
}

impl From<String> for OutputNode {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}
