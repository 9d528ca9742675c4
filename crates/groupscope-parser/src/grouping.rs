//! The parsed tree: operator-tagged fragments nested in groupings.

/// A leaf: the operator joining it to its siblings and the reference the
/// fragment parser produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment<Op, R> {
    pub operator: Op,
    pub reference: R,
}

impl<Op, R> Fragment<Op, R> {
    pub fn new(operator: Op, reference: R) -> Self {
        Self {
            operator,
            reference,
        }
    }
}

/// An internal node.
///
/// `operator` applies to the grouping as a whole and was assigned by the
/// enclosing context. Children keep source order. A grouping returned by the
/// parser is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping<Op, R> {
    pub operator: Op,
    pub group: Vec<Node<Op, R>>,
}

/// Either child kind of a [`Grouping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<Op, R> {
    Fragment(Fragment<Op, R>),
    Grouping(Grouping<Op, R>),
}

impl<Op, R> Grouping<Op, R> {
    /// Create an empty grouping.
    pub fn new(operator: Op) -> Self {
        Self {
            operator,
            group: Vec::new(),
        }
    }

    pub fn push(&mut self, node: impl Into<Node<Op, R>>) {
        self.group.push(node.into());
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    /// Direct children in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, Node<Op, R>> {
        self.group.iter()
    }

    /// Every fragment of the tree, depth first in source order.
    pub fn fragments(&self) -> Vec<&Fragment<Op, R>> {
        let mut fragments = Vec::new();
        self.collect_fragments(&mut fragments);
        fragments
    }

    /// Nesting depth. A grouping holding only fragments has depth 1.
    pub fn depth(&self) -> usize {
        1 + self
            .group
            .iter()
            .filter_map(Node::as_grouping)
            .map(Grouping::depth)
            .max()
            .unwrap_or(0)
    }

    fn collect_fragments<'a>(&'a self, fragments: &mut Vec<&'a Fragment<Op, R>>) {
        for node in &self.group {
            match node {
                Node::Fragment(fragment) => fragments.push(fragment),
                Node::Grouping(grouping) => grouping.collect_fragments(fragments),
            }
        }
    }
}

impl<'a, Op, R> IntoIterator for &'a Grouping<Op, R> {
    type Item = &'a Node<Op, R>;
    type IntoIter = std::slice::Iter<'a, Node<Op, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<Op, R> Node<Op, R> {
    /// The operator joining this node to its siblings.
    pub fn operator(&self) -> &Op {
        match self {
            Node::Fragment(fragment) => &fragment.operator,
            Node::Grouping(grouping) => &grouping.operator,
        }
    }

    pub fn as_fragment(&self) -> Option<&Fragment<Op, R>> {
        match self {
            Node::Fragment(fragment) => Some(fragment),
            Node::Grouping(_) => None,
        }
    }

    pub fn as_grouping(&self) -> Option<&Grouping<Op, R>> {
        match self {
            Node::Grouping(grouping) => Some(grouping),
            Node::Fragment(_) => None,
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, Node::Fragment(_))
    }

    pub fn is_grouping(&self) -> bool {
        matches!(self, Node::Grouping(_))
    }
}

impl<Op, R> From<Fragment<Op, R>> for Node<Op, R> {
    fn from(fragment: Fragment<Op, R>) -> Self {
        Node::Fragment(fragment)
    }
}

impl<Op, R> From<Grouping<Op, R>> for Node<Op, R> {
    fn from(grouping: Grouping<Op, R>) -> Self {
        Node::Grouping(grouping)
    }
}
