//! Indented text rendering of a resolved grouping.
//!
//! ```text
//! and group
//!   and number 1
//!   or group
//!     and component pi = 3.141592653589793
//!     and word x
//! ```

use std::fmt;

use groupscope::{
    Grouping, Node, ParseOutcome,
    scope::{ScopeId, ScopeTree},
};

use crate::{
    catalog::{COMPONENTS, Value},
    recognizers::Leaf,
};

/// Displays a parse outcome, looking components up from `scope`.
pub struct Rendered<'a> {
    outcome: &'a ParseOutcome<'a, String, Leaf>,
    tree: &'a ScopeTree<Value>,
    scope: ScopeId,
}

impl<'a> Rendered<'a> {
    pub fn new(
        outcome: &'a ParseOutcome<'a, String, Leaf>,
        tree: &'a ScopeTree<Value>,
        scope: ScopeId,
    ) -> Self {
        Self {
            outcome,
            tree,
            scope,
        }
    }

    fn write_grouping(
        &self,
        f: &mut fmt::Formatter<'_>,
        grouping: &Grouping<String, Leaf>,
        depth: usize,
    ) -> fmt::Result {
        writeln!(f, "{:indent$}{} group", "", grouping.operator, indent = depth * 2)?;
        for node in grouping {
            match node {
                Node::Grouping(inner) => self.write_grouping(f, inner, depth + 1)?,
                Node::Fragment(fragment) => {
                    write!(f, "{:indent$}{} ", "", fragment.operator, indent = (depth + 1) * 2)?;
                    self.write_leaf(f, &fragment.reference)?;
                    writeln!(f)?;
                }
            }
        }
        Ok(())
    }

    fn write_leaf(&self, f: &mut fmt::Formatter<'_>, leaf: &Leaf) -> fmt::Result {
        match leaf {
            Leaf::Number(number) => write!(f, "number {number}"),
            Leaf::Text(text) => write!(f, "text {text:?}"),
            Leaf::Word(word) => write!(f, "word {word}"),
            Leaf::Component(name) => match self.tree.lookup(self.scope, name, COMPONENTS, true) {
                Some(value) => write!(f, "component {name} = {value}"),
                None => write!(f, "component {name} (unresolved)"),
            },
        }
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome.grouping {
            Some(grouping) => self.write_grouping(f, grouping, 0)?,
            None => writeln!(f, "empty")?,
        }
        if !self.outcome.remaining.is_empty() {
            writeln!(f, "remaining {:?}", self.outcome.remaining)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use groupscope::{
        EndCondition, Fragment,
        reference::InstanceReference,
        scope::AddOptions,
    };

    use super::*;

    fn outcome(grouping: Option<Grouping<String, Leaf>>, remaining: &str) -> ParseOutcome<'_, String, Leaf> {
        ParseOutcome {
            remaining,
            grouping,
            end_condition: EndCondition::InputEnd,
            diagnostics: Vec::new(),
            unclosed_groups: 0,
        }
    }

    #[test]
    fn test_render_nested() {
        let mut tree = ScopeTree::with_slots([COMPONENTS]);
        let root = tree.create_scope(None, "Root");
        tree.add_item(
            root,
            InstanceReference::new("answer", Value::Number(42.0)).into(),
            COMPONENTS,
            AddOptions::new(),
        )
        .unwrap();

        let mut inner = Grouping::new("or".to_string());
        inner.push(Fragment::new("and".to_string(), Leaf::Component("answer".to_string())));
        inner.push(Fragment::new("or".to_string(), Leaf::Component("missing".to_string())));
        let mut grouping = Grouping::new("and".to_string());
        grouping.push(Fragment::new("and".to_string(), Leaf::Number(1.0)));
        grouping.push(inner);
        grouping.push(Fragment::new("and".to_string(), Leaf::Text("hi".to_string())));

        let outcome = outcome(Some(grouping), "");
        let rendered = Rendered::new(&outcome, &tree, root).to_string();

        assert_eq!(
            rendered,
            "and group\n  and number 1\n  or group\n    and component answer = 42\n    or component missing (unresolved)\n  and text \"hi\"\n"
        );
    }

    #[test]
    fn test_render_empty_with_remaining() {
        let mut tree = ScopeTree::<Value>::new();
        let root = tree.create_scope(None, "Root");
        let outcome = outcome(None, "<< tail");

        let rendered = Rendered::new(&outcome, &tree, root).to_string();
        assert_eq!(rendered, "empty\nremaining \"<< tail\"\n");
    }
}
