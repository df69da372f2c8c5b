//! Trie data structure for category paths.
//!
//! The Trie stores categories under their full `input <THAT> that <TOPIC> topic`
//! token path. Each node caches the minimum number of tokens still needed to
//! reach a category below it, which lets the matcher abandon branches that the
//! remaining input is too short to complete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::token::Token;

/// No category is reachable below a node
pub const UNREACHABLE: usize = usize::MAX;

/// One rule: a path and the template it answers with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Normalized pattern text
    pub pattern: String,
    /// Normalized that text
    pub that: String,
    /// Normalized topic text
    pub topic: String,
    /// Template source text
    pub template: String,
    /// Where this category was loaded from (several after append/combine merges)
    pub sources: Vec<String>,
}

impl Category {
    /// Create a category with a single source
    pub fn new(
        pattern: impl Into<String>,
        that: impl Into<String>,
        topic: impl Into<String>,
        template: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Category {
            pattern: pattern.into(),
            that: that.into(),
            topic: topic.into(),
            template: template.into(),
            sources: vec![source.into()],
        }
    }

    /// The path in `pattern : that : topic` form
    pub fn path(&self) -> String {
        format!("{} : {} : {}", self.pattern, self.that, self.topic)
    }

    /// Sources joined for display
    pub fn provenance(&self) -> String {
        self.sources.join(", ")
    }

    /// Check if this category was loaded from the given source
    pub fn has_source(&self, source: &str) -> bool {
        self.sources.iter().any(|s| s == source)
    }
}

/// A node in the Trie
#[derive(Debug)]
pub struct TrieNode {
    /// Children nodes, keyed by token
    pub children: BTreeMap<Token, TrieNode>,
    /// The category stored at this node, if a path ends here
    pub category: Option<Category>,
    /// Minimum number of tokens from here to a category
    min_depth: usize,
}

impl Default for TrieNode {
    fn default() -> Self {
        TrieNode {
            children: BTreeMap::new(),
            category: None,
            min_depth: UNREACHABLE,
        }
    }
}

// Children are dropped from a worklist so path length never reaches the call stack
impl Drop for TrieNode {
    fn drop(&mut self) {
        let mut stack: Vec<TrieNode> = std::mem::take(&mut self.children).into_values().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

impl TrieNode {
    /// Create a new empty node
    pub fn new() -> Self {
        TrieNode::default()
    }

    /// Check if this node has any children
    pub fn can_walk(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if a category ends at this node
    pub fn is_match(&self) -> bool {
        self.category.is_some()
    }

    /// Minimum number of tokens needed to reach a category from here
    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    /// Get a child by token
    pub fn child(&self, token: &Token) -> Option<&TrieNode> {
        self.children.get(token)
    }

    fn is_dead(&self) -> bool {
        self.category.is_none() && self.children.is_empty()
    }
}

/// A Trie of categories keyed by token path
#[derive(Debug)]
pub struct Trie {
    /// The root node
    root: TrieNode,
    /// Number of categories in the trie
    category_count: usize,
    /// Number of nodes, including the root
    node_count: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Create a new empty Trie
    pub fn new() -> Self {
        Trie {
            root: TrieNode::new(),
            category_count: 0,
            node_count: 1,
        }
    }

    /// Get the number of categories in the trie
    pub fn len(&self) -> usize {
        self.category_count
    }

    /// Check if the trie holds no categories
    pub fn is_empty(&self) -> bool {
        self.category_count == 0
    }

    /// Get the number of nodes, including the root
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Get a reference to the root node (for external traversal)
    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Walk the trie by one token, returning the next node if it exists
    pub fn walk<'a>(&'a self, token: &Token, current: Option<&'a TrieNode>) -> Option<&'a TrieNode> {
        current.unwrap_or(&self.root).child(token)
    }

    /// Get the category stored at a path
    pub fn get(&self, path: &[Token]) -> Option<&Category> {
        let mut current = &self.root;
        for token in path {
            current = current.children.get(token)?;
        }
        current.category.as_ref()
    }

    /// Apply `merge` to the slot at the end of `path`, creating nodes as needed.
    ///
    /// The slot holds the existing category, if any. Depths along the path are
    /// refreshed afterwards, and the category count follows the slot's
    /// before/after occupancy.
    pub fn upsert<F, R>(&mut self, path: &[Token], merge: F) -> R
    where
        F: FnOnce(&mut Option<Category>) -> R,
    {
        let mut created = 0;
        let mut current = &mut self.root;
        for token in path {
            current = current.children.entry(token.clone()).or_insert_with(|| {
                created += 1;
                TrieNode::new()
            });
        }

        let was_occupied = current.category.is_some();
        let result = merge(&mut current.category);
        let is_occupied = current.category.is_some();

        self.node_count += created;
        match (was_occupied, is_occupied) {
            (false, true) => self.category_count += 1,
            (true, false) => self.category_count -= 1,
            _ => {}
        }
        self.refresh_path(path);
        result
    }

    /// Remove the category at a path, pruning nodes left empty
    pub fn remove(&mut self, path: &[Token]) -> Option<Category> {
        let mut current = &mut self.root;
        for token in path {
            current = current.children.get_mut(token)?;
        }
        let removed = current.category.take()?;
        self.category_count -= 1;

        // Nodes along the path, root first
        let mut chain = Vec::with_capacity(path.len() + 1);
        let mut node = &self.root;
        chain.push(node);
        for token in path {
            match node.children.get(token) {
                Some(child) => {
                    node = child;
                    chain.push(node);
                }
                None => break,
            }
        }

        // The shallowest node of the dead tail hanging off the path
        let mut first_dead = chain.len();
        for i in (1..chain.len()).rev() {
            let node = chain[i];
            let dead = node.is_dead()
                || (node.category.is_none()
                    && node.children.len() == 1
                    && first_dead == i + 1);
            if !dead {
                break;
            }
            first_dead = i;
        }

        if first_dead < chain.len() {
            let pruned = chain.len() - first_dead;
            let parent = &path[..first_dead - 1];
            if let Some(node) = self.node_mut(parent) {
                node.children.remove(&path[first_dead - 1]);
                self.node_count -= pruned;
            }
        }

        self.refresh_path(path);
        Some(removed)
    }

    /// Remove every category for which `doomed` returns true.
    ///
    /// Returns the number of categories removed.
    pub fn remove_where<F>(&mut self, doomed: F) -> usize
    where
        F: Fn(&Category) -> bool,
    {
        let mut paths = Vec::new();
        self.for_each_path(|path, category| {
            if doomed(category) {
                paths.push(path.to_vec());
            }
        });

        paths
            .iter()
            .filter(|path| self.remove(path).is_some())
            .count()
    }

    /// Visit every category in path order
    pub fn for_each_category<F>(&self, mut visit: F)
    where
        F: FnMut(&Category),
    {
        self.for_each_path(|_, category| visit(category));
    }

    /// Depth-first walk over every category with its full path
    fn for_each_path<F>(&self, mut visit: F)
    where
        F: FnMut(&[Token], &Category),
    {
        let mut path: Vec<Token> = Vec::new();
        let mut stack: Vec<(usize, Option<&Token>, &TrieNode)> = vec![(0, None, &self.root)];

        while let Some((depth, token, node)) = stack.pop() {
            path.truncate(depth.saturating_sub(1));
            if let Some(token) = token {
                path.push(token.clone());
            }
            if let Some(ref category) = node.category {
                visit(&path, category);
            }
            for (token, child) in node.children.iter().rev() {
                stack.push((depth + 1, Some(token), child));
            }
        }
    }

    fn node_mut(&mut self, path: &[Token]) -> Option<&mut TrieNode> {
        let mut current = &mut self.root;
        for token in path {
            current = current.children.get_mut(token)?;
        }
        Some(current)
    }

    /// Recompute `min_depth` for every node on `path`, deepest first
    fn refresh_path(&mut self, path: &[Token]) {
        // (has category, best depth through children off the path)
        let mut levels: Vec<(bool, usize)> = Vec::with_capacity(path.len() + 1);
        let mut current = Some(&self.root);
        for i in 0..=path.len() {
            let Some(node) = current else {
                break;
            };
            let next = path.get(i);
            let off_path = node
                .children
                .iter()
                .filter(|(token, _)| Some(*token) != next)
                .map(|(_, child)| child.min_depth.saturating_add(1))
                .min()
                .unwrap_or(UNREACHABLE);
            levels.push((node.category.is_some(), off_path));
            current = next.and_then(|token| node.children.get(token));
        }

        let mut depths = vec![UNREACHABLE; levels.len()];
        let mut below = UNREACHABLE;
        for (i, (has_category, off_path)) in levels.into_iter().enumerate().rev() {
            let depth = if has_category {
                0
            } else {
                off_path.min(below.saturating_add(1))
            };
            depths[i] = depth;
            below = depth;
        }

        let mut current = &mut self.root;
        for (i, depth) in depths.into_iter().enumerate() {
            current.min_depth = depth;
            let Some(token) = path.get(i) else {
                break;
            };
            match current.children.get_mut(token) {
                Some(child) => current = child,
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::category_path;

    fn insert(trie: &mut Trie, pattern: &str, template: &str) -> bool {
        let path = category_path(pattern, "*", "*");
        let category = Category::new(pattern, "*", "*", template, "test");
        trie.upsert(&path, |slot| {
            if slot.is_some() {
                false
            } else {
                *slot = Some(category);
                true
            }
        })
    }

    #[test]
    fn test_trie_insert_and_get() {
        let mut trie = Trie::new();

        assert!(insert(&mut trie, "HELLO", "hi"));
        assert!(insert(&mut trie, "HELLO THERE", "hi there"));
        assert!(!insert(&mut trie, "HELLO", "again"));

        assert_eq!(trie.len(), 2);
        let found = trie.get(&category_path("HELLO", "*", "*")).unwrap();
        assert_eq!(found.template, "hi");
        assert!(trie.get(&category_path("HELLO WORLD", "*", "*")).is_none());
    }

    #[test]
    fn test_node_count() {
        let mut trie = Trie::new();
        insert(&mut trie, "A B", "t");
        // root + A + B + <THAT> + * + <TOPIC> + *
        assert_eq!(trie.node_count(), 7);
        insert(&mut trie, "A C", "t");
        assert_eq!(trie.node_count(), 12);
    }

    #[test]
    fn test_min_depth() {
        let mut trie = Trie::new();
        insert(&mut trie, "A B C", "long");
        assert_eq!(trie.root().min_depth(), 7);
        insert(&mut trie, "A", "short");
        assert_eq!(trie.root().min_depth(), 5);

        let a = trie.walk(&Token::Word("A".into()), None).unwrap();
        assert_eq!(a.min_depth(), 4);
    }

    #[test]
    fn test_remove_prunes_nodes() {
        let mut trie = Trie::new();
        insert(&mut trie, "A B", "ab");
        insert(&mut trie, "A", "a");
        let before = trie.node_count();

        let removed = trie.remove(&category_path("A B", "*", "*")).unwrap();
        assert_eq!(removed.template, "ab");
        assert_eq!(trie.len(), 1);
        // B, <THAT>, *, <TOPIC>, * under A are gone
        assert_eq!(trie.node_count(), before - 5);
        assert_eq!(trie.root().min_depth(), 5);

        assert!(trie.remove(&category_path("A B", "*", "*")).is_none());
    }

    #[test]
    fn test_remove_last_category_empties_trie() {
        let mut trie = Trie::new();
        insert(&mut trie, "ONLY", "x");
        trie.remove(&category_path("ONLY", "*", "*"));
        assert!(trie.is_empty());
        assert_eq!(trie.node_count(), 1);
        assert!(!trie.root().can_walk());
        assert_eq!(trie.root().min_depth(), UNREACHABLE);
    }

    #[test]
    fn test_remove_where() {
        let mut trie = Trie::new();
        insert(&mut trie, "A", "a");
        insert(&mut trie, "B", "b");
        insert(&mut trie, "B C", "bc");

        let removed = trie.remove_where(|c| c.template.starts_with('b'));
        assert_eq!(removed, 2);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.node_count(), 6);

        let mut seen = Vec::new();
        trie.for_each_category(|c| seen.push(c.template.clone()));
        assert_eq!(seen, vec!["a"]);
    }

    #[test]
    fn test_deep_path_insert_and_remove() {
        let mut trie = Trie::new();
        let path: Vec<Token> = (0..100_000).map(|i| Token::Word(format!("W{}", i % 7))).collect();
        let category = Category::new("DEEP", "*", "*", "deep", "test");

        trie.upsert(&path, |slot| *slot = Some(category));
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.node_count(), 100_001);
        assert_eq!(trie.root().min_depth(), 100_000);

        let mut seen = 0;
        trie.for_each_category(|_| seen += 1);
        assert_eq!(seen, 1);

        assert!(trie.remove(&path).is_some());
        assert_eq!(trie.node_count(), 1);
        assert_eq!(trie.root().min_depth(), UNREACHABLE);

        trie.upsert(&path, |slot| *slot = Some(Category::new("DEEP", "*", "*", "again", "test")));
        assert_eq!(trie.remove_where(|c| c.template == "again"), 1);
        assert!(trie.is_empty());
    }
}
