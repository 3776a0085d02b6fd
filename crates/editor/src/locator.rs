//! Mapping between flat buffer offsets and positions in the token tree.

use livecode_highlight::{NodePath, Token, TokenTree};

/// Leaf of the projection plus a character offset inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub leaf: NodePath,
    pub offset: usize,
}

/// Locate offset `k`.
///
/// Walks the leaves in document order and stops at the first one whose
/// cumulative end reaches `k`, so an offset on a boundary between two leaves
/// belongs to the earlier one. Returns `None` past the end of the tree.
pub fn node_at(tree: &TokenTree, k: usize) -> Option<Position> {
    let mut consumed = 0;
    for leaf in tree.leaves() {
        let len = leaf.text.chars().count();
        if consumed + len >= k {
            return Some(Position {
                leaf: leaf.path,
                offset: k - consumed,
            });
        }
        consumed += len;
    }
    None
}

/// Flat offset of a position; `None` if it does not address a leaf
pub fn offset_of(tree: &TokenTree, position: &Position) -> Option<usize> {
    let mut consumed = 0;
    for leaf in tree.leaves() {
        if leaf.path == position.leaf {
            let len = leaf.text.chars().count();
            return (position.offset <= len).then_some(consumed + position.offset);
        }
        consumed += leaf.text.chars().count();
    }
    None
}

/// Offset at which the node at `path` starts
pub fn offset_of_node(tree: &TokenTree, path: &NodePath) -> usize {
    tree.leaves()
        .iter()
        .take_while(|leaf| leaf.path < *path)
        .map(|leaf| leaf.text.chars().count())
        .sum()
}

/// Innermost token of `class` enclosing the leaf at `path`
fn enclosing_at<'a>(tree: &'a TokenTree, path: &NodePath, class: &str) -> Option<(NodePath, &'a Token)> {
    let indices = path.indices();
    (1..indices.len()).rev().find_map(|depth| {
        let prefix = NodePath::new(indices[..depth].to_vec());
        let token = tree.get(&prefix)?.as_token()?;
        token.has_class(class).then_some((prefix, token))
    })
}

/// Leaf starting where the leaf at `position` ends, if `position` sits on
/// that end
fn leaf_after(tree: &TokenTree, position: &Position) -> Option<NodePath> {
    let leaves = tree.leaves();
    let index = leaves.iter().position(|leaf| leaf.path == position.leaf)?;
    if position.offset != leaves[index].text.chars().count() {
        return None;
    }
    leaves.get(index + 1).map(|leaf| leaf.path.clone())
}

/// Innermost token of `class` around `offset`.
///
/// The leaf returned by [`node_at`] is tried first. When the offset sits
/// exactly on its end, the leaf that starts there is tried as well, so a
/// caret placed just before a token still finds it.
pub fn enclosing_token<'a>(
    tree: &'a TokenTree,
    offset: usize,
    class: &str,
) -> Option<(NodePath, &'a Token)> {
    let position = node_at(tree, offset)?;
    enclosing_at(tree, &position.leaf, class)
        .or_else(|| enclosing_at(tree, &leaf_after(tree, &position)?, class))
}

fn embedded_language(tree: &TokenTree, path: &NodePath) -> Option<String> {
    tree.ancestors(path)
        .into_iter()
        .find_map(|token| token.language.clone())
}

/// Language of the innermost embedded region at `offset`, falling back to
/// the language of the whole tree. Like [`enclosing_token`], an offset on
/// a leaf boundary also considers the leaf starting there.
pub fn language_at(tree: &TokenTree, offset: usize) -> Option<String> {
    node_at(tree, offset)
        .and_then(|position| {
            embedded_language(tree, &position.leaf)
                .or_else(|| embedded_language(tree, &leaf_after(tree, &position)?))
        })
        .or_else(|| tree.language.clone())
}
