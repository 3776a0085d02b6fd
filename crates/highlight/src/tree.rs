//! Highlighted projection of a source text.
//!
//! A [`TokenTree`] is a tree of classified spans whose text leaves, read in
//! document order, reproduce the source exactly. It is rebuilt wholesale on
//! every change and never edited in place.

/// Node of the projection: raw text or a classified span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Token(Token),
}

impl Node {
    /// Concatenated text of the node and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    /// Length in characters
    pub fn len_chars(&self) -> usize {
        match self {
            Node::Text(text) => text.chars().count(),
            Node::Token(token) => token.children.iter().map(Node::len_chars).sum(),
        }
    }

    /// Token payload, if this node is a classified span
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Text(_) => None,
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Token(token) => token.children.iter().for_each(|child| child.push_text(out)),
        }
    }
}

/// Classified span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Capture name, e.g. `comment` or `string.special`
    pub kind: String,
    /// Language of an embedded region, when the highlighter knows it
    pub language: Option<String>,
    pub children: Vec<Node>,
}

impl Token {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            language: None,
            children: Vec::new(),
        }
    }

    /// Annotate the token with the language of its content
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Whether the token is of `class` or one of its dotted refinements
    /// (`string.special` is a `string`)
    pub fn has_class(&self, class: &str) -> bool {
        match self.kind.strip_prefix(class) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }

    /// Concatenated text of the token
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|child| child.push_text(&mut out));
        out
    }
}

/// Address of a node as child indices from the root.
///
/// Ordering is lexicographic, which is document order: an ancestor sorts
/// before its descendants and earlier siblings before later ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Path of the `index`-th child of this node
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

/// Text-bearing terminal of the projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<'a> {
    pub path: NodePath,
    pub text: &'a str,
}

/// Root of the projection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenTree {
    /// Language the source was highlighted as
    pub language: Option<String>,
    pub children: Vec<Node>,
}

impl TokenTree {
    /// Unclassified tree: one leaf holding the whole source
    pub fn plain(source: &str, language: Option<&str>) -> Self {
        Self {
            language: language.map(str::to_string),
            children: vec![Node::Text(source.to_string())],
        }
    }

    /// Rendered text (equal to the highlighted source)
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.children.iter().for_each(|child| child.push_text(&mut out));
        out
    }

    /// Total rendered length in characters
    pub fn len_chars(&self) -> usize {
        self.children.iter().map(Node::len_chars).sum()
    }

    /// All text leaves in document order
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut leaves = Vec::new();
        collect_leaves(&self.children, &NodePath::default(), &mut leaves);
        leaves
    }

    /// Node at `path`
    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.children.get(*first)?;
        for &index in rest {
            node = node.as_token()?.children.get(index)?;
        }
        Some(node)
    }

    /// Tokens enclosing the node at `path`, innermost first.
    /// The node itself is included when it is a token.
    pub fn ancestors(&self, path: &NodePath) -> Vec<&Token> {
        let mut tokens = Vec::new();
        let mut children = &self.children;
        for &index in path.indices() {
            let Some(Node::Token(token)) = children.get(index) else {
                break;
            };
            tokens.push(token);
            children = &token.children;
        }
        tokens.reverse();
        tokens
    }
}

fn collect_leaves<'a>(nodes: &'a [Node], path: &NodePath, out: &mut Vec<Leaf<'a>>) {
    for (index, node) in nodes.iter().enumerate() {
        let child_path = path.child(index);
        match node {
            Node::Text(text) => out.push(Leaf {
                path: child_path,
                text,
            }),
            Node::Token(token) => collect_leaves(&token.children, &child_path, out),
        }
    }
}

/// Incremental construction of a tree from open/text/close events
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    root: Vec<Node>,
    open: Vec<Token>,
}

impl TreeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open(&mut self, token: Token) {
        self.open.push(token);
    }

    pub(crate) fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let siblings = match self.open.last_mut() {
            Some(token) => &mut token.children,
            None => &mut self.root,
        };
        match siblings.last_mut() {
            Some(Node::Text(prev)) => prev.push_str(text),
            _ => siblings.push(Node::Text(text.to_string())),
        }
    }

    pub(crate) fn close(&mut self) {
        let Some(token) = self.open.pop() else {
            return;
        };
        if token.children.is_empty() {
            return;
        }
        match self.open.last_mut() {
            Some(parent) => parent.children.push(Node::Token(token)),
            None => self.root.push(Node::Token(token)),
        }
    }

    pub(crate) fn finish(mut self, language: Option<&str>) -> TokenTree {
        while !self.open.is_empty() {
            self.close();
        }
        if self.root.is_empty() {
            return TokenTree::plain("", language);
        }
        TokenTree {
            language: language.map(str::to_string),
            children: self.root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenTree {
        // let x = "a\"b"; // hi
        let mut builder = TreeBuilder::new();
        builder.open(Token::new("keyword"));
        builder.text("let");
        builder.close();
        builder.text(" x = ");
        builder.open(Token::new("string"));
        builder.text("\"a");
        builder.open(Token::new("escape"));
        builder.text("\\\"");
        builder.close();
        builder.text("b\"");
        builder.close();
        builder.text("; ");
        builder.open(Token::new("comment"));
        builder.text("// hi");
        builder.close();
        builder.finish(Some("rust"))
    }

    #[test]
    fn test_text_round_trip() {
        let tree = sample();
        assert_eq!(tree.text(), "let x = \"a\\\"b\"; // hi");
        assert_eq!(tree.len_chars(), 21);
        assert_eq!(tree.language.as_deref(), Some("rust"));
    }

    #[test]
    fn test_leaves_in_document_order() {
        let tree = sample();
        let leaves = tree.leaves();
        let texts: Vec<&str> = leaves.iter().map(|leaf| leaf.text).collect();
        assert_eq!(texts, ["let", " x = ", "\"a", "\\\"", "b\"", "; ", "// hi"]);

        let paths: Vec<&NodePath> = leaves.iter().map(|leaf| &leaf.path).collect();
        assert!(paths.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let tree = sample();
        let escape_leaf = NodePath::new(vec![2, 1, 0]);
        let kinds: Vec<&str> = tree
            .ancestors(&escape_leaf)
            .iter()
            .map(|token| token.kind.as_str())
            .collect();
        assert_eq!(kinds, ["escape", "string"]);
        assert!(tree.ancestors(&NodePath::new(vec![1])).is_empty());
    }

    #[test]
    fn test_get_by_path() {
        let tree = sample();
        let node = tree.get(&NodePath::new(vec![4, 0])).unwrap();
        assert_eq!(node.text(), "// hi");
        assert!(tree.get(&NodePath::new(vec![9])).is_none());
        assert!(tree.get(&NodePath::default()).is_none());
    }

    #[test]
    fn test_has_class() {
        let token = Token::new("string.special");
        assert!(token.has_class("string"));
        assert!(token.has_class("string.special"));
        assert!(!token.has_class("str"));
        assert!(!Token::new("comment").has_class("comment.doc"));
    }

    #[test]
    fn test_path_relations() {
        let parent = NodePath::new(vec![1]);
        let child = parent.child(3);
        assert_eq!(child.indices(), &[1, 3]);
        assert!(parent < child);
        assert!(child < NodePath::new(vec![2]));
    }

    #[test]
    fn test_empty_builder_yields_one_leaf() {
        let tree = TreeBuilder::new().finish(None);
        assert_eq!(tree.leaves().len(), 1);
        assert_eq!(tree.len_chars(), 0);
    }
}
