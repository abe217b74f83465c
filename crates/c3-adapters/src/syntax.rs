//! Tree-sitter plumbing shared by the TypeScript and Python adapters.

use c3_core::construct::AdapterError;
use tree_sitter::{Language, Node, Parser, Tree};

/// Parses `source`, failing on any error or missing node.
pub(crate) fn parse_tree(language: &Language, source: &str) -> Result<Tree, AdapterError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| AdapterError::Setup(e.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| AdapterError::Setup("parser returned no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let position = first_error(root).map_or(root.start_position(), |n| n.start_position());
        return Err(AdapterError::Syntax {
            message: format!(
                "{}:{}: unexpected syntax",
                position.row + 1,
                position.column + 1
            ),
        });
    }
    Ok(tree)
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(Node::has_error)
        .find_map(first_error)
}

/// `root` and every node below it, in source order.
pub(crate) fn descendants(root: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Source text of a node.
pub(crate) fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// 1-based line of a node.
pub(crate) fn line(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Text of a string literal without its quotes.
pub(crate) fn unquote<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    text(node, src).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
