//! The markup tree handed back to the host.
//!
//! The tree is a small subset of TeX math: rows, atoms, scripts, commands with
//!     arguments and color groups.
//! [Node::to_tex] serializes it back to TeX source.

use crate::token;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    /// A sequence of nodes.
    Row(Vec<Node>),
    /// Digits and decimal markers.
    Number(String),
    /// Signs, comparators, products and other symbols.
    Operator(String),
    /// Raw TeX, like the value of an option.
    Tex(String),
    /// Text mode material, serialized as `\text{...}`.
    Text(String),
    /// A command applied to braced arguments, like `\frac{a}{b}`.
    Command { name: String, args: Vec<Node> },
    Superscript { base: Box<Node>, script: Box<Node> },
    Subscript { base: Box<Node>, script: Box<Node> },
    /// A group in a color, serialized as `{\color{red}...}`.
    Color { color: String, body: Box<Node> },
}

impl Node {
    pub fn empty() -> Node {
        Node::Row(vec![])
    }

    pub fn tex<S: Into<String>>(s: S) -> Node {
        Node::Tex(s.into())
    }

    pub fn command<S: Into<String>>(name: S, args: Vec<Node>) -> Node {
        Node::Command {
            name: name.into(),
            args,
        }
    }

    pub fn superscript(base: Node, script: Node) -> Node {
        Node::Superscript {
            base: Box::new(base),
            script: Box::new(script),
        }
    }

    pub fn subscript(base: Node, script: Node) -> Node {
        Node::Subscript {
            base: Box::new(base),
            script: Box::new(script),
        }
    }

    /// Wraps the node in a color group, unless the color is [None].
    pub fn colored(self, color: Option<&str>) -> Node {
        match color {
            None => self,
            Some(color) => Node::Color {
                color: color.to_string(),
                body: Box::new(self),
            },
        }
    }

    /// Builds a row, flattening nested rows and dropping empty nodes.
    pub fn row<I: IntoIterator<Item = Node>>(nodes: I) -> Node {
        let mut row = vec![];
        for node in nodes {
            match node {
                Node::Row(inner) => row.extend(inner),
                node if node.is_empty() => {}
                node => row.push(node),
            }
        }
        Node::Row(row)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Node::Row(nodes) => nodes.iter().all(Node::is_empty),
            Node::Number(s) | Node::Operator(s) | Node::Tex(s) => s.is_empty(),
            Node::Text(_)
            | Node::Command { .. }
            | Node::Superscript { .. }
            | Node::Subscript { .. }
            | Node::Color { .. } => false,
        }
    }

    /// Serializes the tree as TeX source.
    pub fn to_tex(&self) -> String {
        let mut writer = Writer::default();
        writer.node(self);
        writer.out
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_tex())
    }
}

#[derive(Default)]
struct Writer {
    out: String,
}

impl Writer {
    /// Appends source, separating a control word from a following letter.
    fn push(&mut self, s: &str) {
        if s.starts_with(|c: char| c.is_ascii_alphabetic()) && self.ends_with_control_word() {
            self.out.push(' ');
        }
        self.out.push_str(s);
    }

    fn ends_with_control_word(&self) -> bool {
        let without_letters = self.out.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        without_letters.len() < self.out.len()
            && token::ends_with_unescaped_backslash(without_letters)
    }

    fn group(&mut self, node: &Node) {
        self.push("{");
        self.node(node);
        self.push("}");
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Row(nodes) => {
                for node in nodes {
                    self.node(node);
                }
            }
            Node::Number(s) | Node::Operator(s) | Node::Tex(s) => self.push(s),
            Node::Text(s) => {
                self.push(r"\text{");
                self.out.push_str(s);
                self.push("}");
            }
            Node::Command { name, args } => {
                self.push(name);
                for arg in args {
                    self.group(arg);
                }
            }
            Node::Superscript { base, script } => {
                self.base(base);
                self.push("^");
                self.group(script);
            }
            Node::Subscript { base, script } => {
                self.base(base);
                self.push("_");
                self.group(script);
            }
            Node::Color { color, body } => {
                self.push(r"{\color{");
                self.out.push_str(color);
                self.push("}");
                self.node(body);
                self.push("}");
            }
        }
    }

    /// Writes the base of a script, grouping it if it is more than one atom.
    fn base(&mut self, base: &Node) {
        match base {
            Node::Row(nodes) if nodes.len() != 1 => self.group(base),
            _ => self.node(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_flattens_and_skips_empty() {
        let row = Node::row([
            Node::Number("1".into()),
            Node::row([Node::Operator("+".into()), Node::empty()]),
            Node::Tex("".into()),
        ]);
        assert_eq!(
            row,
            Node::Row(vec![Node::Number("1".into()), Node::Operator("+".into())])
        );
    }

    #[test]
    fn serialize_scripts_and_commands() {
        let node = Node::row([
            Node::Number("1.5".into()),
            Node::Tex(r"\times".into()),
            Node::superscript(Node::Number("10".into()), Node::Number("3".into())),
            Node::Tex(r"\,".into()),
            Node::superscript(
                Node::command(r"\mathrm", vec![Node::Tex("m".into())]),
                Node::Number("2".into()),
            ),
        ]);
        assert_eq!(node.to_tex(), r"1.5\times10^{3}\,\mathrm{m}^{2}");
    }

    #[test]
    fn control_word_followed_by_letter() {
        let node = Node::row([Node::Tex(r"\mu".into()), Node::Tex("m".into())]);
        assert_eq!(node.to_tex(), r"\mu m");
        let node = Node::row([Node::Tex(r"\,".into()), Node::Tex("m".into())]);
        assert_eq!(node.to_tex(), r"\,m");
    }

    #[test]
    fn color_group() {
        let node = Node::Number("1".into()).colored(Some("red"));
        assert_eq!(node.to_tex(), r"{\color{red}1}");
        assert_eq!(Node::Number("1".into()).colored(None).to_tex(), "1");
    }

    #[test]
    fn text_and_grouped_base() {
        let node = Node::superscript(
            Node::Row(vec![Node::Tex("a".into()), Node::Tex("b".into())]),
            Node::Text("x y".into()),
        );
        assert_eq!(node.to_tex(), r"{ab}^{\text{x y}}");
    }
}
