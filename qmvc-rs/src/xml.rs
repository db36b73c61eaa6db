//! Minimal XML tree builder for MSBuild documents.
//!
//! Output layout is fixed: two-space indentation, one element per line,
//! text-only elements on a single line, and attribute-only elements
//! self-closed as `<Name a="b" />`.

use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    /// `<Name ... />`
    Empty,
    /// `<Name ...>text</Name>`, even when `text` is empty.
    Text(String),
    /// Children on their own lines, even when there are none.
    Children(Vec<Element>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    body: Body,
}

impl Element {
    /// An element that holds child elements.
    pub fn new(name: impl Into<String>) -> Self {
        Element { name: name.into(), attrs: Vec::new(), body: Body::Children(Vec::new()) }
    }

    /// A self-closing element.
    pub fn empty(name: impl Into<String>) -> Self {
        Element { name: name.into(), attrs: Vec::new(), body: Body::Empty }
    }

    /// An element with text content.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Element { name: name.into(), attrs: Vec::new(), body: Body::Text(text.into()) }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append a child.  Turns an empty or text element into a container.
    pub fn child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        for c in children {
            self.push(c);
        }
        self
    }

    pub fn push(&mut self, child: Element) {
        match &mut self.body {
            Body::Children(list) => list.push(child),
            body => *body = Body::Children(vec![child]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of attribute `key`, if set.
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Child elements (empty for text and self-closing elements).
    pub fn child_elements(&self) -> &[Element] {
        match &self.body {
            Body::Children(list) => list,
            _ => &[],
        }
    }

    /// Text content, if this is a text element.
    pub fn text_content(&self) -> Option<&str> {
        match &self.body {
            Body::Text(t) => Some(t),
            _ => None,
        }
    }

    fn write_to(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", self.name);
        for (k, v) in &self.attrs {
            let _ = write!(out, " {k}=\"{}\"", escape(v, true));
        }
        match &self.body {
            Body::Empty => out.push_str(" />\n"),
            Body::Text(t) => {
                let _ = writeln!(out, ">{}</{}>", escape(t, false), self.name);
            }
            Body::Children(children) => {
                out.push_str(">\n");
                for c in children {
                    c.write_to(out, depth + 1);
                }
                let _ = writeln!(out, "{indent}</{}>", self.name);
            }
        }
    }
}

/// Render `root` as a complete document with an XML declaration.
pub fn render_document(root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    root.write_to(&mut out, 0);
    out
}

fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_all_body_kinds() {
        let root = Element::new("Project")
            .attr("ToolsVersion", "4.0")
            .child(Element::empty("Import").attr("Project", "a.props"))
            .child(Element::text("Keyword", "Win32Proj"))
            .child(Element::text("ForcedIncludeFiles", ""))
            .child(Element::new("ImportGroup").attr("Label", "ExtensionSettings"));
        let expected = concat!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
            "<Project ToolsVersion=\"4.0\">\n",
            "  <Import Project=\"a.props\" />\n",
            "  <Keyword>Win32Proj</Keyword>\n",
            "  <ForcedIncludeFiles></ForcedIncludeFiles>\n",
            "  <ImportGroup Label=\"ExtensionSettings\">\n",
            "  </ImportGroup>\n",
            "</Project>\n",
        );
        assert_eq!(render_document(&root), expected);
    }

    #[test]
    fn escapes_markup() {
        let root = Element::text("A", "x<y & z").attr("B", "\"q\" 'ok'");
        assert_eq!(
            render_document(&root),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<A B=\"&quot;q&quot; 'ok'\">x&lt;y &amp; z</A>\n"
        );
    }

    #[test]
    fn push_turns_leaf_into_container() {
        let mut e = Element::empty("ClCompile").attr("Include", "a.cpp");
        assert!(e.child_elements().is_empty());
        e.push(Element::text("PrecompiledHeader", "NotUsing"));
        assert_eq!(e.child_elements().len(), 1);
        assert_eq!(e.get_attr("Include"), Some("a.cpp"));
        assert_eq!(e.child_elements()[0].text_content(), Some("NotUsing"));
    }
}
