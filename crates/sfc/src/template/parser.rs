use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, SourceLocation};
use crate::scanner::{
    is_end_tag_start, is_tag_start, scan_end_tag, scan_start_tag, skip_comment, Cursor,
};
use phf::{phf_set, Set};

const NATIVE_TAGS: Set<&str> = phf_set! {
    // HTML_TAGS
    "html","body","base","head","link","meta","style","title","address","article","aside","footer",
    "header","h1","h2","h3","h4","h5","h6","nav","section","div","dd","dl","dt","figcaption", "figure",
    "picture","hr","img","li","main","ol","p","pre","ul","a","b","abbr","bdi","bdo","br","cite","code",
    "data","dfn","em","i","kbd","mark","q","rp","rt","ruby","s","samp","small","span","strong","sub","sup",
    "time","u","var","wbr","area","audio","map","track","video","embed","object","param","source",
    "canvas","script","noscript","del","ins","caption","col","colgroup","table","thead","tbody","td",
    "th","tr","button","datalist","fieldset","form","input","label","legend","meter","optgroup",
    "option","output","progress","select","textarea","details","dialog","menu",
    "summary","template","blockquote","iframe","tfoot",
    // SVG_TAGS
    "svg","animate","animateMotion","animateTransform","circle","clipPath","defs","desc",
    "ellipse","filter","foreignObject","g","image","line","linearGradient","marker","mask",
    "metadata","path","pattern","polygon","polyline","radialGradient","rect","stop","switch",
    "symbol","text","textPath","tspan","use","view",
};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_native_tag(s: &str) -> bool {
    NATIVE_TAGS.contains(s)
}

fn is_void_tag(s: &str) -> bool {
    VOID_TAGS.contains(&s)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Whitespace {
    #[default]
    Condense,
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPart<'a> {
    Static(String),
    Expr(&'a str),
}

#[derive(Debug, Clone)]
pub struct Attr<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct Element<'a> {
    pub tag: &'a str,
    pub attrs: Vec<Attr<'a>>,
    pub children: Vec<Node<'a>>,
    pub loc: SourceLocation,
}

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<&Attr<'a>> {
        self.attrs.iter().find(|a| a.name == name)
    }
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
    pub fn is_component(&self) -> bool {
        self.tag == "component" || (!is_native_tag(self.tag) && self.tag != "slot")
    }
}

#[derive(Debug, Clone)]
pub enum Node<'a> {
    Element(Element<'a>),
    Text(Vec<TextPart<'a>>, SourceLocation),
}

impl<'a> Node<'a> {
    pub fn is_whitespace(&self) -> bool {
        match self {
            Node::Text(parts, _) => parts.iter().all(|p| match p {
                TextPart::Static(s) => s.trim().is_empty(),
                TextPart::Expr(_) => false,
            }),
            Node::Element(_) => false,
        }
    }
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    whitespace: Whitespace,
    errors: Vec<CompilationError>,
    // open elements, the last one is the innermost
    stack: Vec<Element<'a>>,
    roots: Vec<Node<'a>>,
}

pub fn parse_template(source: &str, whitespace: Whitespace) -> (Vec<Node<'_>>, Vec<CompilationError>) {
    let mut parser = Parser {
        cursor: Cursor::new(source),
        whitespace,
        errors: vec![],
        stack: vec![],
        roots: vec![],
    };
    parser.parse();
    (parser.roots, parser.errors)
}

impl<'a> Parser<'a> {
    fn parse(&mut self) {
        while !self.cursor.is_eof() {
            let rest = self.cursor.rest();
            if rest.starts_with("<!--") {
                if let Err(e) = skip_comment(&mut self.cursor) {
                    self.errors.push(e);
                }
            } else if is_end_tag_start(rest) {
                self.parse_end_tag();
            } else if is_tag_start(rest) {
                self.parse_start_tag();
            } else {
                self.parse_text();
            }
        }
        while let Some(elem) = self.stack.pop() {
            self.errors.push(
                CompilationError::new(ErrorKind::MissingEndTag)
                    .with_location(elem.loc.clone())
                    .with_additional_message(format!(" <{}>", elem.tag)),
            );
            self.close(elem);
        }
    }

    fn parse_start_tag(&mut self) {
        let tag = match scan_start_tag(&mut self.cursor) {
            Ok(tag) => tag,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        let elem = Element {
            tag: tag.name,
            attrs: tag
                .attrs
                .into_iter()
                .map(|a| Attr {
                    name: a.name,
                    value: a.value,
                    loc: a.loc,
                })
                .collect(),
            children: vec![],
            loc: tag.loc,
        };
        if tag.self_closing || is_void_tag(elem.tag) {
            self.close(elem);
        } else {
            self.stack.push(elem);
        }
    }

    fn parse_end_tag(&mut self) {
        let start = self.cursor.position();
        let name = match scan_end_tag(&mut self.cursor) {
            Ok(name) => name,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        let Some(pos) = self.stack.iter().rposition(|e| e.tag == name) else {
            self.errors.push(
                CompilationError::new(ErrorKind::InvalidEndTag)
                    .with_location(self.cursor.location_from(start))
                    .with_additional_message(format!(" </{}>", name)),
            );
            return;
        };
        while self.stack.len() > pos + 1 {
            if let Some(elem) = self.stack.pop() {
                self.errors.push(
                    CompilationError::new(ErrorKind::MissingEndTag)
                        .with_location(elem.loc.clone())
                        .with_additional_message(format!(" <{}>", elem.tag)),
                );
                self.close(elem);
            }
        }
        if let Some(mut elem) = self.stack.pop() {
            elem.loc.end = self.cursor.position();
            self.close(elem);
        }
    }

    fn close(&mut self, mut elem: Element<'a>) {
        if self.whitespace == Whitespace::Condense {
            while elem.children.last().map_or(false, Node::is_whitespace) {
                elem.children.pop();
            }
        }
        self.push_node(Node::Element(elem));
    }

    fn push_node(&mut self, node: Node<'a>) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn siblings(&self) -> &[Node<'a>] {
        match self.stack.last() {
            Some(parent) => &parent.children,
            None => &self.roots,
        }
    }

    fn parse_text(&mut self) {
        let start = self.cursor.position();
        let rest = self.cursor.rest();
        // a `<` that does not open markup is text
        let mut end = rest.chars().next().map_or(0, char::len_utf8);
        while end < rest.len() {
            match rest[end..].find('<') {
                Some(i) => {
                    let at = &rest[end + i..];
                    if at.starts_with("<!--") || is_tag_start(at) || is_end_tag_start(at) {
                        end += i;
                        break;
                    }
                    end += i + 1;
                }
                None => end = rest.len(),
            }
        }
        let end = end.min(rest.len());
        let text = &rest[..end];
        self.cursor.advance(end);
        let loc = self.cursor.location_from(start.clone());
        let parts = match split_interpolation(text) {
            Ok(parts) => parts,
            Err(offset) => {
                let err_loc = SourceLocation::from_range(
                    self.cursor.source(),
                    start.offset + offset..start.offset + offset + 2,
                );
                self.errors.push(
                    CompilationError::new(ErrorKind::MissingInterpolationEnd).with_location(err_loc),
                );
                vec![TextPart::Static(decode_entities(text))]
            }
        };
        let node = Node::Text(parts, loc);
        if node.is_whitespace() {
            if self.in_pre() {
                self.push_node(node);
                return;
            }
            let after_element = self.siblings().last().map_or(false, |n| !n.is_whitespace());
            let keep = match self.whitespace {
                Whitespace::Condense => after_element && !text.contains('\n'),
                Whitespace::Preserve => after_element,
            };
            if keep {
                self.push_node(Node::Text(vec![TextPart::Static(" ".into())], node_loc(&node)));
            }
            return;
        }
        let node = if self.whitespace == Whitespace::Condense && !self.in_pre() {
            condense(node)
        } else {
            node
        };
        self.push_node(node);
    }

    fn in_pre(&self) -> bool {
        self.stack.iter().any(|e| e.tag == "pre")
    }
}

fn node_loc(node: &Node) -> SourceLocation {
    match node {
        Node::Text(_, loc) => loc.clone(),
        Node::Element(e) => e.loc.clone(),
    }
}

fn condense(node: Node) -> Node {
    let Node::Text(parts, loc) = node else {
        return node;
    };
    let parts = parts
        .into_iter()
        .map(|p| match p {
            TextPart::Static(s) => TextPart::Static(collapse_whitespace(&s)),
            expr => expr,
        })
        .collect();
    Node::Text(parts, loc)
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}

/// Splits `a {{ b }} c` into parts. Returns the offset of an
/// unterminated `{{` on failure.
fn split_interpolation(text: &str) -> Result<Vec<TextPart<'_>>, usize> {
    let mut parts = vec![];
    let mut rest = text;
    let mut offset = 0;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            return Err(offset + open);
        };
        if open > 0 {
            parts.push(TextPart::Static(decode_entities(&rest[..open])));
        }
        let expr = rest[open + 2..open + 2 + close].trim();
        parts.push(TextPart::Expr(expr));
        let consumed = open + 2 + close + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        parts.push(TextPart::Static(decode_entities(rest)));
    }
    Ok(parts)
}

/// Decodes the handful of entities templates commonly use.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        let decoded = [
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&amp;", '&'),
            ("&quot;", '"'),
            ("&#39;", '\''),
            ("&nbsp;", '\u{a0}'),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match decoded {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
