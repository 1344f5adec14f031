use super::asset_url::{url_to_require, AssetUrlOptions};
use super::parser::{Attr, Element, Node, TextPart};
use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, CompilerTip, SourceLocation};
use crate::js::{binding_names, parse_expression, parse_template_code, range, Edits, TemplateCode};
use crate::util::{is_global_allow_listed, json_string};
use crate::BindingMetadata;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, Expression, FormalParameters, Function, IdentifierReference,
    MemberExpression, ObjectProperty, VariableDeclarator,
};
use oxc_ast::{visit::walk, Visit};
use oxc_span::GetSpan;
use oxc_syntax::operator::BinaryOperator;
use oxc_syntax::scope::ScopeFlags;
use std::fmt::Write;
use std::ops::Range;

/// A parsed directive attribute such as `v-on:click.stop` or `:value`.
struct Directive<'a> {
    name: &'a str,
    arg: Option<&'a str>,
    modifiers: Vec<&'a str>,
}

impl<'a> Directive<'a> {
    fn has(&self, modifier: &str) -> bool {
        self.modifiers.contains(&modifier)
    }
}

fn parse_directive(raw: &str) -> Option<Directive<'_>> {
    let (name, rest) = match raw.as_bytes().first()? {
        b':' => ("bind", &raw[1..]),
        b'@' => ("on", &raw[1..]),
        b'#' => ("slot", &raw[1..]),
        _ => {
            let r = raw.strip_prefix("v-")?;
            let end = r.find(|c| c == ':' || c == '.').unwrap_or(r.len());
            let rest = &r[end..];
            (&r[..end], rest.strip_prefix(':').unwrap_or(rest))
        }
    };
    let mut parts = rest.split('.');
    let arg = parts.next().filter(|a| !a.is_empty());
    let modifiers = parts.filter(|m| !m.is_empty()).collect();
    Some(Directive {
        name,
        arg,
        modifiers,
    })
}

/// Siblings after v-if/v-else grouping.
enum Child<'n, 'a> {
    Text(&'n [TextPart<'a>], &'n SourceLocation),
    Element(&'n Element<'a>),
    If(Vec<&'n Element<'a>>),
}

impl<'n, 'a> Child<'n, 'a> {
    fn loc(&self) -> &SourceLocation {
        match self {
            Child::Text(_, loc) => loc,
            Child::Element(el) => &el.loc,
            Child::If(chain) => &chain[0].loc,
        }
    }
}

fn is_blank(parts: &[TextPart]) -> bool {
    parts
        .iter()
        .all(|p| matches!(p, TextPart::Static(s) if s.trim().is_empty()))
}

fn needs_normalization(el: &Element) -> bool {
    el.has_attr("v-for") || el.tag == "template" || el.tag == "slot"
}

fn normalization_type(children: &[Child]) -> u8 {
    let mut res = 0;
    for child in children {
        let els = match child {
            Child::Element(el) => std::slice::from_ref(el),
            Child::If(chain) => chain.as_slice(),
            Child::Text(..) => continue,
        };
        if els.iter().any(|e| needs_normalization(e)) {
            return 2;
        }
        if els.iter().any(|e| e.is_component()) {
            res = 1;
        }
    }
    res
}

fn is_slot_directive(name: &str) -> bool {
    name == "v-slot" || name.starts_with("v-slot:") || name.starts_with('#')
}

/// A child rendered as a scoped slot of its parent component.
fn is_scoped_slot(el: &Element) -> bool {
    el.attrs
        .iter()
        .any(|a| is_slot_directive(a.name) || a.name == "slot-scope" || a.name == "scope")
}

/// The slot name code and the slot scope parameters of `el`.
fn slot_target<'a>(el: &Element<'a>) -> (String, Option<&'a str>) {
    for attr in &el.attrs {
        if is_slot_directive(attr.name) {
            let name = parse_directive(attr.name)
                .and_then(|d| d.arg)
                .unwrap_or("default");
            let scope = attr.value.map(str::trim).filter(|v| !v.is_empty());
            return (json_string(name), scope);
        }
    }
    let name = match (el.attr("slot"), el.attr(":slot")) {
        (Some(Attr { value: Some(v), .. }), _) => json_string(v),
        (_, Some(Attr { value: Some(v), .. })) => v.to_string(),
        _ => json_string("default"),
    };
    let scope = el
        .attr("slot-scope")
        .or_else(|| el.attr("scope"))
        .and_then(|a| a.value);
    (name, scope)
}

fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn must_use_prop(tag: &str, input_type: Option<&str>, attr: &str) -> bool {
    match attr {
        "value" => {
            matches!(tag, "input" | "textarea" | "option" | "select" | "progress")
                && input_type != Some("button")
        }
        "selected" => tag == "option",
        "checked" => tag == "input",
        "muted" => tag == "video",
        _ => false,
    }
}

fn parse_style_text(text: &str) -> String {
    let mut entries = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    let mut push = |decl: &str| {
        if let Some((k, v)) = decl.split_once(':') {
            entries.push(format!("{}:{}", json_string(k.trim()), json_string(v.trim())));
        }
    };
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&text[start..]);
    format!("{{{}}}", entries.join(","))
}

fn key_code(key: &str) -> Option<&'static str> {
    Some(match key {
        "esc" => "27",
        "tab" => "9",
        "enter" => "13",
        "space" => "32",
        "up" => "38",
        "left" => "37",
        "right" => "39",
        "down" => "40",
        "delete" => "[8,46]",
        _ => return None,
    })
}

fn key_name(key: &str) -> Option<&'static str> {
    Some(match key {
        "esc" => r#"["Esc","Escape"]"#,
        "tab" => r#""Tab""#,
        "enter" => r#""Enter""#,
        "space" => r#"[" ","Spacebar"]"#,
        "up" => r#"["Up","ArrowUp"]"#,
        "left" => r#"["Left","ArrowLeft"]"#,
        "right" => r#"["Right","ArrowRight"]"#,
        "down" => r#"["Down","ArrowDown"]"#,
        "delete" => r#"["Backspace","Delete","Del"]"#,
        _ => return None,
    })
}

fn key_filter(keys: &[&str]) -> String {
    let checks: Vec<String> = keys
        .iter()
        .map(|key| match key.parse::<u32>() {
            Ok(code) => format!("$event.keyCode!=={}", code),
            Err(_) => format!(
                "_vm._k($event.keyCode,{},{},$event.key,{})",
                json_string(key),
                key_code(key).unwrap_or("undefined"),
                key_name(key).unwrap_or("undefined"),
            ),
        })
        .collect();
    format!(
        "if(!$event.type.indexOf('key')&&{})return null;",
        checks.join("&&")
    )
}

/// `a`, `a.b`, `a['b']`, `a[0]` or `a[b]`
fn is_member_path(expr: &Expression) -> bool {
    match expr {
        Expression::Identifier(_) => true,
        Expression::ChainExpression(chain) => chain
            .expression
            .as_member_expression()
            .map_or(false, is_member_access),
        _ => expr.as_member_expression().map_or(false, is_member_access),
    }
}

fn is_member_access(member: &MemberExpression) -> bool {
    let simple_key = match member {
        MemberExpression::StaticMemberExpression(_) => true,
        MemberExpression::ComputedMemberExpression(m) => matches!(
            m.expression,
            Expression::StringLiteral(_) | Expression::NumericLiteral(_) | Expression::Identifier(_)
        ),
        MemberExpression::PrivateFieldExpression(_) => false,
    };
    simple_key && is_member_path(member.object())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum HandlerKind {
    /// `onClick`, `a.b['c']`
    Path,
    /// `() => go()`, `function (e) {}`
    Function,
    /// `path(args)` with optional trailing semicolons
    Call,
    Statements,
}

fn handler_kind(value: &str) -> HandlerKind {
    let alloc = Allocator::default();
    let value = value.trim();
    let code = value.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    let Some(expr) = parse_expression(&alloc, code) else {
        return HandlerKind::Statements;
    };
    // only calls may end in semicolons
    let bare = code.len() == value.len();
    match &expr {
        _ if bare && is_member_path(&expr) => HandlerKind::Path,
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) if bare => {
            HandlerKind::Function
        }
        Expression::CallExpression(call) if is_member_path(&call.callee) => HandlerKind::Call,
        _ => HandlerKind::Statements,
    }
}

/// Parses `params` as the parameter list of an arrow function. Returns the
/// text of each parameter and the names they bind.
fn parse_params(params: &str) -> Option<(Vec<String>, Vec<String>)> {
    let alloc = Allocator::default();
    let src = format!("({}) => 0", params);
    let Some(Expression::ArrowFunctionExpression(arrow)) = parse_expression(&alloc, &src) else {
        return None;
    };
    let mut texts = vec![];
    for item in arrow.params.items.iter() {
        let span = item.span();
        texts.push(src[span.start as usize..span.end as usize].to_string());
    }
    if let Some(rest) = &arrow.params.rest {
        let span = rest.span();
        texts.push(src[span.start as usize..span.end as usize].to_string());
    }
    let names = param_names(&arrow.params)
        .into_iter()
        .map(String::from)
        .collect();
    Some((texts, names))
}

fn param_names<'a>(params: &FormalParameters<'a>) -> Vec<&'a str> {
    let mut names = vec![];
    for item in params.items.iter() {
        binding_names(&item.pattern, &mut names);
    }
    if let Some(rest) = &params.rest {
        binding_names(&rest.argument, &mut names);
    }
    names
}

/// `value = assignment` for v-model, `$set` for member expressions.
fn assignment_code(value: &str, assignment: &str) -> String {
    let value = value.trim();
    if value.ends_with(']') {
        if let Some(idx) = value.rfind('[') {
            return format!(
                "$set({}, {}, {})",
                &value[..idx],
                &value[idx + 1..value.len() - 1],
                assignment
            );
        }
    }
    match value.rfind('.') {
        Some(idx) => format!(
            "$set({}, {}, {})",
            &value[..idx],
            json_string(&value[idx + 1..]),
            assignment
        ),
        None => format!("{}={}", value, assignment),
    }
}

/// Appends `handler` to the listeners of `event`.
fn add_handler(list: &mut Vec<(String, Vec<String>)>, event: String, handler: String) {
    match list.iter_mut().find(|(name, _)| *name == event) {
        Some((_, handlers)) => handlers.push(handler),
        None => list.push((event, vec![handler])),
    }
}

fn gen_listeners(list: &[(String, Vec<String>)]) -> String {
    let entries: Vec<String> = list
        .iter()
        .map(|(name, handlers)| {
            let code = if handlers.len() == 1 {
                handlers[0].clone()
            } else {
                format!("[{}]", handlers.join(","))
            };
            format!("{}:{}", json_string(name), code)
        })
        .collect();
    format!("{{{}}}", entries.join(","))
}

fn gen_props(props: &[(String, String)]) -> String {
    let entries: Vec<String> = props.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
    format!("{{{}}}", entries.join(","))
}

struct ForExpression<'a> {
    source: &'a str,
    params: String,
    names: Vec<String>,
}

/// Splits `alias in source` at the first whitespace delimited `in` or `of`.
fn split_for_alias(exp: &str) -> Option<(&str, &str)> {
    let bytes = exp.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            let word = exp[i..].trim_start();
            let word_start = exp.len() - word.len();
            if (word.starts_with("in") || word.starts_with("of"))
                && word[2..].starts_with(|c: char| c.is_ascii_whitespace())
            {
                return Some((&exp[..i], &exp[word_start + 2..]));
            }
        }
        i += 1;
    }
    None
}

fn parse_for(exp: &str) -> Option<ForExpression<'_>> {
    let (lhs, source) = split_for_alias(exp)?;
    let source = source.trim();
    let lhs = lhs.trim();
    let lhs = lhs
        .strip_prefix('(')
        .and_then(|l| l.strip_suffix(')'))
        .unwrap_or(lhs);
    if source.is_empty() || lhs.trim().is_empty() {
        return None;
    }
    let (params, names) = parse_params(lhs)?;
    Some(ForExpression {
        source,
        params: params.join(","),
        names,
    })
}

/// Generates render function code from a template AST.
pub struct CodeGenerator<'b> {
    bindings: Option<&'b BindingMetadata>,
    asset_urls: Option<&'b AssetUrlOptions>,
    is_functional: bool,
    locals: Vec<String>,
    for_depth: usize,
    pub uses_setup: bool,
    pub errors: Vec<CompilationError>,
    pub tips: Vec<CompilerTip>,
}

impl<'b> CodeGenerator<'b> {
    pub fn new(
        bindings: Option<&'b BindingMetadata>,
        asset_urls: Option<&'b AssetUrlOptions>,
        is_functional: bool,
    ) -> Self {
        Self {
            bindings,
            asset_urls,
            is_functional,
            locals: vec![],
            for_depth: 0,
            uses_setup: false,
            errors: vec![],
            tips: vec![],
        }
    }

    fn error(&mut self, kind: ErrorKind, loc: &SourceLocation) {
        self.errors
            .push(CompilationError::new(kind).with_location(loc.clone()));
    }

    /// Code of the root render expression.
    pub fn generate(&mut self, nodes: &[Node]) -> String {
        let children = self.group(nodes);
        let mut roots = children.iter().filter(|c| !matches!(c, Child::Text(..)));
        let Some(root) = roots.next() else {
            if let Some(text) = children
                .iter()
                .find(|c| matches!(c, Child::Text(parts, _) if !is_blank(parts)))
            {
                let loc = text.loc().clone();
                self.error(ErrorKind::NoRootElement, &loc);
            }
            return "_c(\"div\")".into();
        };
        if let Some(extra) = roots.next() {
            let loc = extra.loc().clone();
            self.error(ErrorKind::MultipleRoot, &loc);
        }
        if !self.is_functional {
            let els = match root {
                Child::Element(el) => std::slice::from_ref(el),
                Child::If(chain) => chain.as_slice(),
                Child::Text(..) => &[],
            };
            if let Some(attr) = els.iter().find_map(|e| e.attr("v-for")) {
                let loc = attr.loc.clone();
                self.error(ErrorKind::VForOnRoot, &loc);
            }
        }
        self.gen_child(root)
    }

    fn group<'n, 'a>(&mut self, nodes: &'n [Node<'a>]) -> Vec<Child<'n, 'a>> {
        let mut out: Vec<Child> = vec![];
        for node in nodes {
            let el = match node {
                Node::Text(parts, loc) => {
                    out.push(Child::Text(parts, loc));
                    continue;
                }
                Node::Element(el) => el,
            };
            if el.has_attr("v-else-if") || el.has_attr("v-else") {
                while matches!(out.last(), Some(Child::Text(parts, _)) if is_blank(parts)) {
                    out.pop();
                }
                match out.last_mut() {
                    Some(Child::If(chain))
                        if !chain.last().map_or(false, |e| e.has_attr("v-else")) =>
                    {
                        chain.push(el);
                    }
                    _ => {
                        let loc = el.loc.clone();
                        self.error(ErrorKind::VElseNoAdjacentIf, &loc);
                    }
                }
            } else if el.has_attr("v-if") {
                out.push(Child::If(vec![el]));
            } else {
                out.push(Child::Element(el));
            }
        }
        out
    }

    fn gen_child(&mut self, child: &Child) -> String {
        match child {
            Child::Text(parts, _) => self.gen_text(parts),
            Child::Element(el) => self.gen_element(el),
            Child::If(chain) => self.gen_if(chain),
        }
    }

    fn gen_children(&mut self, nodes: &[Node], check_skip: bool) -> Option<String> {
        let children = self.group(nodes);
        if children.is_empty() {
            return None;
        }
        if let [Child::Element(el)] = children.as_slice() {
            if el.has_attr("v-for") && el.tag != "template" && el.tag != "slot" {
                let norm = match (check_skip, el.is_component()) {
                    (false, _) => "",
                    (true, true) => ",1",
                    (true, false) => ",0",
                };
                return Some(format!("{}{}", self.gen_element(el), norm));
            }
        }
        let norm = if check_skip {
            normalization_type(&children)
        } else {
            0
        };
        let mut code = String::from("[");
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                code.push(',');
            }
            code.push_str(&self.gen_child(child));
        }
        code.push(']');
        if norm > 0 {
            let _ = write!(code, ",{}", norm);
        }
        Some(code)
    }

    fn gen_text(&mut self, parts: &[TextPart]) -> String {
        let pieces: Vec<String> = parts
            .iter()
            .map(|p| match p {
                TextPart::Static(s) => json_string(s),
                TextPart::Expr(e) => format!("_vm._s({})", self.gen_expression(e.trim())),
            })
            .collect();
        format!("_vm._v({})", pieces.join("+"))
    }

    fn gen_if(&mut self, chain: &[&Element]) -> String {
        let mut code = String::new();
        for el in chain {
            if el.has_attr("v-else") {
                code.push_str(&self.gen_element(el));
                return code;
            }
            let attr = el.attr("v-if").or_else(|| el.attr("v-else-if"));
            let cond = attr.and_then(|a| a.value).map(str::trim).filter(|v| !v.is_empty());
            let Some(cond) = cond else {
                let loc = attr.map_or(&el.loc, |a| &a.loc).clone();
                self.error(ErrorKind::VIfNoExpression, &loc);
                continue;
            };
            let cond = self.prefix(cond);
            let branch = self.gen_element(el);
            let _ = write!(code, "({})?{}:", cond, branch);
        }
        code.push_str("_vm._e()");
        code
    }

    fn gen_element(&mut self, el: &Element) -> String {
        match el.attr("v-for") {
            Some(attr) => self.gen_for(el, attr),
            None => self.gen_plain(el),
        }
    }

    fn gen_for(&mut self, el: &Element, attr: &Attr) -> String {
        let Some(exp) = attr.value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.error(ErrorKind::VForNoExpression, &attr.loc);
            return self.gen_plain(el);
        };
        let Some(parsed) = parse_for(exp) else {
            self.errors.push(
                CompilationError::new(ErrorKind::VForMalformedExpression)
                    .with_location(attr.loc.clone())
                    .with_additional_message(format!(": {}", exp)),
            );
            return self.gen_plain(el);
        };
        let keyed = el.has_attr("key") || el.has_attr(":key") || el.has_attr("v-bind:key");
        if el.is_component() && el.tag != "template" && !keyed {
            self.tips.push(CompilerTip {
                message: format!(
                    "<{} v-for=\"{}\">: component lists rendered with v-for should have explicit keys. \
                     See https://vuejs.org/guide/list.html#key for more info.",
                    el.tag, exp
                ),
                location: attr.loc.clone(),
            });
        }
        let source = self.prefix(parsed.source);
        let scope = self.locals.len();
        self.locals.extend(parsed.names);
        self.for_depth += 1;
        let body = self.gen_plain(el);
        self.for_depth -= 1;
        self.locals.truncate(scope);
        format!(
            "_vm._l(({}),function({}){{return {}}})",
            source, parsed.params, body
        )
    }

    fn gen_plain(&mut self, el: &Element) -> String {
        match el.tag {
            "template" if !el.has_attr("slot") && !el.has_attr(":slot") => self
                .gen_children(&el.children, false)
                .unwrap_or_else(|| "void 0".into()),
            "slot" => self.gen_slot(el),
            _ => self.gen_component_or_element(el),
        }
    }

    fn gen_component_or_element(&mut self, el: &Element) -> String {
        let tag = if el.tag == "component" {
            match (el.attr(":is").or_else(|| el.attr("v-bind:is")), el.attr("is")) {
                (Some(Attr { value: Some(v), .. }), _) => self.prefix(v.trim()),
                (_, Some(Attr { value: Some(v), .. })) => json_string(v),
                _ => "'component'".into(),
            }
        } else {
            format!("'{}'", el.tag)
        };
        let slot_owner = el.is_component();
        let own_slot = slot_owner && el.attrs.iter().any(|a| is_slot_directive(a.name));
        let mut scoped: Vec<&Element> = vec![];
        let mut regular: Vec<Node> = vec![];
        if slot_owner && !own_slot {
            for node in &el.children {
                match node {
                    Node::Element(c) if is_scoped_slot(c) => scoped.push(c),
                    _ => regular.push(node.clone()),
                }
            }
        }
        let scoped_slots = if own_slot {
            Some(self.gen_scoped_slots(&[el], true))
        } else if !scoped.is_empty() {
            Some(self.gen_scoped_slots(&scoped, false))
        } else {
            None
        };
        let data = self.gen_data(el, scoped_slots);
        let has_inner = el.has_attr("v-html") || el.has_attr("v-text");
        let children = if has_inner || own_slot {
            None
        } else if slot_owner {
            self.gen_children(&regular, true)
        } else {
            self.gen_children(&el.children, true)
        };
        let mut code = format!("_c({}", tag);
        if let Some(data) = data {
            code.push(',');
            code.push_str(&data);
        }
        if let Some(children) = children {
            code.push(',');
            code.push_str(&children);
        }
        code.push(')');
        code
    }

    fn gen_scoped_slots(&mut self, slots: &[&Element], own: bool) -> String {
        let mut entries = vec![];
        for slot in slots {
            let (key, scope) = slot_target(slot);
            let names = scope
                .and_then(parse_params)
                .map(|(_, names)| names)
                .unwrap_or_default();
            let saved = self.locals.len();
            self.locals.extend(names);
            let body = if own || slot.tag == "template" {
                self.gen_children(&slot.children, false)
                    .unwrap_or_else(|| "undefined".into())
            } else {
                self.gen_element(slot)
            };
            self.locals.truncate(saved);
            let proxy = if scope.is_none() { ",proxy:true" } else { "" };
            entries.push(format!(
                "{{key:{},fn:function({}){{return {}}}{}}}",
                key,
                scope.unwrap_or(""),
                body,
                proxy
            ));
        }
        format!("scopedSlots:_vm._u([{}])", entries.join(","))
    }

    fn gen_slot(&mut self, el: &Element) -> String {
        let name = match (el.attr(":name"), el.attr("name")) {
            (Some(Attr { value: Some(v), .. }), _) => self.prefix(v.trim()),
            (_, Some(Attr { value: Some(v), .. })) => json_string(v),
            _ => json_string("default"),
        };
        let children = self.gen_children(&el.children, false);
        let mut props = vec![];
        let mut bind = None;
        for attr in &el.attrs {
            let value = attr.value.unwrap_or("");
            match parse_directive(attr.name) {
                Some(dir) if dir.name == "bind" => match dir.arg {
                    Some("name") => {}
                    Some(arg) => props.push((json_string(&camelize(arg)), self.gen_expression(value.trim()))),
                    None => bind = Some(self.prefix(value.trim())),
                },
                Some(_) => {}
                None if attr.name == "name" => {}
                None => props.push((json_string(&camelize(attr.name)), json_string(value))),
            }
        }
        let mut code = format!("_vm._t({}", name);
        if let Some(children) = &children {
            let _ = write!(code, ",function(){{return {}}}", children);
        }
        if (!props.is_empty() || bind.is_some()) && children.is_none() {
            code.push_str(",null");
        }
        if !props.is_empty() {
            code.push(',');
            code.push_str(&gen_props(&props));
        }
        if let Some(bind) = bind {
            if props.is_empty() {
                code.push_str(",null");
            }
            code.push(',');
            code.push_str(&bind);
        }
        code.push(')');
        code
    }

    fn static_attr_value(&self, el: &Element, attr: &Attr) -> String {
        let value = attr.value.unwrap_or("");
        if let Some(options) = self.asset_urls {
            if options.matches(el.tag, attr.name) {
                if let Some(require) = url_to_require(value, options.include_absolute) {
                    return require;
                }
            }
        }
        json_string(value)
    }

    /// Binding code of `v-model` related attributes.
    fn binding_attr(&self, el: &Element, name: &str) -> Option<String> {
        for attr in &el.attrs {
            match parse_directive(attr.name) {
                Some(Directive {
                    name: "bind",
                    arg: Some(arg),
                    ..
                }) if arg == name => return attr.value.map(|v| v.trim().to_string()),
                None if attr.name == name => return Some(json_string(attr.value.unwrap_or(""))),
                _ => {}
            }
        }
        None
    }

    fn gen_data(&mut self, el: &Element, scoped_slots: Option<String>) -> Option<String> {
        let mut directives: Vec<String> = vec![];
        let mut key = None;
        let mut ref_ = None;
        let mut static_class = None;
        let mut class = None;
        let mut static_style = None;
        let mut style = None;
        let mut attrs: Vec<(String, String)> = vec![];
        let mut dom_props: Vec<(String, String)> = vec![];
        let mut on: Vec<(String, Vec<String>)> = vec![];
        let mut native_on: Vec<(String, Vec<String>)> = vec![];
        let mut slot = None;
        let mut model = None;
        let mut bind_objects = vec![];
        let mut listener_objects = vec![];
        let is_component = el.is_component();
        let input_type = el
            .attr("type")
            .and_then(|a| a.value)
            .filter(|_| el.tag == "input");

        for attr in &el.attrs {
            let value = attr.value.unwrap_or("").trim();
            let Some(dir) = parse_directive(attr.name) else {
                match attr.name {
                    "class" => {
                        let collapsed: Vec<&str> = value.split_whitespace().collect();
                        static_class = Some(json_string(&collapsed.join(" ")));
                    }
                    "style" => static_style = Some(parse_style_text(value)),
                    "key" => key = Some(json_string(value)),
                    "ref" => ref_ = Some(json_string(value)),
                    "slot" => slot = Some(json_string(value)),
                    "slot-scope" | "scope" | "inline-template" => {}
                    "is" if el.tag == "component" => {}
                    name => attrs.push((json_string(name), self.static_attr_value(el, attr))),
                }
                continue;
            };
            match dir.name {
                "bind" => {
                    if value.is_empty() {
                        self.error(ErrorKind::VBindNoExpression, &attr.loc);
                        continue;
                    }
                    let Some(arg) = dir.arg else {
                        bind_objects.push((self.prefix(value), dir.has("prop"), dir.has("sync")));
                        continue;
                    };
                    match arg {
                        "is" if el.tag == "component" => {}
                        "class" => class = Some(self.gen_expression(value)),
                        "style" => style = Some(self.gen_expression(value)),
                        "key" => key = Some(self.gen_expression(value)),
                        "ref" => ref_ = Some(self.prefix(value)),
                        "slot" => slot = Some(self.prefix(value)),
                        _ => {
                            let name = if dir.has("camel") {
                                camelize(arg)
                            } else {
                                arg.to_string()
                            };
                            let exp = self.gen_expression(value);
                            if dir.has("prop") || (!is_component && must_use_prop(el.tag, input_type, &name)) {
                                dom_props.push((json_string(&name), exp));
                            } else {
                                attrs.push((json_string(&name), exp));
                            }
                            if dir.has("sync") {
                                let handler = self.gen_statement_handler(&assignment_code(value, "$event"));
                                add_handler(&mut on, format!("update:{}", camelize(&name)), handler);
                            }
                        }
                    }
                }
                "on" => {
                    if value.is_empty() && dir.modifiers.is_empty() {
                        self.error(ErrorKind::VOnNoExpression, &attr.loc);
                        continue;
                    }
                    let Some(event) = dir.arg else {
                        listener_objects.push(self.prefix(value));
                        continue;
                    };
                    let (name, handler) = self.gen_listener(event, value, &dir.modifiers);
                    if dir.has("native") {
                        add_handler(&mut native_on, name, handler);
                    } else {
                        add_handler(&mut on, name, handler);
                    }
                }
                "model" => {
                    if value.is_empty() {
                        continue;
                    }
                    let model_dir = format!(
                        "{{name:\"model\",rawName:{},value:({}),expression:{}}}",
                        json_string(attr.name),
                        self.prefix(value),
                        json_string(value)
                    );
                    match (el.tag, input_type) {
                        _ if is_component => model = Some(self.gen_component_model(value, &dir)),
                        ("select", _) => {
                            directives.push(model_dir);
                            let handler = self.gen_select_model(value, &dir);
                            add_handler(&mut on, "change".into(), handler);
                        }
                        ("input", Some("checkbox")) => {
                            directives.push(model_dir);
                            let (checked, handler) = self.gen_checkbox_model(el, value, &dir);
                            dom_props.push((json_string("checked"), checked));
                            add_handler(&mut on, "change".into(), handler);
                        }
                        ("input", Some("radio")) => {
                            directives.push(model_dir);
                            let (checked, handler) = self.gen_radio_model(el, value, &dir);
                            dom_props.push((json_string("checked"), checked));
                            add_handler(&mut on, "change".into(), handler);
                        }
                        _ => {
                            directives.push(model_dir);
                            let (event, handler) = self.gen_default_model(value, input_type, &dir);
                            dom_props.push((json_string("value"), format!("({})", self.prefix(value))));
                            add_handler(&mut on, event, handler);
                            if dir.has("trim") || dir.has("number") {
                                let blur = self.gen_statement_handler("$forceUpdate()");
                                add_handler(&mut on, "blur".into(), blur);
                            }
                        }
                    }
                }
                "html" => dom_props.push((
                    json_string("innerHTML"),
                    format!("_vm._s({})", self.prefix(value)),
                )),
                "text" => dom_props.push((
                    json_string("textContent"),
                    format!("_vm._s({})", self.prefix(value)),
                )),
                "if" | "else-if" | "else" | "for" | "slot" | "pre" | "cloak" | "once" => {}
                name => {
                    let mut code = format!(
                        "{{name:{},rawName:{}",
                        json_string(name),
                        json_string(attr.name)
                    );
                    if !value.is_empty() {
                        let _ = write!(
                            code,
                            ",value:({}),expression:{}",
                            self.prefix(value),
                            json_string(value)
                        );
                    }
                    if let Some(arg) = dir.arg {
                        let _ = write!(code, ",arg:{}", json_string(arg));
                    }
                    if !dir.modifiers.is_empty() {
                        let modifiers: Vec<String> = dir
                            .modifiers
                            .iter()
                            .map(|m| format!("{}:true", json_string(m)))
                            .collect();
                        let _ = write!(code, ",modifiers:{{{}}}", modifiers.join(","));
                    }
                    code.push('}');
                    directives.push(code);
                }
            }
        }

        let mut data = String::from("{");
        if !directives.is_empty() {
            let _ = write!(data, "directives:[{}],", directives.join(","));
        }
        if let Some(key) = key {
            let _ = write!(data, "key:{},", key);
        }
        if let Some(r) = ref_ {
            let _ = write!(data, "ref:{},", r);
            if self.for_depth > 0 {
                data.push_str("refInFor:true,");
            }
        }
        if el.tag == "component" {
            data.push_str("tag:\"component\",");
        }
        if let Some(c) = static_class {
            let _ = write!(data, "staticClass:{},", c);
        }
        if let Some(c) = class {
            let _ = write!(data, "class:{},", c);
        }
        if let Some(s) = static_style {
            let _ = write!(data, "staticStyle:{},", s);
        }
        if let Some(s) = style {
            let _ = write!(data, "style:{},", s);
        }
        if !attrs.is_empty() {
            let _ = write!(data, "attrs:{},", gen_props(&attrs));
        }
        if !dom_props.is_empty() {
            let _ = write!(data, "domProps:{},", gen_props(&dom_props));
        }
        if !on.is_empty() {
            let _ = write!(data, "on:{},", gen_listeners(&on));
        }
        if !native_on.is_empty() {
            let _ = write!(data, "nativeOn:{},", gen_listeners(&native_on));
        }
        if let Some(s) = slot {
            let _ = write!(data, "slot:{},", s);
        }
        if let Some(s) = scoped_slots {
            let _ = write!(data, "{},", s);
        }
        if let Some(m) = model {
            let _ = write!(data, "model:{},", m);
        }
        if data.ends_with(',') {
            data.pop();
        }
        data.push('}');
        for (obj, prop, sync) in bind_objects {
            data = format!(
                "_vm._b({},{},{},{}{})",
                data,
                json_string(el.tag),
                obj,
                prop,
                if sync { ",true" } else { "" }
            );
        }
        for obj in listener_objects {
            data = format!("_vm._g({},{})", data, obj);
        }
        if data == "{}" {
            None
        } else {
            Some(data)
        }
    }

    /// Event name with modifier prefixes and the handler code.
    fn gen_listener(&mut self, event: &str, value: &str, modifiers: &[&str]) -> (String, String) {
        let mut name = match event {
            "click" if modifiers.contains(&"right") => "contextmenu".to_string(),
            "click" if modifiers.contains(&"middle") => "mouseup".to_string(),
            _ => event.to_string(),
        };
        if modifiers.contains(&"capture") {
            name.insert(0, '!');
        }
        if modifiers.contains(&"once") {
            name.insert(0, '~');
        }
        if modifiers.contains(&"passive") {
            name.insert(0, '&');
        }
        (name, self.gen_handler(value, modifiers))
    }

    fn gen_handler(&mut self, value: &str, modifiers: &[&str]) -> String {
        if value.is_empty() {
            return "function(){}".into();
        }
        let kind = handler_kind(value);
        let is_path = kind == HandlerKind::Path;
        let is_fn = kind == HandlerKind::Function;
        let is_call = kind == HandlerKind::Call;

        let mut keys = vec![];
        let mut guards = String::new();
        for m in modifiers {
            match *m {
                "stop" => guards.push_str("$event.stopPropagation();"),
                "prevent" => guards.push_str("$event.preventDefault();"),
                "self" => guards.push_str("if($event.target !== $event.currentTarget)return null;"),
                "ctrl" | "shift" | "alt" | "meta" => {
                    let _ = write!(guards, "if(!$event.{}Key)return null;", m);
                }
                "left" | "middle" | "right" => {
                    let button = match *m {
                        "left" => 0,
                        "middle" => 1,
                        _ => 2,
                    };
                    let _ = write!(
                        guards,
                        "if('button' in $event && $event.button !== {})return null;",
                        button
                    );
                    if key_code(m).is_some() {
                        keys.push(*m);
                    }
                }
                "native" | "once" | "capture" | "passive" | "exact" | "sync" => {}
                key => keys.push(key),
            }
        }
        if !keys.is_empty() {
            guards.insert_str(0, &key_filter(&keys));
        }
        if guards.is_empty() {
            if is_path || is_fn {
                return self.prefix(value);
            }
            let body = self.with_locals(&["$event"], value);
            return if is_call {
                format!("function($event){{return {}}}", body)
            } else {
                format!("function($event){{{}}}", body)
            };
        }
        let handler = if is_path {
            format!("return {}.apply(null, arguments)", self.prefix(value))
        } else if is_fn {
            format!("return ({}).apply(null, arguments)", self.prefix(value))
        } else if is_call {
            format!("return {}", self.with_locals(&["$event"], value))
        } else {
            self.with_locals(&["$event"], value)
        };
        format!("function($event){{{}{}}}", guards, handler)
    }

    fn gen_statement_handler(&mut self, code: &str) -> String {
        format!("function($event){{{}}}", self.with_locals(&["$event"], code))
    }

    fn gen_component_model(&mut self, value: &str, dir: &Directive) -> String {
        let mut base = "$$v".to_string();
        if dir.has("trim") {
            base = "(typeof $$v === 'string'? $$v.trim(): $$v)".into();
        }
        if dir.has("number") {
            base = format!("_n({})", base);
        }
        let callback = self.with_locals(&["$$v"], &assignment_code(value, &base));
        format!(
            "{{value:({}),callback:function ($$v) {{{}}},expression:{}}}",
            self.prefix(value),
            callback,
            json_string(value)
        )
    }

    fn gen_default_model(&mut self, value: &str, input_type: Option<&str>, dir: &Directive) -> (String, String) {
        let lazy = dir.has("lazy");
        let range = input_type == Some("range");
        let event = if lazy {
            "change"
        } else if range {
            "__r"
        } else {
            "input"
        };
        let mut target = "$event.target.value".to_string();
        if dir.has("trim") {
            target = "$event.target.value.trim()".into();
        }
        if dir.has("number") {
            target = format!("_n({})", target);
        }
        let mut code = assignment_code(value, &target);
        if !lazy && !range {
            code = format!("if($event.target.composing)return;{}", code);
        }
        (event.into(), self.gen_statement_handler(&code))
    }

    fn gen_checkbox_model(&mut self, el: &Element, value: &str, dir: &Directive) -> (String, String) {
        let value_binding = self.binding_attr(el, "value").unwrap_or_else(|| "null".into());
        let true_binding = self.binding_attr(el, "true-value").unwrap_or_else(|| "true".into());
        let false_binding = self.binding_attr(el, "false-value").unwrap_or_else(|| "false".into());
        let checked = format!(
            "Array.isArray({v})?_i({v},{vb})>-1{t}",
            v = value,
            vb = value_binding,
            t = if true_binding == "true" {
                format!(":({})", value)
            } else {
                format!(":_q({},{})", value, true_binding)
            }
        );
        let item = if dir.has("number") {
            format!("_n({})", value_binding)
        } else {
            value_binding
        };
        let handler = format!(
            "var $$a={v},$$el=$event.target,$$c=$$el.checked?({t}):({f});\
             if(Array.isArray($$a)){{var $$v={item},$$i=_i($$a,$$v);\
             if($$el.checked){{$$i<0&&({add})}}else{{$$i>-1&&({remove})}}}}else{{{plain}}}",
            v = value,
            t = true_binding,
            f = false_binding,
            item = item,
            add = assignment_code(value, "$$a.concat([$$v])"),
            remove = assignment_code(value, "$$a.slice(0,$$i).concat($$a.slice($$i+1))"),
            plain = assignment_code(value, "$$c"),
        );
        let locals = ["$event", "$$a", "$$el", "$$c", "$$v", "$$i"];
        let checked = self.prefix(&checked);
        let handler = format!("function($event){{{}}}", self.with_locals(&locals, &handler));
        (checked, handler)
    }

    fn gen_radio_model(&mut self, el: &Element, value: &str, dir: &Directive) -> (String, String) {
        let mut value_binding = self.binding_attr(el, "value").unwrap_or_else(|| "null".into());
        if dir.has("number") {
            value_binding = format!("_n({})", value_binding);
        }
        let checked = self.prefix(&format!("_q({},{})", value, value_binding));
        let handler = self.gen_statement_handler(&assignment_code(value, &value_binding));
        (checked, handler)
    }

    fn gen_select_model(&mut self, value: &str, dir: &Directive) -> String {
        let selected = format!(
            "Array.prototype.filter.call($event.target.options,function(o){{return o.selected}})\
             .map(function(o){{var val = \"_value\" in o ? o._value : o.value;return {}}})",
            if dir.has("number") { "_n(val)" } else { "val" }
        );
        let code = format!(
            "var $$selectedVal = {}; {}",
            selected,
            assignment_code(value, "$event.target.multiple ? $$selectedVal : $$selectedVal[0]")
        );
        let locals = ["$event", "$$selectedVal", "o", "val"];
        format!("function($event){{{}}}", self.with_locals(&locals, &code))
    }

    fn with_locals(&mut self, locals: &[&str], exp: &str) -> String {
        let saved = self.locals.len();
        self.locals.extend(locals.iter().map(|l| l.to_string()));
        let code = self.prefix(exp);
        self.locals.truncate(saved);
        code
    }

    /// Prefixes an expression that may end in `| filter` calls.
    fn gen_expression(&mut self, exp: &str) -> String {
        let Some((base, filters)) = split_filters(exp) else {
            return self.prefix(exp);
        };
        let mut code = self.prefix(exp[base].trim());
        for filter in filters {
            code = match filter.args {
                Some(args) => format!(
                    "_vm._f({})({},{})",
                    json_string(filter.name),
                    code,
                    self.prefix(&exp[args])
                ),
                None => format!("_vm._f({})({})", json_string(filter.name), code),
            };
        }
        code
    }

    fn is_unprefixed(&self, name: &str) -> bool {
        is_global_allow_listed(name) || self.locals.iter().any(|l| l == name)
    }

    fn prefixed(&mut self, name: &str) -> String {
        match self.bindings.and_then(|b| b.get(name)) {
            Some(ty) if ty.is_setup() => {
                self.uses_setup = true;
                format!("_setup.{}", name)
            }
            _ => format!("_vm.{}", name),
        }
    }

    /// Rewrites free identifiers of `exp` into instance or setup accesses.
    /// Code that does not parse is left as is.
    pub fn prefix(&mut self, exp: &str) -> String {
        let alloc = Allocator::default();
        let Some(code) = parse_template_code(&alloc, exp) else {
            return exp.to_string();
        };
        let mut prefixer = Prefixer {
            generator: self,
            scopes: vec![],
            edits: Edits::default(),
        };
        match &code {
            TemplateCode::Expression(expr) => prefixer.visit_expression(expr),
            TemplateCode::Statements(program) => prefixer.visit_program(program),
        }
        prefixer.edits.apply(exp)
    }
}

struct Filter<'a> {
    name: &'a str,
    /// arguments of `name(args)`, none for a bare name
    args: Option<Range<usize>>,
}

/// Splits `base | a | b(c)` into the base expression and its filters.
/// `None` when there are no filters or one is not a name or a call.
fn split_filters(exp: &str) -> Option<(Range<usize>, Vec<Filter<'_>>)> {
    if !exp.contains('|') {
        return None;
    }
    let alloc = Allocator::default();
    let mut expr = parse_expression(&alloc, exp)?;
    let mut filters = vec![];
    let base = loop {
        let binary = match expr {
            Expression::BinaryExpression(binary) if binary.operator == BinaryOperator::BitwiseOR => {
                binary.unbox()
            }
            other => break other,
        };
        let filter = match &binary.right {
            Expression::Identifier(id) => Filter {
                name: &exp[range(id.span)],
                args: None,
            },
            Expression::CallExpression(call) => {
                let Expression::Identifier(id) = &call.callee else {
                    return None;
                };
                let args = call.arguments.first().zip(call.arguments.last()).map(|(first, last)| {
                    first.span().start as usize..last.span().end as usize
                });
                Filter {
                    name: &exp[range(id.span)],
                    args,
                }
            }
            _ => return None,
        };
        filters.push(filter);
        expr = binary.left;
    };
    if filters.is_empty() {
        return None;
    }
    filters.reverse();
    Some((range(base.span()), filters))
}

/// Replaces free identifiers with their instance accesses. Names bound by
/// nested functions and declarations are left alone.
struct Prefixer<'g, 'b, 'a> {
    generator: &'g mut CodeGenerator<'b>,
    scopes: Vec<Vec<&'a str>>,
    edits: Edits,
}

impl<'g, 'b, 'a> Prefixer<'g, 'b, 'a> {
    fn is_free(&self, name: &str) -> bool {
        !self.generator.is_unprefixed(name) && !self.scopes.iter().flatten().any(|n| *n == name)
    }

    fn in_scope(&mut self, names: Vec<&'a str>, visit: impl FnOnce(&mut Self)) {
        self.scopes.push(names);
        visit(self);
        self.scopes.pop();
    }
}

impl<'g, 'b, 'a> Visit<'a> for Prefixer<'g, 'b, 'a> {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if self.is_free(it.name.as_str()) {
            let value = self.generator.prefixed(it.name.as_str());
            self.edits.replace(range(it.span), value);
        }
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        match &it.value {
            Expression::Identifier(id) if it.shorthand => {
                if self.is_free(id.name.as_str()) {
                    let value = self.generator.prefixed(id.name.as_str());
                    self.edits.insert(id.span.end as usize, format!(":{}", value));
                }
            }
            _ => walk::walk_object_property(self, it),
        }
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        self.in_scope(param_names(&it.params), |this| {
            walk::walk_arrow_function_expression(this, it)
        });
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        let mut names = param_names(&it.params);
        names.extend(it.id.as_ref().map(|id| id.name.as_str()));
        self.in_scope(names, |this| walk::walk_function(this, it, flags));
    }

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        let mut names = vec![];
        binding_names(&it.id, &mut names);
        match self.scopes.last_mut() {
            Some(scope) => scope.extend(names),
            None => self.scopes.push(names),
        }
        walk::walk_variable_declarator(self, it);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::template::parser::{parse_template, Whitespace};
    use crate::BindingTypes;

    fn gen(src: &str) -> String {
        let (nodes, errors) = parse_template(src, Whitespace::Condense);
        assert!(errors.is_empty(), "{:?}", errors);
        let mut generator = CodeGenerator::new(None, None, false);
        let code = generator.generate(&nodes);
        assert!(generator.errors.is_empty(), "{:?}", generator.errors);
        code
    }

    fn prefix(exp: &str) -> String {
        CodeGenerator::new(None, None, false).prefix(exp)
    }

    #[test]
    fn test_prefix_identifiers() {
        assert_eq!(prefix("a + b.c"), "_vm.a + _vm.b.c");
        assert_eq!(prefix("Math.max(a, 1)"), "Math.max(_vm.a, 1)");
        assert_eq!(prefix("{ a: b, c }"), "{ a: _vm.b, c:_vm.c }");
        assert_eq!(prefix("list.map(x => x + y)"), "_vm.list.map(x => x + _vm.y)");
        assert_eq!(prefix("`${msg}!`"), "`${_vm.msg}!`");
        assert_eq!(prefix("a?.b ? 'x' : null"), "_vm.a?.b ? 'x' : null");
    }

    #[test]
    fn test_prefix_setup_bindings() {
        let mut bindings = BindingMetadata::default();
        bindings.insert("count".into(), BindingTypes::SetupMaybeRef);
        bindings.insert("title".into(), BindingTypes::Props);
        let mut generator = CodeGenerator::new(Some(&bindings), None, false);
        assert_eq!(generator.prefix("count + title"), "_setup.count + _vm.title");
        assert!(generator.uses_setup);
    }

    #[test]
    fn test_prefix_scopes() {
        assert_eq!(
            prefix("items.filter(function (x) { var y = x; return y > min })"),
            "_vm.items.filter(function (x) { var y = x; return y > _vm.min })"
        );
        assert_eq!(prefix("({ a, b = c }) => a + b + d"), "({ a, b = _vm.c }) => a + b + _vm.d");
        assert_eq!(prefix("if (ok) return; n++"), "if (_vm.ok) return; _vm.n++");
        assert_eq!(
            prefix("typeof x === 'undefined' ? undefined : x"),
            "typeof _vm.x === 'undefined' ? undefined : _vm.x"
        );
        // left as written
        assert_eq!(prefix("a +"), "a +");
    }

    #[test]
    fn test_filter_chains() {
        assert_eq!(
            gen("<p>{{ a | b | c(d, 1) }}</p>"),
            r#"_c('p',[_vm._v(_vm._s(_vm._f("c")(_vm._f("b")(_vm.a),_vm.d, 1)))])"#
        );
        assert_eq!(gen("<p>{{ a || b }}</p>"), r#"_c('p',[_vm._v(_vm._s(_vm.a || _vm.b))])"#);
    }

    #[test]
    fn test_handler_kinds() {
        assert_eq!(
            gen("<button @click=\"go($event);\"/>"),
            r#"_c('button',{on:{"click":function($event){return _vm.go($event);}}})"#
        );
        assert_eq!(
            gen("<button @click=\"() => open = true\"/>"),
            r#"_c('button',{on:{"click":() => _vm.open = true}})"#
        );
        assert_eq!(
            gen("<button @click=\"items[0].select\"/>"),
            r#"_c('button',{on:{"click":_vm.items[0].select}})"#
        );
    }

    #[test]
    fn test_v_for_destructuring() {
        assert_eq!(
            gen("<ul><li v-for=\"({ id }, i) of rows\">{{ id }}</li></ul>"),
            "_c('ul',_vm._l((_vm.rows),function({ id },i){return _c('li',[_vm._v(_vm._s(id))])}),0)"
        );
    }

    #[test]
    fn test_element_and_text() {
        assert_eq!(
            gen("<div id=\"app\" class=\"a  b\">hi {{ msg }}</div>"),
            r#"_c('div',{staticClass:"a b",attrs:{"id":"app"}},[_vm._v("hi "+_vm._s(_vm.msg))])"#
        );
        assert_eq!(gen(""), "_c(\"div\")");
    }

    #[test]
    fn test_if_chain() {
        assert_eq!(
            gen("<div><p v-if=\"a\"/>\n<p v-else-if=\"b\"/>\n<p v-else/></div>"),
            "_c('div',[(_vm.a)?_c('p'):(_vm.b)?_c('p'):_c('p')])"
        );
        assert_eq!(
            gen("<div><span v-if=\"ok\">x</span></div>"),
            "_c('div',[(_vm.ok)?_c('span',[_vm._v(\"x\")]):_vm._e()])"
        );
    }

    #[test]
    fn test_v_for() {
        assert_eq!(
            gen("<ul><li v-for=\"(item, i) in items\" :key=\"item.id\">{{ i }}</li></ul>"),
            "_c('ul',_vm._l((_vm.items),function(item,i){return _c('li',{key:item.id},[_vm._v(_vm._s(i))])}),0)"
        );
    }

    #[test]
    fn test_component_list_tip() {
        let (nodes, _) = parse_template("<div><my-comp v-for=\"x in xs\"/></div>", Whitespace::Condense);
        let mut generator = CodeGenerator::new(None, None, false);
        generator.generate(&nodes);
        assert_eq!(generator.tips.len(), 1);
        assert!(generator.tips[0]
            .message
            .starts_with("<my-comp v-for=\"x in xs\">: component lists rendered with v-for"));
    }

    #[test]
    fn test_events() {
        assert_eq!(
            gen("<button @click=\"onClick\"/>"),
            r#"_c('button',{on:{"click":_vm.onClick}})"#
        );
        assert_eq!(
            gen("<button @click=\"count++\"/>"),
            r#"_c('button',{on:{"click":function($event){_vm.count++}}})"#
        );
        assert_eq!(
            gen("<button @click=\"go($event)\"/>"),
            r#"_c('button',{on:{"click":function($event){return _vm.go($event)}}})"#
        );
        assert_eq!(
            gen("<input @keyup.enter.prevent=\"submit\">"),
            concat!(
                r#"_c('input',{on:{"keyup":function($event){"#,
                r#"if(!$event.type.indexOf('key')&&_vm._k($event.keyCode,"enter",13,$event.key,"Enter"))return null;"#,
                r#"$event.preventDefault();return _vm.submit.apply(null, arguments)}}})"#
            )
        );
        assert_eq!(
            gen("<my-comp @click.native.once=\"go\"/>"),
            r#"_c('my-comp',{nativeOn:{"~click":_vm.go}})"#
        );
    }

    #[test]
    fn test_v_model() {
        assert_eq!(
            gen("<input v-model=\"msg\">"),
            concat!(
                r#"_c('input',{directives:[{name:"model",rawName:"v-model",value:(_vm.msg),expression:"msg"}],"#,
                r#"domProps:{"value":(_vm.msg)},"#,
                r#"on:{"input":function($event){if($event.target.composing)return;_vm.msg=$event.target.value}}})"#
            )
        );
        assert_eq!(
            gen("<my-input v-model=\"form.name\"/>"),
            concat!(
                r#"_c('my-input',{model:{value:(_vm.form.name),"#,
                r#"callback:function ($$v) {_vm.$set(_vm.form, "name", $$v)},expression:"form.name"}})"#
            )
        );
    }

    #[test]
    fn test_bindings_and_directives() {
        assert_eq!(
            gen("<div :class=\"{ active: isActive }\" style=\"color: red; font-size: 12px\" v-show=\"ok\"/>"),
            concat!(
                r#"_c('div',{directives:[{name:"show",rawName:"v-show",value:(_vm.ok),expression:"ok"}],"#,
                r#"class:{ active: _vm.isActive },staticStyle:{"color":"red","font-size":"12px"}})"#
            )
        );
        assert_eq!(
            gen("<p>{{ price | currency('$') }}</p>"),
            r#"_c('p',[_vm._v(_vm._s(_vm._f("currency")(_vm.price,'$')))])"#
        );
        assert_eq!(
            gen("<div v-bind=\"attrs\" v-html=\"raw\"/>"),
            r#"_c('div',_vm._b({domProps:{"innerHTML":_vm._s(_vm.raw)}},"div",_vm.attrs,false))"#
        );
    }

    #[test]
    fn test_slots() {
        assert_eq!(
            gen("<div><slot name=\"header\" :title=\"t\">fallback</slot></div>"),
            r#"_c('div',[_vm._t("header",function(){return [_vm._v("fallback")]},{"title":_vm.t})],2)"#
        );
        assert_eq!(
            gen("<my-list><template #item=\"{ row }\">{{ row.name }}</template></my-list>"),
            concat!(
                r#"_c('my-list',{scopedSlots:_vm._u([{key:"item",fn:function({ row }){"#,
                r#"return [_vm._v(_vm._s(row.name))]}}])})"#
            )
        );
        assert_eq!(
            gen("<my-card><template #title>Hi</template></my-card>"),
            r#"_c('my-card',{scopedSlots:_vm._u([{key:"title",fn:function(){return [_vm._v("Hi")]},proxy:true}])})"#
        );
    }

    #[test]
    fn test_root_errors() {
        let (nodes, _) = parse_template("<div/><p/>", Whitespace::Condense);
        let mut generator = CodeGenerator::new(None, None, false);
        generator.generate(&nodes);
        assert_eq!(generator.errors[0].kind, ErrorKind::MultipleRoot);

        let (nodes, _) = parse_template("<li v-for=\"x in xs\"/>", Whitespace::Condense);
        let mut generator = CodeGenerator::new(None, None, false);
        generator.generate(&nodes);
        assert_eq!(generator.errors[0].kind, ErrorKind::VForOnRoot);

        let (nodes, _) = parse_template("just text", Whitespace::Condense);
        let mut generator = CodeGenerator::new(None, None, false);
        assert_eq!(generator.generate(&nodes), "_c(\"div\")");
        assert_eq!(generator.errors[0].kind, ErrorKind::NoRootElement);
    }
}
