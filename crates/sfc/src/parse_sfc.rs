use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, SourceLocation};
use crate::scanner::{
    is_end_tag_start, is_tag_start, scan_end_tag, scan_start_tag, skip_comment, Cursor, RawTag,
};
use crate::script::BindingMetadata;
use crate::source_map::{generate_block_map, RawSourceMap};

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};
use smallvec::{smallvec, SmallVec};
use std::ops::Deref;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PadOption {
    Line,
    Space,
    NoPad,
}

pub struct SfcParseOptions {
    pub filename: String,
    pub source_map: bool,
    pub pad: PadOption,
    pub ignore_empty: bool,
}

impl Default for SfcParseOptions {
    fn default() -> Self {
        Self {
            filename: "anonymous.vue".into(),
            source_map: true,
            pad: PadOption::NoPad,
            ignore_empty: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    True,
    Str(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::True => None,
            Self::Str(s) => Some(s),
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::True => s.serialize_bool(true),
            Self::Str(v) => s.serialize_str(v),
        }
    }
}

/// Block attributes in source order. Equality ignores the order.
#[derive(Clone, Debug, Default)]
pub struct BlockAttrs(Vec<(String, AttrValue)>);

impl BlockAttrs {
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for BlockAttrs {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(n, v)| other.get(n) == Some(v))
    }
}
impl Eq for BlockAttrs {}

impl<S: Into<String>> FromIterator<(S, AttrValue)> for BlockAttrs {
    fn from_iter<T: IntoIterator<Item = (S, AttrValue)>>(iter: T) -> Self {
        let mut attrs = Self::default();
        for (name, value) in iter {
            attrs.insert(name, value);
        }
        attrs
    }
}

#[cfg(feature = "serde")]
impl Serialize for BlockAttrs {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(self.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Template,
    Script,
    Style,
    Custom(String),
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "template" => Self::Template,
            "script" => Self::Script,
            "style" => Self::Style,
            _ => Self::Custom(tag.to_string()),
        }
    }
    pub fn as_str(&self) -> &str {
        match self {
            Self::Template => "template",
            Self::Script => "script",
            Self::Style => "style",
            Self::Custom(s) => s,
        }
    }
}

#[cfg(feature = "serde")]
impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SfcBlock {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: BlockKind,
    pub content: String,
    pub attrs: BlockAttrs,
    pub loc: SourceLocation,
    pub lang: Option<String>,
    pub src: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub map: Option<RawSourceMap>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SfcScriptBlock {
    pub setup: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub bindings: Option<BindingMetadata>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub block: SfcBlock,
}

impl Deref for SfcScriptBlock {
    type Target = SfcBlock;
    fn deref(&self) -> &SfcBlock {
        &self.block
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SfcStyleBlock {
    pub scoped: bool,
    pub module: Option<String>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub block: SfcBlock,
}

impl Deref for SfcStyleBlock {
    type Target = SfcBlock;
    fn deref(&self) -> &SfcBlock {
        &self.block
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SfcDescriptor {
    pub id: String,
    pub filename: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub source: String,
    pub template: Option<SfcBlock>,
    pub script: Option<SfcScriptBlock>,
    pub script_setup: Option<SfcScriptBlock>,
    pub styles: SmallVec<[SfcStyleBlock; 1]>,
    pub custom_blocks: Vec<SfcBlock>,
}

impl SfcDescriptor {
    pub fn is_functional(&self) -> bool {
        self.template
            .as_ref()
            .map_or(false, |t| t.attrs.contains("functional"))
    }
}

pub struct SfcParseResult {
    pub descriptor: SfcDescriptor,
    pub errors: Vec<CompilationError>,
}

pub fn parse_sfc(source: &str, option: SfcParseOptions) -> SfcParseResult {
    let mut descriptor = SfcDescriptor {
        id: String::new(),
        filename: option.filename.clone(),
        source: source.to_string(),
        template: None,
        script: None,
        script_setup: None,
        styles: smallvec![],
        custom_blocks: vec![],
    };
    let mut errors = vec![];
    let mut cursor = Cursor::new(source);
    while !cursor.is_eof() {
        let Some(lt) = cursor.rest().find('<') else {
            break;
        };
        cursor.advance(lt);
        let rest = cursor.rest();
        if rest.starts_with("<!--") {
            if let Err(e) = skip_comment(&mut cursor) {
                errors.push(e);
            }
        } else if is_end_tag_start(rest) {
            let start = cursor.position();
            let res = scan_end_tag(&mut cursor);
            let err = match res {
                Ok(name) => CompilationError::new(ErrorKind::InvalidEndTag)
                    .with_location(cursor.location_from(start))
                    .with_additional_message(format!(" </{}>", name)),
                Err(e) => e,
            };
            errors.push(err);
        } else if is_tag_start(rest) {
            let tag = match scan_start_tag(&mut cursor) {
                Ok(tag) => tag,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            match scan_block(&mut cursor, tag) {
                Ok(block) => add_block(&mut descriptor, block, &mut errors),
                Err(e) => errors.push(e),
            }
        } else {
            cursor.advance(1);
        }
    }
    if option.ignore_empty {
        drop_empty_blocks(&mut descriptor);
    }
    if option.source_map {
        generate_maps(&mut descriptor, source);
    }
    if option.pad != PadOption::NoPad {
        pad_blocks(&mut descriptor, source, option.pad);
    }
    SfcParseResult { descriptor, errors }
}

fn scan_block(cursor: &mut Cursor, tag: RawTag) -> Result<SfcBlock, CompilationError> {
    let kind = BlockKind::from_tag(tag.name);
    let attrs: BlockAttrs = tag
        .attrs
        .iter()
        .map(|a| {
            let value = match a.value {
                Some(v) if !v.is_empty() => AttrValue::Str(v.to_string()),
                _ => AttrValue::True,
            };
            (a.name, value)
        })
        .collect();
    let lang = attrs.get_str("lang").map(String::from);
    let src = attrs.get_str("src").map(String::from);
    let content_start = cursor.position();
    if tag.self_closing {
        return Ok(SfcBlock {
            kind,
            content: String::new(),
            attrs,
            loc: cursor.location_from(content_start),
            lang,
            src,
            map: None,
        });
    }
    let Some(end) = find_block_end(cursor.rest(), tag.name) else {
        cursor.advance(cursor.rest().len());
        return Err(CompilationError::new(ErrorKind::MissingEndTag)
            .with_location(tag.loc)
            .with_additional_message(format!(" <{}>", tag.name)));
    };
    let content = cursor.rest()[..end].to_string();
    cursor.advance(end);
    let loc = cursor.location_from(content_start);
    // consume the end tag
    let _ = scan_end_tag(cursor)?;
    Ok(SfcBlock {
        kind,
        content,
        attrs,
        loc,
        lang,
        src,
        map: None,
    })
}

/// Finds the offset of the closing tag. Only `<template>` nests.
fn find_block_end(rest: &str, name: &str) -> Option<usize> {
    let close = format!("</{}", name);
    if name != "template" {
        let mut from = 0;
        while let Some(i) = rest[from..].find(&close) {
            let at = from + i;
            if is_tag_name_end(&rest[at + close.len()..]) {
                return Some(at);
            }
            from = at + close.len();
        }
        return None;
    }
    let open = "<template";
    let mut depth = 0usize;
    let mut from = 0;
    loop {
        let next_open = rest[from..].find(open).map(|i| from + i);
        let next_close = rest[from..].find(&close).map(|i| from + i);
        match (next_open, next_close) {
            (Some(o), Some(c)) if o < c => {
                if is_tag_name_end(&rest[o + open.len()..]) {
                    depth += 1;
                }
                from = o + open.len();
            }
            (_, Some(c)) => {
                if !is_tag_name_end(&rest[c + close.len()..]) {
                    from = c + close.len();
                    continue;
                }
                if depth == 0 {
                    return Some(c);
                }
                depth -= 1;
                from = c + close.len();
            }
            (_, None) => return None,
        }
    }
}

fn is_tag_name_end(rest: &str) -> bool {
    rest.chars()
        .next()
        .map_or(true, |c| c.is_ascii_whitespace() || c == '>' || c == '/')
}

fn add_block(descriptor: &mut SfcDescriptor, block: SfcBlock, errors: &mut Vec<CompilationError>) {
    let duplicate = |kind: ErrorKind, block: &SfcBlock| {
        CompilationError::new(kind).with_location(block.loc.clone())
    };
    match block.kind {
        BlockKind::Template => {
            if descriptor.template.is_some() {
                errors.push(duplicate(ErrorKind::DuplicateTemplate, &block));
            } else {
                descriptor.template = Some(block);
            }
        }
        BlockKind::Script => {
            let setup = block.attrs.contains("setup");
            if setup && block.src.is_some() {
                errors.push(duplicate(ErrorKind::ScriptSetupSrc, &block));
                return;
            }
            let (slot, kind) = if setup {
                (&mut descriptor.script_setup, ErrorKind::DuplicateScriptSetup)
            } else {
                (&mut descriptor.script, ErrorKind::DuplicateScript)
            };
            if slot.is_some() {
                errors.push(duplicate(kind, &block));
                return;
            }
            *slot = Some(SfcScriptBlock {
                setup,
                bindings: None,
                block,
            });
        }
        BlockKind::Style => {
            let scoped = block.attrs.contains("scoped");
            let module = block.attrs.get("module").map(|v| match v {
                AttrValue::True => "$style".to_string(),
                AttrValue::Str(s) => s.clone(),
            });
            descriptor.styles.push(SfcStyleBlock {
                scoped,
                module,
                block,
            });
        }
        BlockKind::Custom(_) => descriptor.custom_blocks.push(block),
    }
}

fn is_empty_block(block: &SfcBlock) -> bool {
    block.src.is_none() && block.content.trim().is_empty()
}

fn drop_empty_blocks(descriptor: &mut SfcDescriptor) {
    if descriptor.script.as_ref().map_or(false, |s| is_empty_block(s)) {
        descriptor.script = None;
    }
    if descriptor
        .script_setup
        .as_ref()
        .map_or(false, |s| is_empty_block(s))
    {
        descriptor.script_setup = None;
    }
    descriptor.styles.retain(|s| !is_empty_block(s));
    descriptor.custom_blocks.retain(|b| !is_empty_block(b));
}

fn generate_maps(descriptor: &mut SfcDescriptor, source: &str) {
    let filename = descriptor.filename.clone();
    let add_map = |block: &mut SfcBlock| {
        if block.src.is_none() {
            block.map = Some(generate_block_map(
                &filename,
                source,
                &block.content,
                &block.loc.start,
            ));
        }
    };
    if let Some(script) = &mut descriptor.script {
        add_map(&mut script.block);
    }
    if let Some(script) = &mut descriptor.script_setup {
        add_map(&mut script.block);
    }
    for style in descriptor.styles.iter_mut() {
        add_map(&mut style.block);
    }
}

fn pad_content(block: &SfcBlock, source: &str, pad: PadOption) -> String {
    let before = &source[..block.loc.start.offset];
    match pad {
        PadOption::Space => before
            .chars()
            .map(|c| if c == '\n' { '\n' } else { ' ' })
            .collect(),
        PadOption::Line => {
            let pad_line = if block.kind == BlockKind::Script && block.lang.is_none() {
                "//\n"
            } else {
                "\n"
            };
            pad_line.repeat(before.matches('\n').count())
        }
        PadOption::NoPad => String::new(),
    }
}

fn pad_blocks(descriptor: &mut SfcDescriptor, source: &str, pad: PadOption) {
    let pad_block = |block: &mut SfcBlock| {
        let padding = pad_content(block, source, pad);
        block.content.insert_str(0, &padding);
    };
    if let Some(script) = &mut descriptor.script {
        pad_block(&mut script.block);
    }
    if let Some(script) = &mut descriptor.script_setup {
        pad_block(&mut script.block);
    }
    for style in descriptor.styles.iter_mut() {
        pad_block(&mut style.block);
    }
    for block in descriptor.custom_blocks.iter_mut() {
        pad_block(block);
    }
}
