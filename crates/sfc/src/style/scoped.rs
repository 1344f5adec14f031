//! Scoped CSS: every selector gets the component's attribute after its last
//! non pseudo node, keyframes get the component id as a suffix.
//!
//! `>>>`, `/deep/`, `:deep(<selector>)` and `::v-deep(<selector>)` end the
//! scoped part of a selector.

use super::{parse_stylesheet, syntax_error};
use crate::error::CompilationError;
use lightningcss::properties::animation::AnimationName;
use lightningcss::properties::Property;
use lightningcss::rules::keyframes::KeyframesName;
use lightningcss::rules::CssRule;
use lightningcss::selector::{Combinator, Component, PseudoClass, PseudoElement, Selector};
use lightningcss::stylesheet::PrinterOptions;
use lightningcss::traits::ToCss;
use lightningcss::values::ident::{CustomIdent, Ident};
use lightningcss::visitor::{Visit, VisitTypes, Visitor};
use rustc_hash::FxHashMap;
use std::convert::Infallible;

/// Components of `selector` from left to right, combinators included.
fn parse_order<'i>(selector: &Selector<'i>) -> Vec<Component<'i>> {
    // stored right to left by compound
    let raw = selector.iter_raw_match_order().as_slice();
    let mut combinators = raw.iter().rev().filter(|c| c.is_combinator());
    let mut components = Vec::with_capacity(raw.len());
    for compound in raw.split(|c| c.is_combinator()).rev() {
        components.extend(compound.iter().cloned());
        components.extend(combinators.next().cloned());
    }
    components
}

/// The selector text inside `:deep(...)` or `::v-deep(...)`.
fn deep_argument(component: &Component) -> Option<String> {
    let is_deep = match component {
        Component::NonTSPseudoClass(PseudoClass::CustomFunction { name, .. }) => &**name == "deep",
        Component::PseudoElement(PseudoElement::CustomFunction { name, .. }) => &**name == "v-deep",
        _ => false,
    };
    if !is_deep {
        return None;
    }
    let text = Selector::from(vec![component.clone()])
        .to_css_string(PrinterOptions::default())
        .ok()?;
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    Some(text[open + 1..close].trim().to_string())
}

/// Nodes the scope attribute may follow. Pseudos do not count, except
/// `:is()` and `:where()`.
fn is_node(component: &Component) -> bool {
    matches!(
        component,
        Component::LocalName(_)
            | Component::ID(_)
            | Component::Class(_)
            | Component::AttributeInNoNamespaceExists { .. }
            | Component::AttributeInNoNamespace { .. }
            | Component::AttributeOther(_)
            | Component::ExplicitUniversalType
            | Component::Nesting
            | Component::Is(_)
            | Component::Where(_)
    )
}

fn keyframes_name<'a>(name: &'a KeyframesName) -> &'a str {
    match name {
        KeyframesName::Ident(CustomIdent(name)) => &**name,
        KeyframesName::Custom(name) => &**name,
    }
}

/// What a stylesheet declares: `@keyframes` names and deep selectors.
#[derive(Default)]
struct Survey {
    keyframes: Vec<String>,
    deep: Vec<String>,
}

impl<'i> Visitor<'i> for Survey {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        lightningcss::visit_types!(RULES)
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        match rule {
            CssRule::Keyframes(keyframes) => {
                self.keyframes.push(keyframes_name(&keyframes.name).to_string());
            }
            CssRule::Style(style) => {
                for selector in style.selectors.0.iter() {
                    for arg in parse_order(selector).iter().filter_map(deep_argument) {
                        if !self.deep.contains(&arg) {
                            self.deep.push(arg);
                        }
                    }
                }
            }
            _ => {}
        }
        rule.visit_children(self)
    }
}

struct Scoper<'i, 'm> {
    attr: Component<'i>,
    /// `@keyframes` names with their scoped names
    keyframes: &'m FxHashMap<String, String>,
    /// deep selector arguments, parsed
    deep: &'m FxHashMap<&'m str, Vec<Component<'i>>>,
}

impl<'i, 'm> Scoper<'i, 'm> {
    fn scope(&self, selector: &Selector<'i>) -> Selector<'i> {
        let mut scoped: Vec<Component<'i>> = Vec::new();
        let mut unscoped: Vec<Component<'i>> = Vec::new();
        // insertion point of the attribute, the front when there is no node
        let mut node = 0;
        let mut components = parse_order(selector).into_iter();
        while let Some(component) = components.next() {
            let inner = match &component {
                Component::Combinator(Combinator::Deep | Combinator::DeepDescendant) => None,
                _ => match deep_argument(&component) {
                    Some(arg) => self.deep.get(arg.as_str()),
                    None => {
                        if is_node(&component) {
                            node = scoped.len() + 1;
                        }
                        scoped.push(component);
                        continue;
                    }
                },
            };
            if matches!(scoped.last(), Some(Component::Combinator(Combinator::PseudoElement))) {
                scoped.pop();
            }
            if !matches!(scoped.last(), Some(Component::Combinator(Combinator::Descendant))) {
                unscoped.push(Component::Combinator(Combinator::Descendant));
            }
            unscoped.extend(inner.into_iter().flatten().cloned());
            unscoped.extend(components);
            break;
        }
        scoped.insert(node, self.attr.clone());
        scoped.extend(unscoped);
        Selector::from(scoped)
    }

    fn rename(&self, name: &mut AnimationName<'i>) {
        let AnimationName::Ident(CustomIdent(current)) = name else {
            return;
        };
        if let Some(scoped) = self.keyframes.get(&**current) {
            *name = AnimationName::Ident(CustomIdent(scoped.clone().into()));
        }
    }
}

impl<'i, 'm> Visitor<'i> for Scoper<'i, 'm> {
    type Error = Infallible;

    fn visit_types(&self) -> VisitTypes {
        lightningcss::visit_types!(RULES | PROPERTIES)
    }

    fn visit_rule(&mut self, rule: &mut CssRule<'i>) -> Result<(), Self::Error> {
        match rule {
            CssRule::Style(style) => {
                for selector in style.selectors.0.iter_mut() {
                    *selector = self.scope(selector);
                }
            }
            CssRule::Keyframes(keyframes) => {
                if let Some(scoped) = self.keyframes.get(keyframes_name(&keyframes.name)) {
                    keyframes.name = match keyframes.name {
                        KeyframesName::Custom(_) => KeyframesName::Custom(scoped.clone().into()),
                        KeyframesName::Ident(_) => KeyframesName::Ident(CustomIdent(scoped.clone().into())),
                    };
                }
            }
            _ => {}
        }
        rule.visit_children(self)
    }

    fn visit_property(&mut self, property: &mut Property<'i>) -> Result<(), Self::Error> {
        match property {
            Property::AnimationName(names, _) => {
                for name in names.iter_mut() {
                    self.rename(name);
                }
            }
            Property::Animation(animations, _) => {
                for animation in animations.iter_mut() {
                    self.rename(&mut animation.name);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// The first selector of `rule`, a style rule with an empty block.
fn inner_selector<'i>(rule: &'i str, filename: &str) -> Result<Vec<Component<'i>>, CompilationError> {
    let sheet = parse_stylesheet(rule, filename)?;
    let selector = sheet.rules.0.iter().find_map(|rule| match rule {
        CssRule::Style(style) => style.selectors.0.first().map(parse_order),
        _ => None,
    });
    Ok(selector.unwrap_or_default())
}

/// Scopes the rules of `source` to the attribute `id`.
pub(super) fn scope_stylesheet(source: &str, filename: &str, id: &str) -> Result<String, CompilationError> {
    let mut survey = Survey::default();
    parse_stylesheet(source, filename)?
        .visit(&mut survey)
        .unwrap_or_else(|never| match never {});

    let short_id = id.strip_prefix("data-v-").unwrap_or(id);
    let keyframes: FxHashMap<String, String> = survey
        .keyframes
        .iter()
        .map(|name| (name.clone(), format!("{}-{}", name, short_id)))
        .collect();
    let rules: Vec<String> = survey.deep.iter().map(|arg| format!("{} {{}}", arg)).collect();
    let mut deep = FxHashMap::default();
    for (arg, rule) in survey.deep.iter().zip(&rules) {
        deep.insert(arg.as_str(), inner_selector(rule, filename)?);
    }

    let mut sheet = parse_stylesheet(source, filename)?;
    let mut scoper = Scoper {
        attr: Component::AttributeInNoNamespaceExists {
            local_name: Ident(id.to_string().into()),
            local_name_lower: Ident(id.to_ascii_lowercase().into()),
        },
        keyframes: &keyframes,
        deep: &deep,
    };
    sheet.visit(&mut scoper).unwrap_or_else(|never| match never {});
    let printed = sheet
        .to_css(PrinterOptions::default())
        .map_err(|e| syntax_error(source, e))?;
    Ok(printed.code)
}

#[cfg(test)]
mod test {
    use super::*;

    fn scope(selector: &str) -> String {
        let code = scope_stylesheet(&format!("{} {{}}", selector), "A.vue", "data-v-test").unwrap();
        code.split(" {").next().unwrap_or_default().to_string()
    }

    #[test]
    fn test_last_compound() {
        assert_eq!(scope(".a"), ".a[data-v-test]");
        assert_eq!(scope(".b .c:hover"), ".b .c[data-v-test]:hover");
        assert_eq!(scope("d > e, .f::before"), "d > e[data-v-test], .f[data-v-test]::before");
        assert_eq!(scope("a[href]:not(.b)"), "a[href][data-v-test]:not(.b)");
        assert_eq!(scope(":root"), "[data-v-test]:root");
        assert_eq!(scope(".a > :hover"), ".a[data-v-test] > :hover");
        assert_eq!(scope(":is(.a, .b) span:first-child"), ":is(.a, .b) span[data-v-test]:first-child");
    }

    #[test]
    fn test_deep() {
        assert_eq!(scope(".a >>> .b"), ".a[data-v-test] .b");
        assert_eq!(scope(".a /deep/ .b"), ".a[data-v-test] .b");
        assert_eq!(scope(".a :deep(.b)"), ".a[data-v-test] .b");
        assert_eq!(scope(".a::v-deep(.b .c)"), ".a[data-v-test] .b .c");
        assert_eq!(scope("::v-deep(.b)"), "[data-v-test] .b");
        assert_eq!(scope(".x .a :deep(.b) .c"), ".x .a[data-v-test] .b .c");
    }

    #[test]
    fn test_nested_rules() {
        let code = scope_stylesheet("@supports (display: grid) { .a { x: y } }", "A.vue", "data-v-test").unwrap();
        assert!(code.contains(".a[data-v-test]"));
    }
}
