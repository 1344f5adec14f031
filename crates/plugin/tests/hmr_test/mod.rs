use super::common::*;
use std::sync::Arc;
use vue2_sfc_plugin::{HotUpdateContext, ModuleNode, Target};

const SCRIPT: &str = "<script>export default {data(){return {n:1}}}</script>";
const MAIN_URL: &str = "/src/App.vue";

fn component(template: &str, rest: &str) -> String {
    format!("{}\n<template>{}</template>\n{}", SCRIPT, template, rest)
}

fn hot_update(plugin: &vue2_sfc_plugin::VuePlugin, content: &str, modules: &[ModuleNode]) -> Vec<String> {
    plugin
        .handle_hot_update(HotUpdateContext {
            file: APP,
            content,
            modules,
        })
        .unwrap()
        .unwrap()
}

#[test]
fn test_template_only_change_rerenders() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let v1 = transform(&plugin, &ctx, &component("<p>{{n}}</p>", ""), APP);
    assert!(!v1.code.contains("_rerender_only"));
    let v2 = transform(&plugin, &ctx, &component("<p>{{n + 1}}</p>", ""), APP);
    assert!(v2.code.contains("export const _rerender_only = true"));
    assert!(v2.code.contains("__VUE_HMR_RUNTIME__.rerender("));
}

#[test]
fn test_script_change_reloads() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    transform(&plugin, &ctx, &component("<p>{{n}}</p>", ""), APP);
    let changed = "<script>export default {data(){return {n:2}}}</script>\n<template><p>{{n}}</p></template>\n";
    let v2 = transform(&plugin, &ctx, changed, APP);
    assert!(!v2.code.contains("_rerender_only"));
}

#[test]
fn test_template_removal_reloads() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    transform(&plugin, &ctx, &component("<p>x</p>", ""), APP);
    let v2 = transform(&plugin, &ctx, SCRIPT, APP);
    assert!(!v2.code.contains("_rerender_only"));
    assert!(v2.code.contains("  undefined,\n  undefined,"));
    // and back again
    let v3 = transform(&plugin, &ctx, &component("<p>x</p>", ""), APP);
    assert!(!v3.code.contains("_rerender_only"));
}

#[test]
fn test_functional_always_reloads() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let functional = |body: &str| format!("<template functional><p>{}</p></template>", body);
    transform(&plugin, &ctx, &functional("a"), APP);
    let v2 = transform(&plugin, &ctx, &functional("b"), APP);
    assert!(!v2.code.contains("_rerender_only"));
}

#[test]
fn test_no_hmr_in_server_target() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let res = transform_for(&plugin, &ctx, &component("<p>x</p>", ""), APP, Target::Server);
    assert!(!res.code.contains("import.meta.hot"));
}

#[test]
fn test_hot_update_inline_template() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    transform(&plugin, &ctx, &component("<p>{{n}}</p>", ""), APP);
    let prev = plugin.descriptors().get_descriptor(APP).unwrap();
    let prev_script = plugin.scripts().get(&prev, Target::Client).unwrap();

    let modules = [ModuleNode::new(MAIN_URL)];
    let affected = hot_update(&plugin, &component("<p>{{n * 2}}</p>", ""), &modules);
    // no template module, the main module rerenders
    assert_eq!(affected, vec![MAIN_URL]);

    // the unchanged script carries over to the new descriptor
    let next = plugin.descriptors().get_descriptor(APP).unwrap();
    assert!(!Arc::ptr_eq(&prev, &next));
    let carried = plugin.scripts().get(&next, Target::Client).unwrap();
    assert!(Arc::ptr_eq(&prev_script, &carried));

    // the host then transforms the new content, classified as template only
    let res = transform(&plugin, &ctx, &component("<p>{{n * 2}}</p>", ""), APP);
    assert!(res.code.contains("export const _rerender_only = true"));
}

#[test]
fn test_hot_update_template_module() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let source = |body: &str| format!("{}\n<template lang=\"html\">{}</template>", SCRIPT, body);
    transform(&plugin, &ctx, &source("<p>a</p>"), APP);
    let template_url = "/src/App.vue?vue&type=template&lang.js";
    let main = ModuleNode {
        url: MAIN_URL.into(),
        importers: vec!["/src/main.js".into(), "/src/global.css".into()],
    };
    let modules = [main, ModuleNode::new(template_url)];
    let affected = hot_update(&plugin, &source("<p>b</p>"), &modules);
    // css importing the component may depend on the rendered markup
    assert_eq!(affected, vec![template_url, "/src/global.css"]);
}

#[test]
fn test_hot_update_script() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    transform(&plugin, &ctx, &component("<p>{{n}}</p>", ""), APP);
    let changed = "<script>export default {data(){return {n:3}}}</script>\n<template><p>{{n}}</p></template>\n";
    let affected = hot_update(&plugin, changed, &[ModuleNode::new(MAIN_URL)]);
    assert_eq!(affected, vec![MAIN_URL]);
}

#[test]
fn test_hot_update_ts_script_module() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let source = |n: u8| format!("<script lang=\"ts\">export default {{ data() {{ return {{ n: {} }} }} }}</script>", n);
    transform(&plugin, &ctx, &source(1), APP);
    let script_url = "/src/App.vue?vue&type=script&lang.ts";
    let modules = [ModuleNode::new(MAIN_URL), ModuleNode::new(script_url)];
    let affected = hot_update(&plugin, &source(2), &modules);
    assert_eq!(affected, vec![script_url]);
}

#[test]
fn test_hot_update_styles() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let template = "<p>x</p>";
    transform(&plugin, &ctx, &component(template, "<style>.a { color: red }</style>"), APP);
    let style_url = "/src/App.vue?vue&type=style&index=0&lang.css";
    let modules = [ModuleNode::new(MAIN_URL), ModuleNode::new(style_url)];

    let affected = hot_update(&plugin, &component(template, "<style>.a { color: blue }</style>"), &modules);
    assert_eq!(affected, vec![style_url]);

    // gaining a scoped style changes the render output
    let affected = hot_update(
        &plugin,
        &component(template, "<style scoped>.a { color: blue }</style>"),
        &modules,
    );
    assert_eq!(affected, vec![MAIN_URL, style_url]);

    // removing a style needs the main module to drop its import
    let affected = hot_update(&plugin, &component(template, ""), &modules);
    assert_eq!(affected, vec![MAIN_URL]);
}

#[test]
fn test_hot_update_custom_blocks() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let template = "<p>x</p>";
    transform(&plugin, &ctx, &component(template, "<docs>a</docs>"), APP);
    let docs_url = "/src/App.vue?vue&type=docs&index=0&lang.docs";
    let modules = [ModuleNode::new(MAIN_URL), ModuleNode::new(docs_url)];

    let affected = hot_update(&plugin, &component(template, "<docs>b</docs>"), &modules);
    assert_eq!(affected, vec![docs_url]);

    let affected = hot_update(
        &plugin,
        &component(template, "<docs>b</docs><docs>c</docs>"),
        &modules,
    );
    assert_eq!(affected, vec![MAIN_URL]);
}

#[test]
fn test_hot_update_unchanged_content() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let source = component("<p>x</p>", "");
    transform(&plugin, &ctx, &source, APP);
    let affected = hot_update(&plugin, &source, &[ModuleNode::new(MAIN_URL)]);
    assert!(affected.is_empty());
}

#[test]
fn test_hot_update_ignored_files() {
    let plugin = dev_plugin();
    let modules = [ModuleNode::new("/src/main.js")];
    let ctx = HotUpdateContext {
        file: "/project/src/main.js",
        content: "",
        modules: &modules,
    };
    assert!(plugin.handle_hot_update(ctx).unwrap().is_none());
    // never compiled
    let ctx = HotUpdateContext {
        file: "/project/src/Other.vue",
        content: "<template><p/></template>",
        modules: &modules,
    };
    assert!(plugin.handle_hot_update(ctx).unwrap().is_none());
}

#[test]
fn test_hot_update_parse_error() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let source = component("<p>x</p>", "");
    transform(&plugin, &ctx, &source, APP);
    let modules = [ModuleNode::new(MAIN_URL)];
    let res = plugin.handle_hot_update(HotUpdateContext {
        file: APP,
        content: "<template><div>",
        modules: &modules,
    });
    assert!(res.is_err());
    assert_eq!(plugin.descriptors().get_descriptor(APP).unwrap().source, source);
}
