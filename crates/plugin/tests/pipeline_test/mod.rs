use super::common::*;
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;
use parking_lot::Mutex;
use std::io;
use std::path::Path;
use vue2_sfc_plugin::{
    descriptor_id, Diagnostic, Options, PluginContext, PluginError, ReactivityTransform, Target,
    VueQuery, HMR_RUNTIME_ID, NORMALIZER_ID,
};

const HELLO: &str =
    "<template><div>{{msg}}</div></template>\n<script>export default {data(){return {msg:'hi'}}}</script>";

fn app_id() -> String {
    descriptor_id(Path::new(ROOT), APP)
}

/// Holds the first `resolve` until the gate opens, later calls pass.
struct GatedContext {
    inner: TestContext,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    events: Mutex<Vec<&'static str>>,
}

#[async_trait]
impl PluginContext for GatedContext {
    async fn resolve(&self, source: &str, importer: &str) -> io::Result<Option<String>> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            self.events.lock().push("suspended");
            let _ = gate.await;
            self.events.lock().push("resumed");
        }
        self.inner.resolve(source, importer).await
    }
    fn error(&self, diagnostic: Diagnostic) {
        self.inner.error(diagnostic)
    }
    fn warn(&self, diagnostic: Diagnostic) {
        self.inner.warn(diagnostic)
    }
}

#[test]
fn test_inline_script_and_template() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let res = transform(&plugin, &ctx, HELLO, APP);
    let code = &res.code;
    assert!(code.starts_with("const _sfc_main = {data(){return {msg:'hi'}}}"));
    assert!(!code.contains("type=script"));
    assert!(code.contains("var _sfc_render = function render()"));
    assert!(code.contains("_vm._s(_vm.msg)"));
    assert!(code.contains("_sfc_render._withStripped = true"));
    assert!(code.contains("import __normalizer from \"\\u0000plugin-vue2:normalizer\""));
    assert!(code.contains(
        "__normalizer(\n  _sfc_main,\n  _sfc_render,\n  _sfc_staticRenderFns,\n  false,\n  null,\n  null,\n  null,\n  null\n)"
    ));
    assert!(code.contains("__component__.options.__file = \"/project/src/App.vue\""));
    assert!(code.contains(&format!("createRecord(\"{}\", __component__.options)", app_id())));
    assert!(code.contains("import.meta.hot.accept("));
    assert!(code.ends_with("export default __component__.exports"));
    assert_eq!(res.meta.unwrap().lang, "js");
    assert!(ctx.errors.lock().is_empty());
    assert_eq!(plugin.descriptors().get_descriptor(APP).unwrap().id, app_id());
}

#[test]
fn test_no_script_no_template() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let res = transform(&plugin, &ctx, "<style>.a { color: red }</style>", APP);
    assert!(res.code.starts_with("const _sfc_main = {}"));
    assert!(res.code.contains("  _sfc_main,\n  undefined,\n  undefined,\n  false,"));
    // no server, no hot reload
    assert!(!res.code.contains("import.meta.hot"));
    assert!(!res.code.contains("__VUE_HMR_RUNTIME__"));
}

#[test]
fn test_external_ts_script() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let source = "<template><p>x</p></template>\n<script lang=\"ts\" src=\"./comp.ts\"></script>";
    let res = transform(&plugin, &ctx, source, APP);
    let request = "\"./comp.ts?vue&type=script&src=true&lang.ts\"";
    assert!(res.code.starts_with(&format!(
        "import _sfc_main from {0}\nexport * from {0}",
        request
    )));
    assert_eq!(res.meta.unwrap().lang, "ts");
    // the block file is owned by the component
    let owner = plugin
        .descriptors()
        .get_src_descriptor("/project/src/comp.ts", &VueQuery::default())
        .unwrap();
    assert_eq!(owner.filename, APP);
}

#[test]
fn test_inline_ts_in_dev_server() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let source = "<script lang=\"ts\">\nexport default { data(): { n: number } { return { n: 1 } } }\n</script>";
    let res = transform(&plugin, &ctx, source, APP);
    assert!(!res.code.contains("type=script"));
    assert!(!res.code.contains("number"));
    assert!(res.code.contains("_sfc_main"));
    assert!(res.code.contains("__component__"));
    assert!(res.map.is_empty());
}

#[test]
fn test_ts_in_build_goes_through_sub_request() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let source = "<script lang=\"ts\">\nexport default { name: 'A' }\n</script>";
    let res = transform(&plugin, &ctx, source, APP);
    // the module went through type stripping, quotes may differ
    assert!(res.code.contains("/project/src/App.vue?vue&type=script&lang.ts"));
    let loaded = plugin
        .load("/project/src/App.vue?vue&type=script&lang.ts", Target::Client)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.code.trim(), "export default { name: 'A' }");
}

#[test]
fn test_style_imports() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let source = "<template><p class=\"a\">x</p></template>\n<style scoped>.a { color: red }</style>\n<style module>.b { color: blue }</style>\n<style lang=\"scss\" module=\"classes\">.c { color: green }</style>";
    let res = transform(&plugin, &ctx, source, APP);
    let id = app_id();
    let code = &res.code;
    assert!(code.contains(&format!(
        "\nimport \"/project/src/App.vue?vue&type=style&index=0&scoped={}&lang.css\"",
        id
    )));
    assert!(code.contains("\nimport style1 from \"/project/src/App.vue?vue&type=style&index=1&lang.module.css\""));
    assert!(code.contains("\nimport style2 from \"/project/src/App.vue?vue&type=style&index=2&lang.module.scss\""));
    assert!(code.contains("const __cssModules = {\n\"$style\":style1,\n\"classes\":style2,\n}"));
    assert!(code.contains("function _sfc_injectStyles(ctx)"));
    assert!(code.contains(&format!("  _sfc_injectStyles,\n  \"{}\",", id)));

    let style = load_and_transform(
        &plugin,
        &ctx,
        &format!("/project/src/App.vue?vue&type=style&index=0&scoped={}&lang.css", id),
    );
    assert!(style.code.contains(&format!(".a[data-v-{}]", id)));
    let style = load_and_transform(
        &plugin,
        &ctx,
        "/project/src/App.vue?vue&type=style&index=1&lang.module.css",
    );
    assert_eq!(style.code.trim_end(), ".b { color: blue }");
}

#[test]
fn test_style_request_errors() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    transform(&plugin, &ctx, "<style>.a { color: red }\n.b..c {}</style>", APP);
    let id = "/project/src/App.vue?vue&type=style&index=0&lang.css";
    let loaded = plugin.load(id, Target::Client).unwrap().unwrap();
    let res = block_on(plugin.transform(&ctx, &loaded.code, id, Target::Client)).unwrap();
    assert!(res.is_none());
    let errors = ctx.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].file, APP);
    assert!(errors[0].message.starts_with("Invalid CSS: "));
    assert_eq!(errors[0].line, Some(2));

    let missing = "/project/src/App.vue?vue&type=style&index=3&lang.css";
    let err = block_on(plugin.transform(&ctx, "", missing, Target::Client)).unwrap_err();
    assert!(matches!(err, PluginError::InvalidRequest { .. }));
}

#[test]
fn test_custom_blocks() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let source = "<template><p>x</p></template>\n<docs lang=\"md\">hello</docs>\n<i18n>{}</i18n>";
    let res = transform(&plugin, &ctx, source, APP);
    assert!(res.code.contains("import block0 from \"/project/src/App.vue?vue&type=docs&index=0&lang.md\""));
    assert!(res.code.contains("if (typeof block0 === 'function') block0(_sfc_main)"));
    assert!(res.code.contains("import block1 from \"/project/src/App.vue?vue&type=i18n&index=1&lang.i18n\""));
    let loaded = plugin
        .load("/project/src/App.vue?vue&type=docs&index=0&lang.md", Target::Client)
        .unwrap()
        .unwrap();
    assert_eq!(loaded.code, "hello");
}

#[test]
fn test_template_sub_request() {
    let plugin = dev_plugin();
    let ctx = TestContext::default();
    let source = "<template lang=\"html\"><div>{{a}}</div></template>";
    let res = transform(&plugin, &ctx, source, APP);
    assert!(res.code.contains(
        "import { render as _sfc_render, staticRenderFns as _sfc_staticRenderFns } from \"/project/src/App.vue?vue&type=template&lang.js\""
    ));
    let template = load_and_transform(&plugin, &ctx, "/project/src/App.vue?vue&type=template&lang.js");
    assert!(template.code.starts_with("var render = function render()"));
    assert!(template
        .code
        .contains(&format!("__VUE_HMR_RUNTIME__.rerender(\"{}\", render)", app_id())));
    assert!(template.code.ends_with("\nexport { render, staticRenderFns }"));
}

#[test]
fn test_template_errors_are_reported() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let res = transform(&plugin, &ctx, "<template lang=\"pug\">div</template>", APP);
    assert!(res.code.contains("type=template&lang.js"));
    load_and_transform(&plugin, &ctx, "/project/src/App.vue?vue&type=template&lang.js");
    assert_eq!(ctx.errors.lock().len(), 1);
}

#[test]
fn test_resolve_and_load_helpers() {
    let plugin = build_plugin(Options::default());
    assert_eq!(plugin.resolve_id(NORMALIZER_ID).as_deref(), Some(NORMALIZER_ID));
    assert_eq!(plugin.resolve_id(HMR_RUNTIME_ID).as_deref(), Some(HMR_RUNTIME_ID));
    let block = "/project/src/App.vue?vue&type=template&lang.js";
    assert_eq!(plugin.resolve_id(block).as_deref(), Some(block));
    assert_eq!(plugin.resolve_id("/project/src/main.js"), None);

    let normalizer = plugin.load(NORMALIZER_ID, Target::Client).unwrap().unwrap();
    assert!(normalizer.code.contains("export default function normalizeComponent"));
    assert!(plugin.load("/project/src/main.js", Target::Client).unwrap().is_none());
    let err = plugin.load(block, Target::Client).unwrap_err();
    assert!(matches!(err, PluginError::DescriptorNotFound(_)));
}

#[test]
fn test_raw_and_unrelated_ids() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let raw = block_on(plugin.transform(&ctx, HELLO, "/project/src/App.vue?raw", Target::Client)).unwrap();
    assert!(raw.is_none());
    let js = block_on(plugin.transform(&ctx, "let a = $ref(1)", "/project/src/a.js", Target::Client)).unwrap();
    assert!(js.is_none());
}

#[test]
fn test_reactivity_transform() {
    let plugin = build_plugin(Options {
        reactivity_transform: ReactivityTransform::Enabled(true),
        ..Default::default()
    });
    let ctx = TestContext::default();
    let res = transform(&plugin, &ctx, "let a = $ref(1)\nconsole.log(a)", "/project/src/a.js");
    assert!(res.code.contains("_ref(1)"));
    assert!(res.code.contains("console.log(a.value)"));
    let dep = block_on(plugin.transform(
        &ctx,
        "let a = $ref(1)",
        "/project/node_modules/dep/a.js",
        Target::Client,
    ))
    .unwrap();
    assert!(dep.is_none());
}

#[test]
fn test_parse_error_keeps_last_good() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    transform(&plugin, &ctx, HELLO, APP);
    let err = block_on(plugin.transform(&ctx, "<template><div>", APP, Target::Client)).unwrap_err();
    match &err {
        PluginError::Parse { file, diagnostics } => {
            assert_eq!(file, APP);
            assert!(!diagnostics.is_empty());
        }
        e => panic!("unexpected error {:?}", e),
    }
    assert_eq!(plugin.descriptors().get_descriptor(APP).unwrap().source, HELLO);
}

#[test]
fn test_resolution_error() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let source = "<style src=\"missing.css\"></style>";
    let err = block_on(plugin.transform(&ctx, source, APP, Target::Client)).unwrap_err();
    assert!(matches!(err, PluginError::Resolution { .. }));
}

#[test]
fn test_interleaved_compiles_keep_their_version() {
    let plugin = dev_plugin();
    let (open, gate) = oneshot::channel();
    let ctx = GatedContext {
        inner: TestContext::default(),
        gate: Mutex::new(Some(gate)),
        events: Mutex::new(vec![]),
    };
    let version = |n: u8| {
        format!(
            "<script>export default {{ name: 'v{0}' }}</script>\n<template><p>v{0}</p></template>\n<style src=\"./shared.css\"></style>",
            n
        )
    };
    let (v1, v2) = (version(1), version(2));

    // the client compile of v1 waits in `resolve` while the server compile
    // of v2 installs its descriptor and finishes
    let client = plugin.transform(&ctx, &v1, APP, Target::Client);
    let server = async {
        let res = plugin.transform(&ctx, &v2, APP, Target::Server).await;
        ctx.events.lock().push("server done");
        let _ = open.send(());
        res
    };
    let (client, server) = block_on(async { futures::join!(client, server) });
    assert_eq!(*ctx.events.lock(), vec!["suspended", "server done", "resumed"]);

    let client = client.unwrap().unwrap().code;
    assert!(client.starts_with("const _sfc_main = { name: 'v1' }"));
    assert!(client.contains("_vm._v(\"v1\")"));
    assert!(!client.contains("v2"));
    let server = server.unwrap().unwrap().code;
    assert!(server.starts_with("const _sfc_main = { name: 'v2' }"));
    assert!(server.contains("_vm._v(\"v2\")"));
    assert!(!server.contains("v1"));
    assert!(ctx.inner.errors.lock().is_empty());

    let descriptors = plugin.descriptors();
    let current = descriptors.get_descriptor(APP).unwrap();
    let previous = descriptors.get_previous_descriptor(APP).unwrap();
    assert_eq!(current.source, v2);
    assert_eq!(previous.source, v1);
    // v1's scripts were dropped when v2 was installed
    let scripts = plugin.scripts();
    assert_eq!(scripts.len(), 1);
    assert!(scripts.get(&current, Target::Server).is_some());
    assert!(scripts.get(&current, Target::Client).is_none());
    assert!(scripts.get(&previous, Target::Client).is_none());
}

#[test]
fn test_targets_have_their_own_script() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let server = transform_for(&plugin, &ctx, HELLO, APP, Target::Server);
    let client = transform_for(&plugin, &ctx, HELLO, APP, Target::Client);
    assert_eq!(plugin.scripts().len(), 2);
    assert_eq!(server.code, client.code);
}

#[test]
fn test_assembled_module() {
    let plugin = build_plugin(Options::default());
    let ctx = TestContext::default();
    let res = transform(&plugin, &ctx, "<style>.a {}</style>\n<docs>x</docs>", APP);
    insta::assert_snapshot!(res.code, @r###"
    const _sfc_main = {}


    import "/project/src/App.vue?vue&type=style&index=0&lang.css"
    import block0 from "/project/src/App.vue?vue&type=docs&index=0&lang.docs"
    if (typeof block0 === 'function') block0(_sfc_main)

    /* normalize component */
    import __normalizer from "\u0000plugin-vue2:normalizer"
    var __component__ = /*#__PURE__*/__normalizer(
      _sfc_main,
      undefined,
      undefined,
      false,
      null,
      null,
      null,
      null
    )
    __component__.options.__file = "/project/src/App.vue"
    export default __component__.exports
    "###);
}
