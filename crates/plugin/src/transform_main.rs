use crate::compiler::SfcCompiler;
use crate::context::PluginContext;
use crate::error::{PluginError, Result};
use crate::hmr::is_only_template_changed;
use crate::options::Target;
use crate::plugin::VuePlugin;
use crate::query::{css_module_request, SrcQuery, VueQuery};
use crate::runtime::{HMR_RUNTIME_ID, NORMALIZER_ID};
use crate::script::resolve_script;
use crate::transpile::strip_types;
use crate::util::{basename, extension, strip_query};
use crate::{ModuleMeta, TransformResult};
use sfc::{json_string, BlockKind, RawSourceMap, SfcDescriptor};
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

const MAIN: &str = "_sfc_main";

fn request(src: &str, query: &VueQuery) -> String {
    json_string(&format!("{}{}", src, query.encode()))
}

impl<C: SfcCompiler> VuePlugin<C> {
    /// Assembles the main module of a component: script, render functions,
    /// style imports, custom block calls, normalization and HMR wiring.
    pub(crate) async fn transform_main(
        &self,
        ctx: &dyn PluginContext,
        code: &str,
        filename: &str,
        target: Target,
    ) -> Result<TransformResult> {
        let descriptor = self.install_descriptor(filename, code)?;
        let previous = self.descriptors.get_previous_descriptor(filename);
        let options = &self.options;

        let has_scoped = descriptor.styles.iter().any(|s| s.scoped);
        let has_css_modules = descriptor.styles.iter().any(|s| s.module.is_some());
        let has_functional = descriptor.is_functional();

        let (script_code, script_map) = self.gen_script_code(ctx, &descriptor, target).await?;
        let template_code = self.gen_template_code(ctx, &descriptor, target, has_scoped).await?;
        let styles_code = self.gen_style_code(ctx, &descriptor).await?;
        let custom_blocks_code = self.gen_custom_block_code(ctx, &descriptor).await?;

        let mut output = vec![script_code, template_code, styles_code, custom_blocks_code];
        let (render, static_render_fns) = if descriptor.template.is_some() {
            ("_sfc_render", "_sfc_staticRenderFns")
        } else {
            ("undefined", "undefined")
        };
        output.push(format!(
            "/* normalize component */\nimport __normalizer from {}\nvar __component__ = /*#__PURE__*/__normalizer(\n  {},\n  {},\n  {},\n  {},\n  {},\n  {},\n  null,\n  null\n)",
            json_string(NORMALIZER_ID),
            MAIN,
            render,
            static_render_fns,
            has_functional,
            if has_css_modules { "_sfc_injectStyles" } else { "null" },
            if has_scoped { json_string(&descriptor.id) } else { "null".into() },
        ));

        if options.dev_tools_enabled || (options.dev_server.is_some() && !options.is_production) {
            let file = if options.is_production { basename(filename) } else { filename };
            output.push(format!("__component__.options.__file = {}", json_string(file)));
        }

        if options.hmr_enabled(target) {
            let id = json_string(&descriptor.id);
            output.push(format!("import __VUE_HMR_RUNTIME__ from {}", json_string(HMR_RUNTIME_ID)));
            output.push(format!(
                "if (!__VUE_HMR_RUNTIME__.isRecorded({0})) {{\n  __VUE_HMR_RUNTIME__.createRecord({0}, __component__.options)\n}}",
                id
            ));
            // functional components re-run the normalizer, they always reload
            let rerender_only = !has_functional
                && previous
                    .as_ref()
                    .map_or(false, |prev| is_only_template_changed(prev, &descriptor));
            debug!(file = %filename, id = %descriptor.id, rerender_only, "hmr classified");
            if rerender_only {
                output.push("export const _rerender_only = true".into());
            }
            output.push(format!(
                "import.meta.hot.accept(({{ default: updated, _rerender_only }}) => {{\n  if (_rerender_only) {{\n    __VUE_HMR_RUNTIME__.rerender({0}, updated)\n  }} else {{\n    __VUE_HMR_RUNTIME__.reload({0}, updated)\n  }}\n}})",
                id
            ));
        }

        output.push("export default __component__.exports".into());

        let mut code = output.join("\n");
        let mut map = script_map;
        let is_ts = |lang: Option<&str>| lang == Some("ts");
        let script = descriptor.script.as_ref();
        if (is_ts(script.and_then(|s| s.lang.as_deref()))
            || is_ts(descriptor.script_setup.as_ref().and_then(|s| s.lang.as_deref())))
            && script.map_or(true, |s| s.src.is_none())
        {
            code = strip_types(&code, filename)?;
            // line mappings do not survive code generation
            map = None;
        }

        let lang = descriptor
            .script
            .as_ref()
            .and_then(|s| s.lang.clone())
            .or_else(|| descriptor.script_setup.as_ref().and_then(|s| s.lang.clone()))
            .unwrap_or_else(|| "js".into());
        Ok(TransformResult {
            code,
            map: map.unwrap_or_else(RawSourceMap::empty),
            meta: Some(ModuleMeta { lang }),
        })
    }

    /// Registers the component owning an external block file.
    async fn link_src_to_descriptor(
        &self,
        ctx: &dyn PluginContext,
        src: &str,
        descriptor: &Arc<SfcDescriptor>,
        scoped: bool,
    ) -> Result<()> {
        let resolved = ctx
            .resolve(src, &descriptor.filename)
            .await
            .map_err(|source| PluginError::Resolution {
                src: src.to_string(),
                importer: descriptor.filename.clone(),
                source,
            })?;
        // resolved dependency files may carry a version query
        let path = strip_query(resolved.as_deref().unwrap_or(src));
        self.descriptors
            .set_src_descriptor(path, descriptor.clone(), scoped);
        Ok(())
    }

    async fn gen_script_code(
        &self,
        ctx: &dyn PluginContext,
        descriptor: &Arc<SfcDescriptor>,
        target: Target,
    ) -> Result<(String, Option<RawSourceMap>)> {
        let Some(script) = resolve_script(&self.scripts, &self.compiler, descriptor, &self.options, target)?
        else {
            return Ok((format!("const {} = {{}}", MAIN), None));
        };
        let lang = script.lang.as_deref();
        let inline = (lang.is_none() || (lang == Some("ts") && self.options.dev_server.is_some()))
            && script.src.is_none();
        if inline {
            let code = self.compiler.rewrite_default(&script.content, MAIN);
            return Ok((code, script.map.clone()));
        }
        if let Some(src) = &script.src {
            self.link_src_to_descriptor(ctx, src, descriptor, false).await?;
        }
        let src = script.src.as_deref().unwrap_or(&descriptor.filename);
        let lang_fallback = script.src.as_deref().and_then(extension).unwrap_or("js");
        let mut query = VueQuery::block(BlockKind::Script).with_attrs(&script.attrs, lang_fallback, false);
        if script.src.is_some() {
            query.src = Some(SrcQuery::Plain);
        }
        let import = request(src, &query);
        // named exports pass through
        Ok((
            format!("import {0} from {1}\nexport * from {1}", MAIN, import),
            None,
        ))
    }

    async fn gen_template_code(
        &self,
        ctx: &dyn PluginContext,
        descriptor: &Arc<SfcDescriptor>,
        target: Target,
        has_scoped: bool,
    ) -> Result<String> {
        let Some(template) = &descriptor.template else {
            return Ok(String::new());
        };
        if template.lang.is_none() && template.src.is_none() {
            return self.templates().compile_in_main(ctx, descriptor, target);
        }
        if let Some(src) = &template.src {
            self.link_src_to_descriptor(ctx, src, descriptor, has_scoped).await?;
        }
        let src = template.src.as_deref().unwrap_or(&descriptor.filename);
        let mut query = VueQuery::block(BlockKind::Template).with_attrs(&template.attrs, "js", true);
        if template.src.is_some() {
            query.src = Some(if has_scoped {
                SrcQuery::Owner(descriptor.id.clone())
            } else {
                SrcQuery::Plain
            });
        }
        if has_scoped {
            query.scoped = Some(descriptor.id.clone());
        }
        Ok(format!(
            "import {{ render as _sfc_render, staticRenderFns as _sfc_staticRenderFns }} from {}",
            request(src, &query)
        ))
    }

    async fn gen_style_code(&self, ctx: &dyn PluginContext, descriptor: &Arc<SfcDescriptor>) -> Result<String> {
        let mut code = String::new();
        // exposed name to the local binding of its module
        let mut css_modules: Vec<(&str, String)> = vec![];
        for (i, style) in descriptor.styles.iter().enumerate() {
            if let Some(src) = &style.src {
                self.link_src_to_descriptor(ctx, src, descriptor, style.scoped).await?;
            }
            let src = style.src.as_deref().unwrap_or(&descriptor.filename);
            // `module` is left out, the module variant is addressed by path
            let mut query = VueQuery::block(BlockKind::Style).with_attrs(&style.attrs, "css", false);
            query.index = Some(i);
            if style.src.is_some() {
                query.src = Some(if style.scoped {
                    SrcQuery::Owner(descriptor.id.clone())
                } else {
                    SrcQuery::Plain
                });
            }
            if style.scoped {
                query.scoped = Some(descriptor.id.clone());
            }
            let style_request = format!("{}{}", src, query.encode());
            match &style.module {
                Some(name) => {
                    let binding = format!("style{}", i);
                    let _ = write!(
                        code,
                        "\nimport {} from {}",
                        binding,
                        json_string(&css_module_request(&style_request))
                    );
                    css_modules.retain(|(n, _)| *n != name.as_str());
                    css_modules.push((name.as_str(), binding));
                }
                None => {
                    let _ = write!(code, "\nimport {}", json_string(&style_request));
                }
            }
        }
        if !css_modules.is_empty() {
            code.push_str("\nconst __cssModules = {\n");
            for (name, binding) in &css_modules {
                let _ = writeln!(code, "{}:{},", json_string(name), binding);
            }
            code.push('}');
            code.push_str(
                "\nfunction _sfc_injectStyles(ctx) {\n  for (var key in __cssModules) {\n    this[key] = __cssModules[key]\n  }\n}",
            );
        }
        Ok(code)
    }

    async fn gen_custom_block_code(
        &self,
        ctx: &dyn PluginContext,
        descriptor: &Arc<SfcDescriptor>,
    ) -> Result<String> {
        let mut code = String::new();
        for (index, block) in descriptor.custom_blocks.iter().enumerate() {
            if let Some(src) = &block.src {
                self.link_src_to_descriptor(ctx, src, descriptor, false).await?;
            }
            let src = block.src.as_deref().unwrap_or(&descriptor.filename);
            let mut query =
                VueQuery::block(block.kind.clone()).with_attrs(&block.attrs, block.kind.as_str(), false);
            query.index = Some(index);
            if block.src.is_some() {
                query.src = Some(SrcQuery::Plain);
            }
            let _ = writeln!(code, "import block{} from {}", index, request(src, &query));
            let _ = writeln!(
                code,
                "if (typeof block{0} === 'function') block{0}({1})",
                index, MAIN
            );
        }
        Ok(code)
    }
}
