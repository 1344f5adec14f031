//! Helper modules injected into the output bundle. They are served from
//! memory under ids no file can have.

pub const NORMALIZER_ID: &str = "\0plugin-vue2:normalizer";
pub const HMR_RUNTIME_ID: &str = "\0plugin-vue2:hmr-runtime";

// ES5 only apart from the module syntax, it ends up in user bundles as is.
pub const NORMALIZER_CODE: &str = r#"
export default function normalizeComponent (
  scriptExports,
  render,
  staticRenderFns,
  functionalTemplate,
  injectStyles,
  scopeId,
  moduleIdentifier, /* server only */
  shadowMode /* shadow dom only */
) {
  // Vue.extend constructor export interop
  var options = typeof scriptExports === 'function'
    ? scriptExports.options
    : scriptExports

  if (render) {
    options.render = render
    options.staticRenderFns = staticRenderFns
    options._compiled = true
  }

  if (functionalTemplate) {
    options.functional = true
  }

  if (scopeId) {
    options._scopeId = 'data-v-' + scopeId
  }

  var hook
  if (moduleIdentifier) {
    hook = function (context) {
      if (!context.modules) {
        context.modules = new Set()
      }
      context.modules.add(moduleIdentifier)
    }
    // cached components never run beforeCreate
    options._ssrRegister = hook
  } else if (injectStyles) {
    hook = shadowMode
      ? function () {
        injectStyles.call(
          this,
          (options.functional ? this.parent : this).$root.$options.shadowRoot
        )
      }
      : injectStyles
  }

  if (hook) {
    if (options.functional) {
      // template-only reloads bypass the normalizer
      options._injectStyles = hook
      var originalRender = options.render
      options.render = function renderWithStyleInjection (h, context) {
        hook.call(context)
        return originalRender(h, context)
      }
    } else {
      var existing = options.beforeCreate
      options.beforeCreate = existing
        ? [].concat(existing, hook)
        : [hook]
    }
  }

  return {
    exports: scriptExports,
    options: options
  }
}
"#;

pub const HMR_RUNTIME_CODE: &str = r#"
import api from "vue-hot-reload-api"
import Vue from "vue"

api.install(Vue)
if (!api.compatible) {
  throw new Error("vue-hot-reload-api is not compatible with the installed version of Vue.")
}

export default api
"#;

/// Source of a helper module id.
pub fn helper_code(id: &str) -> Option<&'static str> {
    match id {
        NORMALIZER_ID => Some(NORMALIZER_CODE),
        HMR_RUNTIME_ID => Some(HMR_RUNTIME_CODE),
        _ => None,
    }
}
