mod config;
mod decorate;
mod flow;
mod marker;
mod naming;
mod resolve;
mod scan;

pub use config::{Config, ConfigError, DEFAULT_MARKER_PACKAGE};
pub use decorate::{collect_allow_lists, ScopeKey, ScopedAllowList};
pub use marker::{classify, is_action, MarkerRef};
pub use resolve::{ResolutionContext, DECORATE_HELPER_PACKAGE};
pub use scan::{AllowList, Handled};

use swc_core::ecma::{
    ast::*,
    visit::{noop_visit_mut_type, VisitMut, VisitMutWith},
};

use crate::{decorate::rescan_scope, flow::FlowImport, scan::ActionScanner};

/// Rewrites async MobX actions so their bodies run through `flow`:
///
/// ```js
/// action(async function f() { await g() })
/// // becomes
/// action(async function f() { return _flow(function* () { await g() }) })
/// ```
///
/// with `import { flow as _flow } from "mobx"` added once at the top of the
/// module, unless the module already imports `flow`.
#[derive(Debug, Default)]
pub struct MobxFlowTransform {
    config: Config,
    converted: usize,
}

impl MobxFlowTransform {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            converted: 0,
        }
    }

    /// Number of functions rewritten so far.
    pub fn converted(&self) -> usize {
        self.converted
    }

    fn transform_module(&mut self, module: &mut Module) {
        let ctx = ResolutionContext::resolve(module, &self.config.marker_package);
        let mut flow = FlowImport::new(module, &ctx.marker_package);
        let mut handled = Handled::default();

        // First pass: marker calls and decorated class members
        let mut scanner = ActionScanner::new(&ctx, &mut flow, &mut handled);
        module.visit_mut_children_with(&mut scanner);
        self.converted += scanner.converted();

        // Second pass: members decorated through compiled `__decorate` calls
        for list in collect_allow_lists(module, &ctx) {
            self.converted += rescan_scope(module, &list, &ctx, &mut flow, &mut handled);
        }

        flow.inject(module);
    }
}

impl VisitMut for MobxFlowTransform {
    noop_visit_mut_type!();

    fn visit_mut_module(&mut self, module: &mut Module) {
        self.transform_module(module);
    }

    // Scripts cannot import `flow`, so there is nothing they could be rewritten to.
    fn visit_mut_script(&mut self, _: &mut Script) {}
}
