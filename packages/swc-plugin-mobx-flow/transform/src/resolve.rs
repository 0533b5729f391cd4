use swc_core::{
    atoms::Atom,
    ecma::ast::{ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleExportName, ModuleItem},
};

/// Package whose namespace import carries the compiled `__decorate` helper.
pub const DECORATE_HELPER_PACKAGE: &str = "tslib";

/// Canonical export name of the marker.
pub const ACTION: &str = "action";

/// Local names a module uses for the marker and the helper namespaces.
///
/// Built once per module before any rewriting happens and only read after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    /// Local name of `import { action as x } from "<marker_package>"`.
    pub marker_alias: Option<Atom>,
    /// Local name of `import * as x from "<marker_package>"`.
    pub namespace_alias: Option<Atom>,
    /// Local name of `import * as x from "tslib"`.
    pub helper_namespace_alias: Option<Atom>,
    pub marker_package: String,
}

impl ResolutionContext {
    pub fn resolve(module: &Module, marker_package: &str) -> Self {
        let mut ctx = ResolutionContext {
            marker_package: marker_package.to_string(),
            ..Default::default()
        };

        for item in &module.body {
            let ModuleItem::ModuleDecl(ModuleDecl::Import(import_decl)) = item else {
                continue;
            };
            if import_decl.type_only {
                continue;
            }
            ctx.record_import(import_decl);
        }

        tracing::debug!(
            marker = ?ctx.marker_alias,
            namespace = ?ctx.namespace_alias,
            helper_namespace = ?ctx.helper_namespace_alias,
            package = %ctx.marker_package,
            "resolved action aliases"
        );

        ctx
    }

    fn record_import(&mut self, import_decl: &ImportDecl) {
        let src = import_decl.src.value.as_str();

        if src == self.marker_package.as_str() {
            for specifier in &import_decl.specifiers {
                match specifier {
                    ImportSpecifier::Namespace(namespace) => {
                        self.namespace_alias = Some(namespace.local.sym.clone());
                    }
                    ImportSpecifier::Named(named) if !named.is_type_only => {
                        if imported_name(named.imported.as_ref(), &named.local.sym) == ACTION {
                            self.marker_alias = Some(named.local.sym.clone());
                        }
                    }
                    _ => {}
                }
            }
        }

        if src == DECORATE_HELPER_PACKAGE {
            for specifier in &import_decl.specifiers {
                if let ImportSpecifier::Namespace(namespace) = specifier {
                    self.helper_namespace_alias = Some(namespace.local.sym.clone());
                }
            }
        }
    }
}

/// The exported name a named import specifier refers to.
pub(crate) fn imported_name(imported: Option<&ModuleExportName>, local: &Atom) -> String {
    imported
        .map(|i| match i {
            ModuleExportName::Ident(id) => id.sym.to_string(),
            ModuleExportName::Str(s) => s.value.as_str().to_string(),
        })
        .unwrap_or_else(|| local.to_string())
}
