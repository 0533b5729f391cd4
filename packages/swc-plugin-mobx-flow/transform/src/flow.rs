use swc_core::{
    common::{SyntaxContext, DUMMY_SP},
    ecma::ast::*,
};

use crate::{
    naming::{UsedNames, FLOW_LOCAL_BASE},
    resolve::imported_name,
};

/// Canonical export name of the generator wrapper helper.
pub const FLOW: &str = "flow";

/// A function whose body may be routed through `flow`.
pub enum Candidate<'a> {
    Function(&'a mut Function),
    Arrow(&'a mut ArrowExpr),
}

impl<'a> Candidate<'a> {
    /// Function and arrow expressions, looking through parentheses.
    pub fn from_expr(expr: &'a mut Expr) -> Option<Self> {
        match expr {
            Expr::Fn(fn_expr) => Some(Candidate::Function(&mut *fn_expr.function)),
            Expr::Arrow(arrow) => Some(Candidate::Arrow(arrow)),
            Expr::Paren(paren) => Candidate::from_expr(&mut paren.expr),
            _ => None,
        }
    }

    /// The block body of an async function, if this is one.
    fn async_block_body(&mut self) -> Option<&mut BlockStmt> {
        match self {
            Candidate::Function(function) if function.is_async => function.body.as_mut(),
            Candidate::Arrow(arrow) if arrow.is_async => match &mut *arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => Some(block),
                BlockStmtOrExpr::Expr(_) => None,
            },
            _ => None,
        }
    }
}

/// Where the local `flow` binding of a module comes from.
#[derive(Debug)]
enum FlowBinding {
    /// The module already imports `flow` from the marker package.
    Existing(Ident),
    /// A fresh name that has to be imported once the pass is done.
    Pending(Ident),
    Unresolved,
}

/// Hands out the identifier converted bodies call, importing `flow` at most once.
#[derive(Debug)]
pub struct FlowImport {
    package: String,
    binding: FlowBinding,
    used_names: UsedNames,
}

impl FlowImport {
    pub fn new(module: &Module, package: &str) -> Self {
        let binding = match find_flow_import(module, package) {
            Some(local) => FlowBinding::Existing(local),
            None => FlowBinding::Unresolved,
        };

        Self {
            package: package.to_string(),
            binding,
            used_names: UsedNames::collect(module),
        }
    }

    /// The identifier bound to `flow`, creating the pending import on first use.
    pub fn ensure(&mut self) -> Ident {
        match &self.binding {
            FlowBinding::Existing(local) | FlowBinding::Pending(local) => local.clone(),
            FlowBinding::Unresolved => {
                let name = self.used_names.unique(FLOW_LOCAL_BASE);
                self.used_names.insert(&name);
                let local = Ident::new(name.into(), DUMMY_SP, SyntaxContext::empty());
                self.binding = FlowBinding::Pending(local.clone());
                local
            }
        }
    }

    /// The identifier bound to `flow` without creating an import.
    pub fn current(&self) -> Option<&Ident> {
        match &self.binding {
            FlowBinding::Existing(local) | FlowBinding::Pending(local) => Some(local),
            FlowBinding::Unresolved => None,
        }
    }

    /// Prepend the pending import, if any, to the module body.
    pub fn inject(self, module: &mut Module) {
        let FlowBinding::Pending(local) = self.binding else {
            return;
        };

        tracing::debug!(local = %local.sym, package = %self.package, "injecting flow import");

        module.body.insert(
            0,
            ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
                span: DUMMY_SP,
                specifiers: vec![ImportSpecifier::Named(ImportNamedSpecifier {
                    span: DUMMY_SP,
                    local,
                    imported: Some(ModuleExportName::Ident(Ident::new(
                        FLOW.into(),
                        DUMMY_SP,
                        SyntaxContext::empty(),
                    ))),
                    is_type_only: false,
                })],
                src: Box::new(Str {
                    span: DUMMY_SP,
                    value: self.package.as_str().into(),
                    raw: None,
                }),
                type_only: false,
                with: None,
                phase: ImportPhase::Evaluation,
            })),
        );
    }
}

/// Local binding of an existing runtime `import { flow } from "<package>"`.
fn find_flow_import(module: &Module, package: &str) -> Option<Ident> {
    module.body.iter().find_map(|item| {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import_decl)) = item else {
            return None;
        };
        if import_decl.type_only || import_decl.src.value.as_str() != package {
            return None;
        }
        import_decl.specifiers.iter().find_map(|specifier| match specifier {
            ImportSpecifier::Named(named)
                if !named.is_type_only
                    && imported_name(named.imported.as_ref(), &named.local.sym) == FLOW =>
            {
                Some(named.local.clone())
            }
            _ => None,
        })
    })
}

/// Whether `block` is exactly `{ return <flow>(function* () { ... }) }`.
fn is_flow_body(block: &BlockStmt, flow: &Ident) -> bool {
    let [Stmt::Return(ReturnStmt { arg: Some(arg), .. })] = block.stmts.as_slice() else {
        return false;
    };
    let Expr::Call(call) = &**arg else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    let Expr::Ident(callee) = &**callee else {
        return false;
    };
    if callee.sym != flow.sym {
        return false;
    }

    matches!(
        call.args.as_slice(),
        [ExprOrSpread { spread: None, expr }]
            if matches!(&**expr, Expr::Fn(fn_expr)
                if fn_expr.function.is_generator && fn_expr.function.params.is_empty())
    )
}

/// Replace the body of an async, block-bodied function with
/// `{ return <flow>(function* () { <original body> }) }`.
///
/// Returns whether the body was rewritten. Anything else is left as is,
/// including `await` expressions inside the moved body.
pub fn convert_to_flow(mut candidate: Candidate<'_>, flow: &mut FlowImport) -> bool {
    let Some(body) = candidate.async_block_body() else {
        tracing::trace!("candidate is not an async block-bodied function");
        return false;
    };

    if let Some(current) = flow.current() {
        if is_flow_body(body, current) {
            tracing::trace!("candidate already routed through flow");
            return false;
        }
    }

    let flow_ident = flow.ensure();
    let original = std::mem::replace(
        body,
        BlockStmt {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            stmts: vec![],
        },
    );

    let generator = Expr::Fn(FnExpr {
        ident: None,
        function: Box::new(Function {
            params: vec![],
            decorators: vec![],
            span: original.span,
            ctxt: SyntaxContext::empty(),
            body: Some(original),
            is_generator: true,
            is_async: false,
            type_params: None,
            return_type: None,
        }),
    });

    body.stmts.push(Stmt::Return(ReturnStmt {
        span: DUMMY_SP,
        arg: Some(Box::new(Expr::Call(CallExpr {
            span: DUMMY_SP,
            ctxt: SyntaxContext::empty(),
            callee: Callee::Expr(Box::new(Expr::Ident(flow_ident))),
            args: vec![ExprOrSpread {
                spread: None,
                expr: Box::new(generator),
            }],
            type_args: None,
        }))),
    }));

    true
}
