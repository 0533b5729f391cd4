#![allow(dead_code)]

use swc_core::{
    common::{sync::Lrc, FileName, SourceMap},
    ecma::{
        ast::*,
        parser::{parse_file_as_module, Syntax, TsSyntax},
        visit::{noop_visit_type, Visit, VisitMutWith, VisitWith},
    },
};
use swc_plugin_mobx_flow_transform::{Config, MobxFlowTransform};

pub fn parse(src: &str) -> Module {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), src.to_string());
    let mut errors = vec![];
    let module = parse_file_as_module(
        &fm,
        Syntax::Typescript(TsSyntax {
            decorators: true,
            ..Default::default()
        }),
        EsVersion::latest(),
        None,
        &mut errors,
    )
    .expect("failed to parse fixture");
    assert!(errors.is_empty(), "recovered parse errors: {:?}", errors);
    module
}

/// Parse and transform with the default config, returning the module and the conversion count.
pub fn transform(src: &str) -> (Module, usize) {
    transform_with(src, Config::default())
}

pub fn transform_with(src: &str, config: Config) -> (Module, usize) {
    let mut module = parse(src);
    let mut transform = MobxFlowTransform::new(config);
    module.visit_mut_with(&mut transform);
    (module, transform.converted())
}

/// `(local, source)` of every import specifier that imports `flow`.
pub fn flow_imports(module: &Module) -> Vec<(String, String)> {
    let mut found = vec![];
    for item in &module.body {
        let ModuleItem::ModuleDecl(ModuleDecl::Import(import_decl)) = item else {
            continue;
        };
        for specifier in &import_decl.specifiers {
            let ImportSpecifier::Named(named) = specifier else {
                continue;
            };
            let imported = match &named.imported {
                Some(ModuleExportName::Ident(id)) => id.sym.to_string(),
                Some(ModuleExportName::Str(s)) => s.value.as_str().to_string(),
                None => named.local.sym.to_string(),
            };
            if imported == "flow" {
                found.push((
                    named.local.sym.to_string(),
                    import_decl.src.value.as_str().to_string(),
                ));
            }
        }
    }
    found
}

/// What became of one function in the output.
#[derive(Debug, Clone)]
pub struct FnReport {
    pub label: String,
    pub is_async: bool,
    /// Name of the callee when the body is `return <callee>(function* () {...})`.
    pub flow_callee: Option<String>,
    /// Body of that generator.
    pub generator_body: Option<BlockStmt>,
}

impl FnReport {
    pub fn is_converted(&self) -> bool {
        self.flow_callee.is_some()
    }
}

/// Every non-generator function of the module in document order.
///
/// Functions are labelled by the name they are bound to: their own name,
/// a class member key, `this.<field>` or a variable name.
pub fn functions(module: &Module) -> Vec<FnReport> {
    let mut collector = FnCollector::default();
    module.visit_with(&mut collector);
    collector.reports
}

pub fn find(module: &Module, label: &str) -> FnReport {
    let matching = find_all(module, label);
    assert_eq!(
        matching.len(),
        1,
        "expected exactly one function labelled {label:?}, found {matching:#?}"
    );
    matching.into_iter().next().unwrap()
}

pub fn find_all(module: &Module, label: &str) -> Vec<FnReport> {
    functions(module)
        .into_iter()
        .filter(|report| report.label == label)
        .collect()
}

fn flow_call(body: &BlockStmt) -> Option<(String, BlockStmt)> {
    let [Stmt::Return(ReturnStmt { arg: Some(arg), .. })] = body.stmts.as_slice() else {
        return None;
    };
    let Expr::Call(call) = &**arg else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Ident(callee) = &**callee else {
        return None;
    };
    let [ExprOrSpread { spread: None, expr }] = call.args.as_slice() else {
        return None;
    };
    let Expr::Fn(generator) = &**expr else {
        return None;
    };
    let function = &generator.function;
    if !function.is_generator || function.is_async || !function.params.is_empty() {
        return None;
    }
    Some((callee.sym.to_string(), function.body.clone()?))
}

fn is_function(expr: &Expr) -> bool {
    match expr {
        Expr::Fn(_) | Expr::Arrow(_) => true,
        Expr::Paren(paren) => is_function(&paren.expr),
        _ => false,
    }
}

fn prop_label(key: &PropName) -> String {
    match key {
        PropName::Ident(ident) => ident.sym.to_string(),
        PropName::Str(s) => s.value.as_str().to_string(),
        _ => "<computed>".to_string(),
    }
}

#[derive(Default)]
struct FnCollector {
    pending_label: Option<String>,
    reports: Vec<FnReport>,
}

impl FnCollector {
    fn record(&mut self, is_async: bool, body: Option<&BlockStmt>) {
        let label = self
            .pending_label
            .take()
            .unwrap_or_else(|| "<anonymous>".to_string());
        let flow = body.and_then(flow_call);
        self.reports.push(FnReport {
            label,
            is_async,
            flow_callee: flow.as_ref().map(|(callee, _)| callee.clone()),
            generator_body: flow.map(|(_, body)| body),
        });
    }
}

impl Visit for FnCollector {
    noop_visit_type!();

    fn visit_class_method(&mut self, method: &ClassMethod) {
        self.pending_label = Some(prop_label(&method.key));
        method.function.visit_with(self);
    }

    fn visit_class_prop(&mut self, prop: &ClassProp) {
        if prop.value.as_deref().is_some_and(is_function) {
            self.pending_label = Some(prop_label(&prop.key));
        }
        prop.visit_children_with(self);
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left {
            if let (Expr::This(_), MemberProp::Ident(prop), true) =
                (&*member.obj, &member.prop, is_function(&assign.right))
            {
                self.pending_label = Some(format!("this.{}", prop.sym));
            }
        }
        assign.right.visit_with(self);
    }

    fn visit_var_declarator(&mut self, declarator: &VarDeclarator) {
        if let (Pat::Ident(binding), Some(init)) = (&declarator.name, &declarator.init) {
            if is_function(init) {
                self.pending_label = Some(binding.id.sym.to_string());
            }
        }
        declarator.visit_children_with(self);
    }

    fn visit_fn_expr(&mut self, fn_expr: &FnExpr) {
        if self.pending_label.is_none() {
            self.pending_label = fn_expr.ident.as_ref().map(|i| i.sym.to_string());
        }
        fn_expr.function.visit_with(self);
    }

    fn visit_function(&mut self, function: &Function) {
        if function.is_generator {
            // `flow` wrappers are reported through their outer function.
            self.pending_label = None;
        } else {
            self.record(function.is_async, function.body.as_ref());
        }
        function.visit_children_with(self);
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        let body = match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => Some(block),
            BlockStmtOrExpr::Expr(_) => None,
        };
        self.record(arrow.is_async, body);
        arrow.visit_children_with(self);
    }
}

/// Number of `await` and `yield` expressions inside `block`.
pub fn suspension_counts(block: &BlockStmt) -> (usize, usize) {
    #[derive(Default)]
    struct Counter {
        awaits: usize,
        yields: usize,
    }

    impl Visit for Counter {
        noop_visit_type!();

        fn visit_await_expr(&mut self, expr: &AwaitExpr) {
            self.awaits += 1;
            expr.visit_children_with(self);
        }

        fn visit_yield_expr(&mut self, expr: &YieldExpr) {
            self.yields += 1;
            expr.visit_children_with(self);
        }
    }

    let mut counter = Counter::default();
    block.visit_with(&mut counter);
    (counter.awaits, counter.yields)
}
