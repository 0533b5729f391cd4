use std::collections::{HashMap, HashSet};

use swc_core::{
    common::Span,
    ecma::{
        ast::*,
        visit::{noop_visit_mut_type, VisitMut, VisitMutWith},
    },
};

use crate::{
    flow::{convert_to_flow, Candidate, FlowImport},
    marker::{is_action, is_action_or_factory},
    resolve::ResolutionContext,
};

/// Class name to the member names decorated with the marker.
pub type AllowList = HashMap<String, HashSet<String>>;

/// Nodes some scanner has already dealt with, keyed by source span.
///
/// Synthesized nodes carry a dummy span and are never recorded.
#[derive(Debug, Default)]
pub struct Handled {
    spans: HashSet<Span>,
}

impl Handled {
    pub fn mark(&mut self, span: Span) {
        if !span.is_dummy() {
            self.spans.insert(span);
        }
    }

    pub fn contains(&self, span: Span) -> bool {
        !span.is_dummy() && self.spans.contains(&span)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Finds action-marked functions and routes them through `flow`.
///
/// Without an allow-list this is the primary walk: marker calls and
/// decorated members. With one it is a restricted walk over a single scope
/// that only looks at class members.
pub struct ActionScanner<'a> {
    ctx: &'a ResolutionContext,
    flow: &'a mut FlowImport,
    handled: &'a mut Handled,
    allow_list: Option<&'a AllowList>,
    // Name of the innermost enclosing class, if it has one
    class_names: Vec<Option<String>>,
    // Binding name for `var Foo = class { ... }`
    class_binding_name: Option<String>,
    converted: usize,
}

impl<'a> ActionScanner<'a> {
    pub fn new(
        ctx: &'a ResolutionContext,
        flow: &'a mut FlowImport,
        handled: &'a mut Handled,
    ) -> Self {
        Self {
            ctx,
            flow,
            handled,
            allow_list: None,
            class_names: Vec::new(),
            class_binding_name: None,
            converted: 0,
        }
    }

    pub fn restricted(
        ctx: &'a ResolutionContext,
        flow: &'a mut FlowImport,
        handled: &'a mut Handled,
        allow_list: &'a AllowList,
    ) -> Self {
        Self {
            allow_list: Some(allow_list),
            ..Self::new(ctx, flow, handled)
        }
    }

    /// Number of functions rewritten by this scanner.
    pub fn converted(&self) -> usize {
        self.converted
    }

    fn convert(&mut self, candidate: Candidate<'_>, surface: &'static str) {
        if convert_to_flow(candidate, self.flow) {
            self.converted += 1;
            tracing::debug!(surface, "converted async action to flow");
        }
    }

    fn current_class(&self) -> Option<&str> {
        self.class_names.last().and_then(|name| name.as_deref())
    }

    /// Members of the current class that the allow-list names, if it names the class.
    fn allowed_members(&self) -> Option<&'a HashSet<String>> {
        let allow_list = self.allow_list?;
        allow_list.get(self.current_class()?)
    }

    fn with_class<F>(&mut self, name: Option<String>, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.class_names.push(name);
        f(self);
        self.class_names.pop();
    }

    /// `action(fn)` and `action(name, fn)`. Returns whether the call was handled.
    fn scan_call(&mut self, call: &mut CallExpr) -> bool {
        if self.allow_list.is_some() {
            return false;
        }
        let Callee::Expr(callee) = &call.callee else {
            return false;
        };
        if !is_action(callee, self.ctx) {
            return false;
        }

        let index = match call.args.len() {
            1 => 0,
            2 => 1,
            _ => return false,
        };

        let arg = &mut call.args[index];
        if arg.spread.is_none() {
            if let Some(candidate) = Candidate::from_expr(&mut arg.expr) {
                self.convert(candidate, "call");
            }
        }
        true
    }

    /// Assignments of the shape `this.<name> = <function>` in a constructor body.
    fn scan_constructor_fields(&mut self, body: &mut BlockStmt) {
        for stmt in &mut body.stmts {
            let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
                continue;
            };
            let Expr::Assign(assign) = &mut **expr else {
                continue;
            };
            if assign.op != AssignOp::Assign || !is_this_field(&assign.left) {
                continue;
            }
            if let Some(candidate) = Candidate::from_expr(&mut assign.right) {
                self.convert(candidate, "constructor field");
            }
        }
    }
}

fn is_this_field(target: &AssignTarget) -> bool {
    matches!(
        target,
        AssignTarget::Simple(SimpleAssignTarget::Member(MemberExpr {
            obj,
            prop: MemberProp::Ident(_),
            ..
        })) if matches!(&**obj, Expr::This(_))
    )
}

fn prop_name(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.as_str().to_string()),
        _ => None,
    }
}

impl VisitMut for ActionScanner<'_> {
    noop_visit_mut_type!();

    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        if self.handled.contains(call.span) {
            return;
        }
        if self.scan_call(call) {
            self.handled.mark(call.span);
            return;
        }
        call.visit_mut_children_with(self);
    }

    fn visit_mut_class_decl(&mut self, class_decl: &mut ClassDecl) {
        let name = class_decl.ident.sym.to_string();
        self.with_class(Some(name), |this| class_decl.class.visit_mut_with(this));
    }

    fn visit_mut_class_expr(&mut self, class_expr: &mut ClassExpr) {
        // The internal name wins: it is what the class body sees itself as.
        let binding_name = self.class_binding_name.take();
        let name = class_expr
            .ident
            .as_ref()
            .map(|i| i.sym.to_string())
            .or(binding_name);
        self.with_class(name, |this| class_expr.class.visit_mut_with(this));
    }

    fn visit_mut_var_declarator(&mut self, declarator: &mut VarDeclarator) {
        if let (Pat::Ident(binding), Some(init)) = (&declarator.name, &declarator.init) {
            if matches!(&**init, Expr::Class(_)) {
                self.class_binding_name = Some(binding.id.sym.to_string());
            }
        }
        declarator.visit_mut_children_with(self);
        self.class_binding_name = None;
    }

    fn visit_mut_class_method(&mut self, method: &mut ClassMethod) {
        if self.handled.contains(method.span) {
            return;
        }

        if let Some(members) = self.allowed_members() {
            if prop_name(&method.key).is_some_and(|name| members.contains(&name)) {
                self.convert(Candidate::Function(&mut *method.function), "allow-listed method");
                self.handled.mark(method.span);
                return;
            }
        }

        let decorated = method
            .function
            .decorators
            .iter()
            .any(|decorator| is_action_or_factory(&decorator.expr, self.ctx));
        if decorated {
            self.convert(Candidate::Function(&mut *method.function), "decorated method");
            self.handled.mark(method.span);
            return;
        }

        method.visit_mut_children_with(self);
    }

    fn visit_mut_class_prop(&mut self, prop: &mut ClassProp) {
        if self.handled.contains(prop.span) {
            return;
        }

        let allow_listed = self.allowed_members().is_some_and(|members| {
            prop_name(&prop.key).is_some_and(|name| members.contains(&name))
        });
        let decorated = !allow_listed
            && prop
                .decorators
                .iter()
                .any(|decorator| is_action_or_factory(&decorator.expr, self.ctx));

        if allow_listed || decorated {
            if let Some(value) = prop.value.as_deref_mut() {
                if let Some(candidate) = Candidate::from_expr(value) {
                    let surface = if allow_listed {
                        "allow-listed property"
                    } else {
                        "decorated property"
                    };
                    self.convert(candidate, surface);
                }
            }
            self.handled.mark(prop.span);
            return;
        }

        prop.visit_mut_children_with(self);
    }

    fn visit_mut_constructor(&mut self, constructor: &mut Constructor) {
        if self.handled.contains(constructor.span) {
            return;
        }

        // Every field function assigned in the constructor of an allow-listed
        // class counts, compiled property decorators end up there.
        if self.allowed_members().is_some() {
            if let Some(body) = constructor.body.as_mut() {
                self.scan_constructor_fields(body);
            }
            self.handled.mark(constructor.span);
            return;
        }

        constructor.visit_mut_children_with(self);
    }
}
