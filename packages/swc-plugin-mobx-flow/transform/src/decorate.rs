//! Compiled decorators.
//!
//! TypeScript without native decorator emit lowers `@action bar() {}` to
//! `tslib_1.__decorate([action], Foo.prototype, "bar", null)` next to the
//! class. The class member itself carries no trace of the decorator, so the
//! `(class, member)` pairs are recovered from those calls and the enclosing
//! statement container is rescanned with them.

use swc_core::{
    common::Span,
    ecma::{
        ast::*,
        visit::{noop_visit_mut_type, noop_visit_type, Visit, VisitMut, VisitMutWith, VisitWith},
    },
};

use crate::{
    flow::FlowImport,
    marker::is_action_or_factory,
    resolve::ResolutionContext,
    scan::{ActionScanner, AllowList, Handled},
};

const DECORATE: &str = "__decorate";
const PROTOTYPE: &str = "prototype";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ScopeKind {
    Module,
    Block,
    SwitchCase,
}

/// A statement container, identified by the node owning the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    kind: ScopeKind,
    span: Span,
}

impl ScopeKey {
    fn of(kind: ScopeKind, span: Span) -> Option<Self> {
        (!span.is_dummy()).then_some(ScopeKey { kind, span })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedAllowList {
    pub scope: ScopeKey,
    pub classes: AllowList,
}

impl ScopedAllowList {
    fn insert(&mut self, class_name: String, member_name: String) {
        self.classes
            .entry(class_name)
            .or_default()
            .insert(member_name);
    }
}

/// Collect the allow-lists of every statement container holding compiled decorator calls.
///
/// Lists come back in the order their scope was first seen.
pub fn collect_allow_lists(module: &Module, ctx: &ResolutionContext) -> Vec<ScopedAllowList> {
    if ctx.helper_namespace_alias.is_none() {
        return Vec::new();
    }

    let mut collector = DecorateCollector {
        ctx,
        scopes: Vec::new(),
        found: Vec::new(),
    };
    module.visit_with(&mut collector);
    collector.found
}

/// `(class, member)` named by a `<tslib>.__decorate([...action...], Class.prototype, "member", _)` call.
fn match_decorate_call(call: &CallExpr, ctx: &ResolutionContext) -> Option<(String, String)> {
    let helper = ctx.helper_namespace_alias.as_ref()?;

    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(MemberExpr {
        obj,
        prop: MemberProp::Ident(method),
        ..
    }) = &**callee
    else {
        return None;
    };
    match &**obj {
        Expr::Ident(namespace) if namespace.sym == *helper && &*method.sym == DECORATE => {}
        _ => return None,
    }

    let [decorators, target, member, _] = call.args.as_slice() else {
        return None;
    };
    if [decorators, target, member]
        .iter()
        .any(|arg| arg.spread.is_some())
    {
        return None;
    }

    let Expr::Array(decorators) = &*decorators.expr else {
        return None;
    };
    let has_action = decorators
        .elems
        .iter()
        .flatten()
        .any(|elem| elem.spread.is_none() && is_action_or_factory(&elem.expr, ctx));
    if !has_action {
        return None;
    }

    let Expr::Member(MemberExpr {
        obj: class,
        prop: MemberProp::Ident(prototype),
        ..
    }) = &*target.expr
    else {
        return None;
    };
    let Expr::Ident(class) = &**class else {
        return None;
    };
    if &*prototype.sym != PROTOTYPE {
        return None;
    }

    let Expr::Lit(Lit::Str(member)) = &*member.expr else {
        return None;
    };

    Some((
        class.sym.to_string(),
        member.value.as_str().to_string(),
    ))
}

struct DecorateCollector<'a> {
    ctx: &'a ResolutionContext,
    // Innermost statement container last
    scopes: Vec<Option<ScopeKey>>,
    found: Vec<ScopedAllowList>,
}

impl DecorateCollector<'_> {
    fn in_scope<F>(&mut self, kind: ScopeKind, span: Span, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.scopes.push(ScopeKey::of(kind, span));
        f(self);
        self.scopes.pop();
    }

    fn record(&mut self, scope: ScopeKey, class_name: String, member_name: String) {
        tracing::debug!(class = %class_name, member = %member_name, "found compiled action decorator");

        match self.found.iter_mut().find(|list| list.scope == scope) {
            Some(list) => list.insert(class_name, member_name),
            None => {
                let mut list = ScopedAllowList {
                    scope,
                    classes: AllowList::new(),
                };
                list.insert(class_name, member_name);
                self.found.push(list);
            }
        }
    }
}

impl Visit for DecorateCollector<'_> {
    noop_visit_type!();

    fn visit_module(&mut self, module: &Module) {
        self.in_scope(ScopeKind::Module, module.span, |this| module.visit_children_with(this));
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.in_scope(ScopeKind::Block, block.span, |this| block.visit_children_with(this));
    }

    fn visit_switch_case(&mut self, case: &SwitchCase) {
        self.in_scope(ScopeKind::SwitchCase, case.span, |this| case.visit_children_with(this));
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Some((class_name, member_name)) = match_decorate_call(call, self.ctx) {
            if let Some(Some(scope)) = self.scopes.last().copied() {
                self.record(scope, class_name, member_name);
            }
        }
        call.visit_children_with(self);
    }
}

/// Run a restricted class member scan over the statement container `list.scope`.
///
/// Returns the number of functions converted.
pub fn rescan_scope(
    module: &mut Module,
    list: &ScopedAllowList,
    ctx: &ResolutionContext,
    flow: &mut FlowImport,
    handled: &mut Handled,
) -> usize {
    let mut finder = ScopeFinder {
        list,
        ctx,
        flow,
        handled,
        converted: None,
    };
    module.visit_mut_with(&mut finder);
    finder.converted.unwrap_or_default()
}

/// Locates one statement container and hands it to a restricted scanner.
struct ScopeFinder<'a> {
    list: &'a ScopedAllowList,
    ctx: &'a ResolutionContext,
    flow: &'a mut FlowImport,
    handled: &'a mut Handled,
    converted: Option<usize>,
}

impl ScopeFinder<'_> {
    fn matches(&self, kind: ScopeKind, span: Span) -> bool {
        self.converted.is_none() && ScopeKey::of(kind, span) == Some(self.list.scope)
    }

    fn scan<N>(&mut self, node: &mut N)
    where
        N: for<'s> VisitMutWith<ActionScanner<'s>>,
    {
        let mut scanner =
            ActionScanner::restricted(self.ctx, self.flow, self.handled, &self.list.classes);
        node.visit_mut_children_with(&mut scanner);
        self.converted = Some(scanner.converted());
    }
}

impl VisitMut for ScopeFinder<'_> {
    noop_visit_mut_type!();

    fn visit_mut_module(&mut self, module: &mut Module) {
        if self.matches(ScopeKind::Module, module.span) {
            self.scan(module);
        } else {
            module.visit_mut_children_with(self);
        }
    }

    fn visit_mut_block_stmt(&mut self, block: &mut BlockStmt) {
        if self.converted.is_some() {
            return;
        }
        if self.matches(ScopeKind::Block, block.span) {
            self.scan(block);
        } else {
            block.visit_mut_children_with(self);
        }
    }

    fn visit_mut_switch_case(&mut self, case: &mut SwitchCase) {
        if self.converted.is_some() {
            return;
        }
        if self.matches(ScopeKind::SwitchCase, case.span) {
            self.scan(case);
        } else {
            case.visit_mut_children_with(self);
        }
    }
}
