use swc_core::ecma::ast::{Callee, Expr, MemberExpr, MemberProp};

use crate::resolve::{ResolutionContext, ACTION};

/// The syntactic form under which an expression denotes the action marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRef {
    /// `action`, or whatever local name `action` was imported as.
    Direct,
    /// `action.bound`, matched by the literal name `action`.
    Bound,
    /// `mobx.action` through a namespace import.
    Namespaced,
}

pub fn classify(expr: &Expr, ctx: &ResolutionContext) -> Option<MarkerRef> {
    match expr {
        Expr::Ident(ident) => match &ctx.marker_alias {
            Some(alias) if ident.sym == *alias => Some(MarkerRef::Direct),
            _ => None,
        },
        Expr::Member(member) => classify_member(member, ctx),
        Expr::Paren(paren) => classify(&paren.expr, ctx),
        _ => None,
    }
}

fn classify_member(member: &MemberExpr, ctx: &ResolutionContext) -> Option<MarkerRef> {
    let (Expr::Ident(obj), MemberProp::Ident(prop)) = (&*member.obj, &member.prop) else {
        return None;
    };

    if &*obj.sym == ACTION && &*prop.sym == "bound" {
        return Some(MarkerRef::Bound);
    }

    match &ctx.namespace_alias {
        Some(namespace) if obj.sym == *namespace && &*prop.sym == ACTION => {
            Some(MarkerRef::Namespaced)
        }
        _ => None,
    }
}

pub fn is_action(expr: &Expr, ctx: &ResolutionContext) -> bool {
    classify(expr, ctx).is_some()
}

/// Matches the marker itself or a call of it, e.g. `@action` and `@action("name")`.
pub fn is_action_or_factory(expr: &Expr, ctx: &ResolutionContext) -> bool {
    match expr {
        Expr::Call(call) => match &call.callee {
            Callee::Expr(callee) => is_action(callee, ctx),
            _ => false,
        },
        Expr::Paren(paren) => is_action_or_factory(&paren.expr, ctx),
        _ => is_action(expr, ctx),
    }
}
