use std::collections::HashSet;

use swc_core::{
    atoms::Atom,
    ecma::{
        ast::{Ident, Module},
        visit::{noop_visit_type, Visit, VisitWith},
    },
};

/// Base name for the local binding of an injected `flow` import.
pub const FLOW_LOCAL_BASE: &str = "_flow";

/// Every identifier name that appears anywhere in a module.
///
/// Bindings, references and globals are not told apart: a name is either
/// free to use for a new top-level import or it is not.
#[derive(Debug, Default)]
pub struct UsedNames {
    names: HashSet<Atom>,
}

impl UsedNames {
    pub fn collect(module: &Module) -> Self {
        let mut used = UsedNames::default();
        module.visit_with(&mut used);
        used
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&Atom::from(name))
    }

    pub fn insert(&mut self, name: &str) {
        self.names.insert(Atom::from(name));
    }

    /// Generate a name based on `base_name` that no identifier in the module uses yet.
    ///
    /// The first candidate is `base_name` itself, then `base_name$1`, `base_name$2`, ...
    pub fn unique(&self, base_name: &str) -> String {
        let mut name = base_name.to_string();
        let mut counter = 0;

        while self.contains(&name) {
            counter += 1;
            name = format!("{}${}", base_name, counter);
        }

        name
    }
}

impl Visit for UsedNames {
    noop_visit_type!();

    fn visit_ident(&mut self, ident: &Ident) {
        self.names.insert(ident.sym.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_returns_base_when_free() {
        let used = UsedNames::default();
        assert_eq!(used.unique(FLOW_LOCAL_BASE), "_flow");
    }

    #[test]
    fn test_unique_skips_taken_names() {
        let mut used = UsedNames::default();
        used.insert("_flow");
        assert_eq!(used.unique("_flow"), "_flow$1");

        used.insert("_flow$1");
        used.insert("_flow$2");
        assert_eq!(used.unique("_flow"), "_flow$3");
    }

    #[test]
    fn test_unique_ignores_unrelated_names() {
        let mut used = UsedNames::default();
        used.insert("flow");
        used.insert("_flowing");
        assert_eq!(used.unique("_flow"), "_flow");
    }
}
