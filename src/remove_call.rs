//! Dead-call removal.
//!
//! Deletes statement-level calls to a target function wherever the resolver
//! traces the callee to an import of the target module: a bare call through
//! a named import (aliases included), or `obj.name(...)` where `obj` is a
//! namespace or default import of the module. Any number of import
//! declarations for the same module are tracked independently. Calls whose
//! callee resolves to a local declaration of the same name, or does not
//! resolve at all, pass through unchanged.

use rustc_hash::FxHashSet;
use swc_core::ecma::{
    ast::*,
    visit::{VisitMut, VisitMutWith},
};

use crate::config::RemoveCallTarget;
use crate::scope::{BindingId, BindingKind, ModuleScopes};

pub fn remove_calls(module: &mut Module, scopes: &ModuleScopes, target: &RemoveCallTarget) {
    let mut direct = FxHashSet::default();
    let mut module_objects = FxHashSet::default();
    for (id, binding) in scopes.bindings() {
        let Some(import) = &binding.import else { continue };
        if import.source != target.source {
            continue;
        }
        match binding.kind {
            BindingKind::NamedImport if import.imported == target.name => {
                direct.insert(id);
            }
            BindingKind::NamespaceImport | BindingKind::DefaultImport => {
                module_objects.insert(id);
            }
            _ => {}
        }
    }
    if direct.is_empty() && module_objects.is_empty() {
        return;
    }

    let mut remover = RemoveCalls {
        scopes,
        direct,
        module_objects,
        target_name: &target.name,
        removed: 0,
    };
    module.visit_mut_with(&mut remover);
    tracing::debug!(
        target_fn = %target.name,
        module = %target.source,
        removed = remover.removed,
        "dead-call removal finished"
    );
}

struct RemoveCalls<'a> {
    scopes: &'a ModuleScopes,
    direct: FxHashSet<BindingId>,
    module_objects: FxHashSet<BindingId>,
    target_name: &'a str,
    removed: usize,
}

impl RemoveCalls<'_> {
    /// True for an expression statement whose whole expression is a call to
    /// the target. Consumed call results (assignments etc.) never match.
    fn is_dead_stmt(&self, stmt: &Stmt) -> bool {
        let Some(expr_stmt) = stmt.as_expr() else { return false };
        let Some(call) = expr_stmt.expr.as_call() else { return false };
        let Some(callee) = call.callee.as_expr() else { return false };
        match &**callee {
            Expr::Ident(ident) => self
                .scopes
                .resolve(ident)
                .is_some_and(|id| self.direct.contains(&id)),
            Expr::Member(member) => {
                let Some(obj) = member.obj.as_ident() else { return false };
                let Some(prop) = member.prop.as_ident() else { return false };
                prop.sym.as_ref() == self.target_name
                    && self
                        .scopes
                        .resolve(obj)
                        .is_some_and(|id| self.module_objects.contains(&id))
            }
            _ => false,
        }
    }

    fn filter_stmt(&mut self, stmt: &Stmt) -> bool {
        let dead = self.is_dead_stmt(stmt);
        if dead {
            self.removed += 1;
        }
        !dead
    }
}

impl VisitMut for RemoveCalls<'_> {
    fn visit_mut_module(&mut self, n: &mut Module) {
        n.body.retain(|item| match item {
            ModuleItem::Stmt(stmt) => self.filter_stmt(stmt),
            ModuleItem::ModuleDecl(_) => true,
        });
        n.visit_mut_children_with(self);
    }

    fn visit_mut_block_stmt(&mut self, n: &mut BlockStmt) {
        n.stmts.retain(|stmt| self.filter_stmt(stmt));
        n.visit_mut_children_with(self);
    }
}
