//! Lexical scope tree and binding resolution.
//!
//! One read-only traversal per call builds a scope tree mirroring the
//! module's lexical nesting and resolves every identifier reference to the
//! binding visible at that point. The traversal runs in source order, so a
//! re-declaration supersedes the earlier binding of the same name only for
//! the remainder of its scope, and a use in a nested block before any local
//! re-declaration still resolves outward.
//!
//! The tree itself is never mutated; the output is an auxiliary table keyed
//! by identifier span (every parsed identifier has a unique span), which the
//! two transforms consult. Unresolved names are ambient and simply absent
//! from the table.

use rustc_hash::FxHashMap;
use swc_core::{
    common::Span,
    ecma::{
        ast::*,
        visit::{Visit, VisitWith},
    },
};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(u32);

/// What construct introduced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    NamedImport,
    DefaultImport,
    NamespaceImport,
    Var,
    Fn,
    Class,
    Param,
}

/// Import provenance of a binding, when it came from an import specifier.
#[derive(Debug, Clone)]
pub struct ImportSource {
    /// Module specifier string, e.g. `"react"`.
    pub source: String,
    /// Imported name: the remote name for named imports, `"default"` for
    /// default imports, `"*"` for namespace imports.
    pub imported: String,
}

#[derive(Debug)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    pub import: Option<ImportSource>,
    /// Set when this binding is a plain alias (`const Item = List.Item`):
    /// references to it also count as references to the chain root.
    pub alias_of: Option<BindingId>,
    pub decl_span: Span,
    referenced: bool,
}

/// Resolver output for one module. Built fresh per call, discarded after the
/// transforms run.
pub struct ModuleScopes {
    bindings: Vec<Binding>,
    /// Identifier span start -> binding it resolves to.
    resolved: FxHashMap<u32, BindingId>,
    /// Declaring identifier span start -> its binding.
    decls: FxHashMap<u32, BindingId>,
}

impl ModuleScopes {
    pub fn build(module: &Module) -> Result<Self, Error> {
        let mut builder = ScopeBuilder::new();
        module.visit_with(&mut builder);
        if let Some(msg) = builder.poisoned {
            return Err(Error::Internal(msg));
        }
        if builder.stack.len() != 1 {
            return Err(Error::Internal("scope stack not balanced after traversal".into()));
        }
        tracing::debug!(
            bindings = builder.bindings.len(),
            references = builder.resolved.len(),
            "scope tree built"
        );
        Ok(Self {
            bindings: builder.bindings,
            resolved: builder.resolved,
            decls: builder.decls,
        })
    }

    /// Binding a reference identifier resolves to, if any.
    pub fn resolve(&self, ident: &Ident) -> Option<BindingId> {
        self.resolved.get(&ident.span.lo.0).copied()
    }

    /// Binding declared by the given declaring identifier (e.g. an import
    /// specifier's local name).
    pub fn binding_for_decl(&self, ident: &Ident) -> Option<BindingId> {
        self.decls.get(&ident.span.lo.0).copied()
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0 as usize]
    }

    /// True when at least one reference (value or type position, directly or
    /// through an alias chain) resolved to this binding.
    pub fn is_referenced(&self, id: BindingId) -> bool {
        self.bindings[id.0 as usize].referenced
    }

    pub fn bindings(&self) -> impl Iterator<Item = (BindingId, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, b)| (BindingId(i as u32), b))
    }
}

struct ScopeData {
    names: FxHashMap<String, BindingId>,
}

struct ScopeBuilder {
    scopes: Vec<ScopeData>,
    /// Active lexical chain; index 0 is the module scope.
    stack: Vec<usize>,
    bindings: Vec<Binding>,
    resolved: FxHashMap<u32, BindingId>,
    decls: FxHashMap<u32, BindingId>,
    poisoned: Option<String>,
}

impl ScopeBuilder {
    fn new() -> Self {
        Self {
            scopes: vec![ScopeData { names: FxHashMap::default() }],
            stack: vec![0],
            bindings: vec![],
            resolved: FxHashMap::default(),
            decls: FxHashMap::default(),
            poisoned: None,
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.push(ScopeData { names: FxHashMap::default() });
        self.stack.push(self.scopes.len() - 1);
    }

    fn leave_scope(&mut self) {
        if self.stack.len() <= 1 {
            self.poisoned.get_or_insert_with(|| "scope stack underflow".to_string());
            return;
        }
        self.stack.pop();
    }

    fn declare(&mut self, ident: &Ident, kind: BindingKind, import: Option<ImportSource>) -> BindingId {
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(Binding {
            name: ident.sym.to_string(),
            kind,
            import,
            alias_of: None,
            decl_span: ident.span,
            referenced: false,
        });
        let scope = *self.stack.last().unwrap_or(&0);
        // Re-declaration replaces the active binding from this point forward.
        self.scopes[scope].names.insert(ident.sym.to_string(), id);
        self.decls.insert(ident.span.lo.0, id);
        id
    }

    fn lookup(&self, name: &str) -> Option<BindingId> {
        for &scope in self.stack.iter().rev() {
            if let Some(&id) = self.scopes[scope].names.get(name) {
                return Some(id);
            }
        }
        None
    }

    fn record_ref(&mut self, ident: &Ident) {
        if let Some(id) = self.lookup(ident.sym.as_ref()) {
            self.resolved.insert(ident.span.lo.0, id);
            self.mark_referenced(id);
        }
    }

    fn mark_referenced(&mut self, mut id: BindingId) {
        let mut hops = 0;
        loop {
            let binding = &mut self.bindings[id.0 as usize];
            if binding.referenced {
                break;
            }
            binding.referenced = true;
            match binding.alias_of {
                Some(next) if hops < 32 => {
                    id = next;
                    hops += 1;
                }
                _ => break,
            }
        }
    }

    /// Declares every name bound by a pattern; initializer and type-annotation
    /// expressions inside the pattern are visited as references.
    fn declare_pat(&mut self, pat: &Pat, kind: BindingKind) {
        match pat {
            Pat::Ident(b) => {
                self.declare(&b.id, kind, None);
                if let Some(ta) = &b.type_ann {
                    ta.visit_with(self);
                }
            }
            Pat::Array(a) => {
                for el in a.elems.iter().flatten() {
                    self.declare_pat(el, kind);
                }
                if let Some(ta) = &a.type_ann {
                    ta.visit_with(self);
                }
            }
            Pat::Rest(r) => self.declare_pat(&r.arg, kind),
            Pat::Object(o) => {
                for prop in &o.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            if let PropName::Computed(c) = &kv.key {
                                c.expr.visit_with(self);
                            }
                            self.declare_pat(&kv.value, kind);
                        }
                        ObjectPatProp::Assign(a) => {
                            self.declare(&a.key.id, kind, None);
                            if let Some(default) = &a.value {
                                default.visit_with(self);
                            }
                        }
                        ObjectPatProp::Rest(r) => self.declare_pat(&r.arg, kind),
                    }
                }
                if let Some(ta) = &o.type_ann {
                    ta.visit_with(self);
                }
            }
            Pat::Assign(a) => {
                a.right.visit_with(self);
                self.declare_pat(&a.left, kind);
            }
            // For-in/of heads and invalid nodes; anything inside is a use,
            // not a declaration.
            Pat::Expr(_) | Pat::Invalid(_) => pat.visit_with(self),
        }
    }

    /// Function declarations bind from the top of their enclosing scope, so
    /// each statement list pre-registers them before its statements are
    /// resolved.
    fn hoist_fn_decls<'a>(&mut self, stmts: impl Iterator<Item = &'a Stmt>) {
        for stmt in stmts {
            if let Stmt::Decl(Decl::Fn(f)) = stmt {
                self.declare(&f.ident, BindingKind::Fn, None);
            }
        }
    }

    /// Root identifier of a member chain (`List.Item.x` -> `List`), if the
    /// chain is rooted at a plain identifier.
    fn member_root<'e>(mut expr: &'e Expr) -> Option<&'e Ident> {
        loop {
            match expr {
                Expr::Ident(i) => return Some(i),
                Expr::Member(m) => expr = &m.obj,
                _ => return None,
            }
        }
    }
}

impl Visit for ScopeBuilder {
    fn visit_ident(&mut self, n: &Ident) {
        self.record_ref(n);
    }

    fn visit_module(&mut self, n: &Module) {
        self.hoist_fn_decls(n.body.iter().filter_map(|item| match item {
            ModuleItem::Stmt(stmt) => Some(stmt),
            ModuleItem::ModuleDecl(_) => None,
        }));
        for item in &n.body {
            if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = item {
                if let Decl::Fn(f) = &export.decl {
                    self.declare(&f.ident, BindingKind::Fn, None);
                }
            }
        }
        n.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        // Specifier locals are declarations, never references; nothing else
        // inside an import declaration can refer to a binding.
        let source = n.src.value.to_string();
        for spec in &n.specifiers {
            match spec {
                ImportSpecifier::Named(named) => {
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(i)) => i.sym.to_string(),
                        Some(ModuleExportName::Str(s)) => s.value.to_string(),
                        None => named.local.sym.to_string(),
                    };
                    self.declare(
                        &named.local,
                        BindingKind::NamedImport,
                        Some(ImportSource { source: source.clone(), imported }),
                    );
                }
                ImportSpecifier::Default(def) => {
                    self.declare(
                        &def.local,
                        BindingKind::DefaultImport,
                        Some(ImportSource { source: source.clone(), imported: "default".into() }),
                    );
                }
                ImportSpecifier::Namespace(ns) => {
                    self.declare(
                        &ns.local,
                        BindingKind::NamespaceImport,
                        Some(ImportSource { source: source.clone(), imported: "*".into() }),
                    );
                }
            }
        }
    }

    fn visit_var_declarator(&mut self, d: &VarDeclarator) {
        // The initializer is resolved before the pattern is declared, so
        // `const x = x` refers outward.
        if let Some(init) = &d.init {
            init.visit_with(self);
        }
        let alias_of = match (&d.name, &d.init) {
            (Pat::Ident(_), Some(init)) => Self::member_root(init)
                .and_then(|root| self.resolved.get(&root.span.lo.0).copied()),
            _ => None,
        };
        self.declare_pat(&d.name, BindingKind::Var);
        if let (Pat::Ident(b), Some(root)) = (&d.name, alias_of) {
            if let Some(&id) = self.decls.get(&b.id.span.lo.0) {
                self.bindings[id.0 as usize].alias_of = Some(root);
            }
        }
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.enter_scope();
        self.hoist_fn_decls(n.stmts.iter());
        n.visit_children_with(self);
        self.leave_scope();
    }

    fn visit_function(&mut self, n: &Function) {
        self.enter_scope();
        n.type_params.visit_with(self);
        for param in &n.params {
            param.decorators.visit_with(self);
            self.declare_pat(&param.pat, BindingKind::Param);
        }
        n.decorators.visit_with(self);
        n.return_type.visit_with(self);
        // The body opens its own block scope below the parameter scope.
        n.body.visit_with(self);
        self.leave_scope();
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        // Usually pre-registered by the enclosing list's hoisting pass;
        // declare here only for positions that pass does not cover.
        if !self.decls.contains_key(&n.ident.span.lo.0) {
            self.declare(&n.ident, BindingKind::Fn, None);
        }
        n.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        // A function expression's own name is visible only inside it.
        self.enter_scope();
        if let Some(ident) = &n.ident {
            self.declare(ident, BindingKind::Fn, None);
        }
        n.function.visit_with(self);
        self.leave_scope();
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.enter_scope();
        n.type_params.visit_with(self);
        for pat in &n.params {
            self.declare_pat(pat, BindingKind::Param);
        }
        n.return_type.visit_with(self);
        n.body.visit_with(self);
        self.leave_scope();
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.declare(&n.ident, BindingKind::Class, None);
        n.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        self.enter_scope();
        if let Some(ident) = &n.ident {
            self.declare(ident, BindingKind::Class, None);
        }
        n.class.visit_with(self);
        self.leave_scope();
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        self.enter_scope();
        for param in &n.params {
            match param {
                ParamOrTsParamProp::Param(p) => {
                    p.decorators.visit_with(self);
                    self.declare_pat(&p.pat, BindingKind::Param);
                }
                ParamOrTsParamProp::TsParamProp(p) => match &p.param {
                    TsParamPropParam::Ident(b) => {
                        self.declare(&b.id, BindingKind::Param, None);
                    }
                    TsParamPropParam::Assign(a) => {
                        a.right.visit_with(self);
                        self.declare_pat(&a.left, BindingKind::Param);
                    }
                },
            }
        }
        n.body.visit_with(self);
        self.leave_scope();
    }

    fn visit_setter_prop(&mut self, n: &SetterProp) {
        self.enter_scope();
        self.declare_pat(&n.param, BindingKind::Param);
        n.body.visit_with(self);
        self.leave_scope();
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        self.enter_scope();
        if let Some(param) = &n.param {
            self.declare_pat(param, BindingKind::Param);
        }
        n.body.visit_with(self);
        self.leave_scope();
    }

    fn visit_ts_type_alias_decl(&mut self, n: &TsTypeAliasDecl) {
        // The alias name is a declaration; only the aliased type can refer
        // to bindings.
        n.type_ann.visit_with(self);
    }

    fn visit_ts_interface_decl(&mut self, n: &TsInterfaceDecl) {
        n.extends.visit_with(self);
        n.body.visit_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_for_tests;

    fn scopes(source: &str) -> (swc_core::ecma::ast::Module, ModuleScopes) {
        let (_cm, module) = parse_for_tests(source);
        let scopes = ModuleScopes::build(&module).unwrap();
        (module, scopes)
    }

    fn import_binding<'a>(scopes: &'a ModuleScopes, local: &str) -> (BindingId, &'a Binding) {
        scopes
            .bindings()
            .find(|(_, b)| b.name == local && b.import.is_some())
            .unwrap_or_else(|| panic!("no import binding named {local}"))
    }

    #[test]
    fn import_specifiers_declare_with_provenance() {
        let (_m, s) = scopes(
            r#"
import Def, { useEffect as alias, Button } from "react";
import * as ns from "react";
"#,
        );
        let (_, def) = import_binding(&s, "Def");
        assert_eq!(def.kind, BindingKind::DefaultImport);
        assert_eq!(def.import.as_ref().unwrap().imported, "default");

        let (_, alias) = import_binding(&s, "alias");
        assert_eq!(alias.kind, BindingKind::NamedImport);
        assert_eq!(alias.import.as_ref().unwrap().imported, "useEffect");

        let (_, ns) = import_binding(&s, "ns");
        assert_eq!(ns.kind, BindingKind::NamespaceImport);
        assert_eq!(ns.import.as_ref().unwrap().imported, "*");
    }

    #[test]
    fn unreferenced_import_is_unreferenced() {
        let (_m, s) = scopes(
            r#"
import { Input, AutoComplete } from "antd";
console.log(Input);
"#,
        );
        let (input, _) = import_binding(&s, "Input");
        let (auto, _) = import_binding(&s, "AutoComplete");
        assert!(s.is_referenced(input));
        assert!(!s.is_referenced(auto));
    }

    #[test]
    fn block_shadowing_does_not_count_as_reference() {
        let (_m, s) = scopes(
            r#"
import { InputProps } from "antd";
{
    let InputProps = 1;
    console.log(InputProps);
}
"#,
        );
        let (id, _) = import_binding(&s, "InputProps");
        assert!(!s.is_referenced(id));
    }

    #[test]
    fn use_in_nested_block_before_local_redeclaration_resolves_outward() {
        let (_m, s) = scopes(
            r#"
import { x } from "m";
{
    x;
    const x = 1;
    x;
}
"#,
        );
        // First inner use still sees the import; the one after the const
        // sees the local.
        let (import_id, _) = import_binding(&s, "x");
        assert!(s.is_referenced(import_id));
    }

    #[test]
    fn redeclaration_supersedes_within_scope_only() {
        let (m, s) = scopes(
            r#"
import { useEffect } from "react";
function App() {
    useEffect();
}
{
    const useEffect = () => {};
    useEffect();
}
"#,
        );
        // Both calls are identifier refs named useEffect; one resolves to
        // the import, the other to the block-local const.
        let mut kinds = vec![];
        collect_call_callee_kinds(&m, &s, &mut kinds);
        kinds.sort();
        assert_eq!(kinds, vec![BindingKindTag::Import, BindingKindTag::Var]);
    }

    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
    enum BindingKindTag {
        Import,
        Var,
    }

    fn collect_call_callee_kinds(m: &Module, s: &ModuleScopes, out: &mut Vec<BindingKindTag>) {
        use swc_core::ecma::visit::{Visit, VisitWith};
        struct Calls<'a> {
            s: &'a ModuleScopes,
            out: &'a mut Vec<BindingKindTag>,
        }
        impl Visit for Calls<'_> {
            fn visit_call_expr(&mut self, n: &CallExpr) {
                if let Some(expr) = n.callee.as_expr() {
                    if let Expr::Ident(i) = &**expr {
                        if i.sym.as_ref() == "useEffect" {
                            let b = self.s.binding(self.s.resolve(i).unwrap());
                            self.out.push(if b.import.is_some() {
                                BindingKindTag::Import
                            } else {
                                BindingKindTag::Var
                            });
                        }
                    }
                }
                n.visit_children_with(self);
            }
        }
        m.visit_with(&mut Calls { s, out });
    }

    #[test]
    fn alias_use_propagates_to_import_root() {
        let (_m, s) = scopes(
            r#"
import { List } from "antd";
const Item = List.Item;
export function App() {
    return <Item />;
}
"#,
        );
        let (list, _) = import_binding(&s, "List");
        assert!(s.is_referenced(list));
        let (_, item) = s.bindings().find(|(_, b)| b.name == "Item").unwrap();
        assert!(item.alias_of.is_some());
    }

    #[test]
    fn type_annotation_counts_as_reference() {
        let (_m, s) = scopes(
            r#"
import { InputProps } from "antd";
export function App(props: InputProps) {}
"#,
        );
        let (id, _) = import_binding(&s, "InputProps");
        assert!(s.is_referenced(id));
    }

    #[test]
    fn type_alias_name_is_not_a_reference() {
        let (_m, s) = scopes(
            r#"
import { InputProps } from "antd";
type InputProps = number;
"#,
        );
        // The alias declares its own name; only a use of the import counts.
        let (id, _) = import_binding(&s, "InputProps");
        assert!(!s.is_referenced(id));
    }

    #[test]
    fn jsx_member_root_counts_as_reference() {
        let (_m, s) = scopes(
            r#"
import { Radio } from "antd";
export const el = <Radio.RadioGroup.RadioItem />;
"#,
        );
        let (id, _) = import_binding(&s, "Radio");
        assert!(s.is_referenced(id));
    }

    #[test]
    fn class_extends_counts_as_reference() {
        let (_m, s) = scopes(
            r#"
import { Component } from "react";
class Page extends Component {}
"#,
        );
        let (id, _) = import_binding(&s, "Component");
        assert!(s.is_referenced(id));
    }

    #[test]
    fn function_declarations_hoist_above_earlier_calls() {
        let (_m, s) = scopes(
            r#"
import { useEffect } from "react";
{
    useEffect();
    function useEffect() {}
}
"#,
        );
        // The call precedes the declaration in source order but invokes the
        // hoisted local function, not the import.
        let (id, _) = import_binding(&s, "useEffect");
        assert!(!s.is_referenced(id));
    }

    #[test]
    fn exported_function_declarations_hoist_at_module_scope() {
        let (_m, s) = scopes(
            r#"
import { List } from "antd";
helper();
export function helper() {
    return List;
}
"#,
        );
        let (id, _) = import_binding(&s, "List");
        assert!(s.is_referenced(id));
        let (_, helper) = s.bindings().find(|(_, b)| b.name == "helper").unwrap();
        assert_eq!(helper.kind, BindingKind::Fn);
    }

    #[test]
    fn parameters_shadow_imports() {
        let (_m, s) = scopes(
            r#"
import { useEffect } from "react";
function f(useEffect) {
    useEffect();
}
"#,
        );
        let (id, _) = import_binding(&s, "useEffect");
        assert!(!s.is_referenced(id));
    }

    #[test]
    fn unresolved_identifiers_are_ambient() {
        let (m, s) = scopes("window.setTimeout(tick, 10);");
        // No bindings at all; nothing resolved, nothing panicked.
        assert_eq!(s.bindings().count(), 0);
        drop(m);
    }
}
