//! Import splitting.
//!
//! Rewrites whole-module imports from a configured source into one generated
//! import per referenced symbol: a JS import carrying the original local
//! binding and a bare CSS side-effect import, each from a templated path.
//! Unreferenced named specifiers are dropped outright; specifiers the rule
//! does not cover (default/namespace imports, JS-ignored names) stay behind
//! in a residual copy of the original declaration so their bindings survive.
//!
//! Generated declarations take the place of the one they replace and inherit
//! the span of their originating specifier, so source-map queries against
//! them land near the original import. Paths produced by a previous run
//! never match a rule's `fromSource` again, which makes the rewrite
//! idempotent.

use swc_core::{
    common::{Span, SyntaxContext},
    ecma::ast::*,
};

use crate::config::{ImportRewriteRule, TEMPLATE_MARKER};
use crate::scope::ModuleScopes;

pub fn rewrite_imports(module: &mut Module, scopes: &ModuleScopes, rules: &[ImportRewriteRule]) {
    let items = std::mem::take(&mut module.body);
    let mut body = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => {
                match rules.iter().find(|r| r.from_source == *decl.src.value) {
                    Some(rule) => split_import(decl, rule, scopes, &mut body),
                    None => body.push(ModuleItem::ModuleDecl(ModuleDecl::Import(decl))),
                }
            }
            other => body.push(other),
        }
    }
    module.body = body;
}

fn split_import(
    decl: ImportDecl,
    rule: &ImportRewriteRule,
    scopes: &ModuleScopes,
    out: &mut Vec<ModuleItem>,
) {
    let ImportDecl {
        span,
        specifiers,
        src,
        type_only,
        with,
        phase,
    } = decl;
    let mut residual: Vec<ImportSpecifier> = vec![];
    let mut generated: Vec<ModuleItem> = vec![];

    for spec in specifiers {
        let named = match spec {
            ImportSpecifier::Named(named) => named,
            // Default and namespace imports of the source module are not
            // split; they keep their original declaration.
            other => {
                residual.push(other);
                continue;
            }
        };

        let imported_name = match &named.imported {
            Some(ModuleExportName::Ident(i)) => i.sym.to_string(),
            Some(ModuleExportName::Str(s)) => s.value.to_string(),
            None => named.local.sym.to_string(),
        };
        let referenced = scopes
            .binding_for_decl(&named.local)
            .map(|id| scopes.is_referenced(id))
            .unwrap_or(false);
        if !referenced {
            tracing::debug!(
                symbol = %imported_name,
                source = %rule.from_source,
                "dropping unreferenced import specifier"
            );
            continue;
        }

        let mut emitted_js = false;
        if let Some(js) = &rule.replace_js {
            if !is_ignored(&js.ignore_es_component, &imported_name) {
                let token =
                    component_token(&imported_name, js.camel2_dash_component_name, js.lower);
                let path = js.replace_expr.replacen(TEMPLATE_MARKER, &token, 1);
                tracing::debug!(symbol = %imported_name, path = %path, "generated js import");
                generated.push(js_import(
                    &named,
                    &imported_name,
                    path,
                    js.transform_to_default_import.unwrap_or(true),
                ));
                emitted_js = true;
            }
        }
        if let Some(css) = &rule.replace_css {
            if !is_ignored(&css.ignore_style_component, &imported_name) {
                let token =
                    component_token(&imported_name, css.camel2_dash_component_name, css.lower);
                let path = css.replace_expr.replacen(TEMPLATE_MARKER, &token, 1);
                tracing::debug!(symbol = %imported_name, path = %path, "generated css import");
                generated.push(css_import(named.span, path));
            }
        }
        if !emitted_js {
            // Referenced but no JS import generated; the binding must keep
            // coming from the original module.
            residual.push(ImportSpecifier::Named(named));
        }
    }

    if !residual.is_empty() {
        out.push(ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
            span,
            specifiers: residual,
            src,
            type_only,
            with,
            phase,
        })));
    }
    out.extend(generated);
}

/// `import Local from "path"` or `import { Imported as Local } from "path"`,
/// reusing the original local ident so every existing reference stays valid.
fn js_import(
    named: &ImportNamedSpecifier,
    imported_name: &str,
    path: String,
    default_form: bool,
) -> ModuleItem {
    let span = named.span;
    let specifier = if default_form {
        ImportSpecifier::Default(ImportDefaultSpecifier {
            span,
            local: named.local.clone(),
        })
    } else {
        let imported = if named.local.sym.as_ref() != imported_name {
            Some(ModuleExportName::Ident(Ident::new(
                imported_name.into(),
                span,
                SyntaxContext::empty(),
            )))
        } else {
            None
        };
        ImportSpecifier::Named(ImportNamedSpecifier {
            span,
            local: named.local.clone(),
            imported,
            is_type_only: false,
        })
    };
    import_item(span, vec![specifier], path)
}

/// Bare side-effect import, e.g. `import "antd/es/button/style/index.css"`.
fn css_import(span: Span, path: String) -> ModuleItem {
    import_item(span, vec![], path)
}

fn import_item(span: Span, specifiers: Vec<ImportSpecifier>, path: String) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span,
        specifiers,
        src: Box::new(Str {
            span,
            value: path.into(),
            raw: None,
        }),
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }))
}

fn is_ignored(list: &Option<Vec<String>>, name: &str) -> bool {
    list.as_ref().is_some_and(|l| l.iter().any(|n| n == name))
}

/// Template token for an imported name. Dash-case conversion wins over the
/// plain `lower` flag; `lower` alone lowercases without separators.
fn component_token(name: &str, camel2dash: Option<bool>, lower: Option<bool>) -> String {
    if camel2dash.unwrap_or(false) {
        camel_to_dash(name)
    } else if lower.unwrap_or(false) {
        name.to_lowercase()
    } else {
        name.to_string()
    }
}

fn camel_to_dash(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower =
                i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = i > 0 && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || next_lower {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_to_dash_table() {
        assert_eq!(camel_to_dash("AutoComplete"), "auto-complete");
        assert_eq!(camel_to_dash("Input"), "input");
        assert_eq!(camel_to_dash("DatePicker2"), "date-picker2");
        assert_eq!(camel_to_dash("HTMLView"), "html-view");
        assert_eq!(camel_to_dash("throttle"), "throttle");
    }

    #[test]
    fn token_flag_precedence() {
        assert_eq!(component_token("AutoComplete", Some(true), Some(true)), "auto-complete");
        assert_eq!(component_token("AutoComplete", None, Some(true)), "autocomplete");
        assert_eq!(component_token("AutoComplete", None, None), "AutoComplete");
        assert_eq!(component_token("AutoComplete", Some(false), Some(false)), "AutoComplete");
    }

    #[test]
    fn ignore_lists_match_exact_names() {
        let list = Some(vec!["Image".to_string(), "ConfigProvider".to_string()]);
        assert!(is_ignored(&list, "Image"));
        assert!(!is_ignored(&list, "Img"));
        assert!(!is_ignored(&None, "Image"));
    }
}
