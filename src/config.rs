//! Caller-supplied configuration.
//!
//! The wire shape mirrors the options object the host passes in, camelCase
//! keys included, so a JSON blob like
//! `{"babelImport":[{"fromSource":"antd",...}],"removeUseEffect":true}`
//! deserializes directly. Every option is an explicit `Option` so "unset"
//! stays distinguishable from a deliberate `false`/empty value.

use serde::Deserialize;

use crate::error::Error;

/// Substitution marker expected in every `replaceExpr` template.
pub const TEMPLATE_MARKER: &str = "{}";

/// Per-invocation configuration. Read-only for the duration of one call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformConfig {
    /// Import-splitting rules, keyed by their `fromSource` module string.
    pub babel_import: Option<Vec<ImportRewriteRule>>,
    /// When true, delete statement-level `useEffect(...)` calls that resolve
    /// to the `react` module (see [`RemoveCallTarget::use_effect`]).
    pub remove_use_effect: Option<bool>,
}

/// One import-splitting rule for a single source module.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRewriteRule {
    /// Exact module specifier this rule applies to, e.g. `"antd"`.
    pub from_source: String,
    #[serde(default)]
    pub replace_css: Option<CssReplaceSpec>,
    #[serde(default)]
    pub replace_js: Option<JsReplaceSpec>,
}

/// CSS half of a rule: emits a bare side-effect import per retained symbol.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CssReplaceSpec {
    /// Path template containing a single `{}` marker.
    pub replace_expr: String,
    #[serde(default)]
    pub lower: Option<bool>,
    #[serde(default)]
    pub camel2_dash_component_name: Option<bool>,
    /// Imported names whose CSS import is skipped.
    #[serde(default)]
    pub ignore_style_component: Option<Vec<String>>,
}

/// JS half of a rule: emits the import that carries the symbol's binding.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsReplaceSpec {
    /// Path template containing a single `{}` marker.
    pub replace_expr: String,
    #[serde(default)]
    pub lower: Option<bool>,
    #[serde(default)]
    pub camel2_dash_component_name: Option<bool>,
    /// Imported names whose JS import is skipped; their specifier is kept in
    /// the residual original import instead.
    #[serde(default)]
    pub ignore_es_component: Option<Vec<String>>,
    /// Default-import form when unset or true; named form when false.
    #[serde(default)]
    pub transform_to_default_import: Option<bool>,
}

/// Removal target: a function name paired with the module it comes from.
/// `removeUseEffect: true` fixes this to (`react`, `useEffect`) by
/// convention; the transform itself is generic over the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveCallTarget {
    pub source: String,
    pub name: String,
}

impl RemoveCallTarget {
    pub fn use_effect() -> Self {
        Self {
            source: "react".to_string(),
            name: "useEffect".to_string(),
        }
    }
}

impl TransformConfig {
    /// Validates the whole config once, before any AST work.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(rules) = &self.babel_import {
            for rule in rules {
                rule.validate()?;
            }
        }
        Ok(())
    }
}

impl ImportRewriteRule {
    fn validate(&self) -> Result<(), Error> {
        if self.replace_css.is_none() && self.replace_js.is_none() {
            return Err(Error::MalformedConfig(format!(
                "rule for \"{}\" configures neither replaceJs nor replaceCss",
                self.from_source
            )));
        }
        if let Some(css) = &self.replace_css {
            check_template(&self.from_source, "replaceCss", &css.replace_expr)?;
        }
        if let Some(js) = &self.replace_js {
            check_template(&self.from_source, "replaceJs", &js.replace_expr)?;
        }
        Ok(())
    }
}

fn check_template(source: &str, half: &str, template: &str) -> Result<(), Error> {
    if !template.contains(TEMPLATE_MARKER) {
        return Err(Error::MalformedConfig(format!(
            "{half} template \"{template}\" for \"{source}\" has no {TEMPLATE_MARKER} marker"
        )));
    }
    Ok(())
}
