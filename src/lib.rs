//! modtrim: scope-aware import splitting and dead-call removal for TS/TSX
//! modules.
//!
//! One call to [`transform`] parses a module, builds a lexical scope tree,
//! runs the configured rewrites over it, and re-prints the result with a
//! source map:
//!
//! - **import splitting** replaces whole-module imports from a configured
//!   source (`import { Button, Input } from "antd"`) with one generated
//!   JS/CSS import pair per symbol that is actually referenced, using
//!   templated paths (`antd/es/button/index.js`, `antd/es/button/style/…`);
//! - **dead-call removal** deletes statement-level calls to a target
//!   function (`useEffect` from `react` by convention) however it was
//!   imported or renamed, while leaving same-named locals alone.
//!
//! Every call owns its AST, scope tables, and buffers; nothing is shared or
//! cached across invocations, so callers may run one transform per file from
//! as many threads as they like.
//!
//! ```no_run
//! use modtrim::{transform, TransformConfig};
//!
//! let config: TransformConfig = serde_json::from_str(
//!     r#"{"babelImport":[{"fromSource":"antd","replaceJs":{"replaceExpr":"antd/es/{}/index.js","camel2DashComponentName":true}}]}"#,
//! ).unwrap();
//! let out = transform("import { Button } from \"antd\"; export const b = <Button/>;", &config, None).unwrap();
//! println!("{}", out.code);
//! ```

mod config;
mod error;
mod import_rewrite;
mod remove_call;
mod scope;
mod srcmap;

pub use config::{
    CssReplaceSpec, ImportRewriteRule, JsReplaceSpec, RemoveCallTarget, TransformConfig,
};
pub use error::Error;
pub use import_rewrite::rewrite_imports;
pub use remove_call::remove_calls;
pub use scope::{Binding, BindingId, BindingKind, ImportSource, ModuleScopes};
pub use srcmap::{OriginalPosition, PositionMap};

use swc_core::{
    common::{source_map::SourceMapGenConfig, sync::Lrc, FileName, SourceFile, SourceMap},
    ecma::{
        ast::{EsVersion, Module},
        codegen::{text_writer::JsWriter, Config as CodegenConfig, Emitter, Node},
        parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax},
    },
};

/// Result of one transform call.
#[derive(Debug)]
pub struct TransformOutput {
    /// Rewritten source text.
    pub code: String,
    /// Standard source-map v3 JSON for the rewritten text.
    pub map: Option<String>,
    /// Correlator for direct generated-to-original position queries.
    pub positions: PositionMap,
}

/// Parses `source` as TSX (decorators enabled), applies the transforms
/// enabled in `config`, and re-prints with source-map emission.
///
/// The configuration is validated up front; a bad rule fails the call before
/// any AST work ([`Error::MalformedConfig`]). Imports whose source matches
/// no rule and call shapes the removal cannot classify pass through
/// unchanged.
pub fn transform(
    source: &str,
    config: &TransformConfig,
    filename: Option<&str>,
) -> Result<TransformOutput, Error> {
    config.validate()?;

    let cm: Lrc<SourceMap> = Default::default();
    let name = filename.unwrap_or("module.tsx");
    let fm = cm.new_source_file(
        FileName::Custom(name.to_string()).into(),
        source.to_string(),
    );
    let mut module = parse_module(&fm)?;
    tracing::debug!(file = name, bytes = source.len(), "module parsed");

    let scopes = ModuleScopes::build(&module)?;

    if let Some(rules) = config.babel_import.as_deref() {
        if !rules.is_empty() {
            rewrite_imports(&mut module, &scopes, rules);
        }
    }
    if config.remove_use_effect.unwrap_or(false) {
        remove_calls(&mut module, &scopes, &RemoveCallTarget::use_effect());
    }

    print_module(&cm, &module)
}

fn parse_module(fm: &SourceFile) -> Result<Module, Error> {
    let lexer = Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
        EsVersion::Es2022,
        StringInput::from(fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let module = parser
        .parse_module()
        .map_err(|err| Error::Parse(err.into_kind().msg().to_string()))?;
    let errors = parser.take_errors();
    if !errors.is_empty() {
        let msg = errors
            .iter()
            .map(|err| err.kind().msg().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::Parse(msg));
    }
    Ok(module)
}

fn print_module(cm: &Lrc<SourceMap>, module: &Module) -> Result<TransformOutput, Error> {
    let mut buf = vec![];
    let mut src_map_buf = vec![];
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, Some(&mut src_map_buf));
        let mut emitter = Emitter {
            cfg: CodegenConfig::default().with_target(EsVersion::Es2020),
            cm: cm.clone(),
            comments: None,
            wr: writer,
        };
        module
            .emit_with(&mut emitter)
            .map_err(|err| Error::Emit(err.to_string()))?;
    }
    let code = String::from_utf8(buf).map_err(|err| Error::Emit(err.to_string()))?;

    let positions = PositionMap::build(
        src_map_buf.iter().map(|(pos, lc)| (*pos, lc.line, lc.col)),
        cm,
    );
    let standard = cm.build_source_map(&src_map_buf, None, MapGenConfig);
    let mut map_buf = vec![];
    standard
        .to_writer(&mut map_buf)
        .map_err(|err| Error::Emit(err.to_string()))?;
    let map = String::from_utf8(map_buf).map_err(|err| Error::Emit(err.to_string()))?;
    tracing::debug!(mappings = positions.len(), "module printed");

    Ok(TransformOutput {
        code,
        map: Some(map),
        positions,
    })
}

struct MapGenConfig;

impl SourceMapGenConfig for MapGenConfig {
    fn file_name_to_source(&self, f: &FileName) -> String {
        f.to_string()
    }
}

#[cfg(test)]
pub(crate) fn parse_for_tests(source: &str) -> (Lrc<SourceMap>, Module) {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("test.tsx".to_string()).into(),
        source.to_string(),
    );
    let module = parse_module(&fm).expect("test source must parse");
    (cm, module)
}
