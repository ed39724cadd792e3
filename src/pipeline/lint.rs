// src/pipeline/lint.rs

//! JavaScript lint.
//!
//! Parsing is tree-sitter's job; on top of the tree we report two kinds of
//! problem: syntax errors, and references to identifiers that are neither
//! declared anywhere in the file nor known globals. Declarations are
//! collected file-wide rather than per scope, trading shadowing precision
//! for a table that stays trivial to reason about.

use std::collections::HashSet;
use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tracing::{error, info};
use tree_sitter::{Node, Parser};

use crate::pipeline::{relative_key, select_files, PipelineCtx};
use crate::registry::TaskBody;

/// Names that exist without a declaration in browser (or CommonJS) code.
const GLOBALS: &[&str] = &[
    "Array",
    "Boolean",
    "DOMParser",
    "Date",
    "Error",
    "FormData",
    "Infinity",
    "Intl",
    "JSON",
    "Map",
    "Math",
    "NaN",
    "Number",
    "Object",
    "Promise",
    "Proxy",
    "RangeError",
    "Reflect",
    "RegExp",
    "Set",
    "String",
    "Symbol",
    "SyntaxError",
    "TypeError",
    "URL",
    "URLSearchParams",
    "WeakMap",
    "WeakSet",
    "XMLHttpRequest",
    "alert",
    "arguments",
    "atob",
    "btoa",
    "cancelAnimationFrame",
    "clearInterval",
    "clearTimeout",
    "console",
    "decodeURIComponent",
    "document",
    "encodeURIComponent",
    "event",
    "exports",
    "fetch",
    "globalThis",
    "history",
    "isFinite",
    "isNaN",
    "localStorage",
    "location",
    "module",
    "navigator",
    "parseFloat",
    "parseInt",
    "requestAnimationFrame",
    "require",
    "sessionStorage",
    "setInterval",
    "setTimeout",
    "undefined",
    "window",
];

/// A problem found in one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFinding {
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
    pub message: String,
}

/// A problem with its file attached, as reported by the task.
#[derive(Debug, Clone)]
pub struct LintFinding {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Lint a single JavaScript source.
pub fn check_source(source: &str) -> Result<Vec<SourceFinding>> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_javascript::LANGUAGE.into();
    parser
        .set_language(&language)
        .context("loading javascript grammar")?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("javascript parser produced no tree"))?;
    let src = source.as_bytes();

    let mut declared = HashSet::new();
    let mut declaration_sites = HashSet::new();
    collect_declarations(tree.root_node(), src, &mut declared, &mut declaration_sites);

    let mut findings = Vec::new();
    collect_findings(
        tree.root_node(),
        src,
        &declared,
        &declaration_sites,
        &mut findings,
    );
    findings.sort_by_key(|f| (f.line, f.column));
    Ok(findings)
}

/// Lint every script under `<source>/js`.
pub fn run_sync(ctx: &PipelineCtx) -> Result<Vec<LintFinding>> {
    let js_dir = ctx.source.join("js");

    let mut findings = Vec::new();
    for input in select_files(&js_dir, "**/*.js")? {
        let rel = relative_key(&ctx.source, &input);
        let source = fs::read_to_string(&input)
            .with_context(|| format!("reading script {:?}", input))?;

        for finding in check_source(&source)? {
            findings.push(LintFinding {
                file: rel.clone(),
                line: finding.line,
                column: finding.column,
                message: finding.message,
            });
        }
    }

    Ok(findings)
}

fn collect_declarations(
    node: Node,
    src: &[u8],
    declared: &mut HashSet<String>,
    sites: &mut HashSet<usize>,
) {
    match node.kind() {
        "variable_declarator" => {
            if let Some(name) = node.child_by_field_name("name") {
                declare_pattern(name, src, declared, sites);
            }
        }
        "function_declaration"
        | "generator_function_declaration"
        | "function_expression"
        | "class_declaration"
        | "class" => {
            if let Some(name) = node.child_by_field_name("name") {
                declare_identifier(name, src, declared, sites);
            }
        }
        "arrow_function" => {
            // Parenthesised parameter lists come through as
            // formal_parameters; this covers the bare `x => ...` form.
            if let Some(param) = node.child_by_field_name("parameter") {
                declare_pattern(param, src, declared, sites);
            }
        }
        "formal_parameters" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                declare_pattern(child, src, declared, sites);
            }
        }
        "catch_clause" => {
            if let Some(param) = node.child_by_field_name("parameter") {
                declare_pattern(param, src, declared, sites);
            }
        }
        "import_specifier" => {
            // `import {a as b}` declares b; the exported name a is not a
            // local reference either way.
            let name = node.child_by_field_name("name");
            match node.child_by_field_name("alias") {
                Some(alias) => {
                    if let Some(name) = name {
                        sites.insert(name.id());
                    }
                    declare_identifier(alias, src, declared, sites);
                }
                None => {
                    if let Some(name) = name {
                        declare_identifier(name, src, declared, sites);
                    }
                }
            }
        }
        "import_clause" | "namespace_import" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "identifier" {
                    declare_identifier(child, src, declared, sites);
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_declarations(child, src, declared, sites);
    }
}

/// Collect the identifiers a binding pattern introduces: plain names,
/// destructuring values, defaults (left side only) and rest elements.
fn declare_pattern(
    node: Node,
    src: &[u8],
    declared: &mut HashSet<String>,
    sites: &mut HashSet<usize>,
) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            declare_identifier(node, src, declared, sites);
        }
        "assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                declare_pattern(left, src, declared, sites);
            }
        }
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                declare_pattern(value, src, declared, sites);
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                declare_pattern(child, src, declared, sites);
            }
        }
    }
}

fn declare_identifier(
    node: Node,
    src: &[u8],
    declared: &mut HashSet<String>,
    sites: &mut HashSet<usize>,
) {
    if let Ok(name) = node.utf8_text(src) {
        declared.insert(name.to_string());
        sites.insert(node.id());
    }
}

fn collect_findings(
    node: Node,
    src: &[u8],
    declared: &HashSet<String>,
    sites: &HashSet<usize>,
    findings: &mut Vec<SourceFinding>,
) {
    if node.is_missing() {
        findings.push(finding_at(node, format!("syntax error: missing {}", node.kind())));
    } else if node.is_error() {
        findings.push(finding_at(node, "syntax error".to_string()));
    }

    if matches!(node.kind(), "identifier" | "shorthand_property_identifier")
        && !sites.contains(&node.id())
    {
        if let Ok(name) = node.utf8_text(src) {
            if !declared.contains(name) && !GLOBALS.contains(&name) {
                findings.push(finding_at(node, format!("'{name}' is not defined")));
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_findings(child, src, declared, sites, findings);
    }
}

fn finding_at(node: Node, message: String) -> SourceFinding {
    let pos = node.start_position();
    SourceFinding {
        line: pos.row + 1,
        column: pos.column + 1,
        message,
    }
}

pub struct LintTask;

#[async_trait]
impl TaskBody for LintTask {
    async fn run(&self, ctx: &PipelineCtx) -> Result<()> {
        let ctx = ctx.clone();
        let findings = tokio::task::spawn_blocking(move || run_sync(&ctx))
            .await
            .context("lint worker panicked")??;

        for finding in &findings {
            error!(
                file = %finding.file,
                line = finding.line,
                column = finding.column,
                "{}",
                finding.message
            );
        }

        if !findings.is_empty() {
            bail!("lint found {} problem(s)", findings.len());
        }

        info!("lint clean");
        Ok(())
    }
}
