//! Extracts translation function calls from source code using Tree-sitter.

use std::str::FromStr;
use std::sync::OnceLock;

use tree_sitter::{
    Node,
    Parser,
    Query,
    QueryCursor,
    StreamingIteratorMut,
};

use super::{
    SourceLanguage,
    UsageError,
};

/// Query capturing `@function` and its string `@key` argument.
const USAGE_QUERY: &str = include_str!("../../queries/usage.scm");

/// Parsed queries for JavaScript and JSX.
static JS_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();
/// Parsed queries for TypeScript.
static TS_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();
/// Parsed queries for TSX.
static TSX_QUERY_CACHE: OnceLock<Vec<Query>> = OnceLock::new();

/// A call like `t("common.hello")`: the callee name and its first string argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringCall {
    /// Callee name.
    pub function: String,
    /// String content without quotes.
    pub argument: String,
    /// 1-based line of the argument.
    pub line: usize,
}

/// Capture names used in the usage query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureName {
    /// `@function`
    Function,
    /// `@key`
    Key,
}

impl FromStr for CaptureName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(Self::Function),
            "key" => Ok(Self::Key),
            _ => Err(()),
        }
    }
}

/// Parses the usage query for `language`; an invalid query yields none.
fn parse_queries(language: SourceLanguage) -> Vec<Query> {
    Query::new(&language.tree_sitter_language(), USAGE_QUERY)
        .map_err(|e| tracing::error!("Failed to parse usage query for {language:?}: {e:?}"))
        .ok()
        .into_iter()
        .collect()
}

/// Queries are parsed once per language.
fn load_queries(language: SourceLanguage) -> &'static [Query] {
    match language {
        SourceLanguage::JavaScript | SourceLanguage::Jsx => {
            JS_QUERY_CACHE.get_or_init(|| parse_queries(SourceLanguage::JavaScript))
        }
        SourceLanguage::TypeScript => {
            TS_QUERY_CACHE.get_or_init(|| parse_queries(SourceLanguage::TypeScript))
        }
        SourceLanguage::Tsx => TSX_QUERY_CACHE.get_or_init(|| parse_queries(SourceLanguage::Tsx)),
    }
}

/// Text of `node`, if it is valid UTF-8.
fn extract_node_text(node: Node<'_>, source_bytes: &[u8]) -> Option<String> {
    node.utf8_text(source_bytes).ok().map(ToString::to_string)
}

/// Every call with a string literal as first argument, in source order.
///
/// Callee names are not filtered here.
///
/// # Errors
/// Returns `UsageError` if the grammar cannot be loaded or the source cannot be parsed.
pub fn extract_string_calls(
    source: &str,
    language: SourceLanguage,
) -> Result<Vec<StringCall>, UsageError> {
    let mut parser = Parser::new();
    parser.set_language(&language.tree_sitter_language()).map_err(UsageError::LanguageSetup)?;
    let tree = parser.parse(source, None).ok_or(UsageError::ParseFailed)?;

    let source_bytes = source.as_bytes();
    let root_node = tree.root_node();
    let mut calls = Vec::new();

    for query in load_queries(language) {
        let cap_names = query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, root_node, source_bytes);

        while let Some(match_) = matches.next_mut() {
            let mut function = None;
            let mut argument = None;
            for capture in match_.captures {
                let Some(cap_name) = cap_names.get(capture.index as usize) else {
                    continue;
                };
                match cap_name.parse::<CaptureName>() {
                    Ok(CaptureName::Function) => {
                        function = extract_node_text(capture.node, source_bytes);
                    }
                    Ok(CaptureName::Key) => {
                        argument = extract_node_text(capture.node, source_bytes)
                            .map(|text| (text, capture.node.start_position().row + 1));
                    }
                    Err(()) => {}
                }
            }
            if let (Some(function), Some((argument, line))) = (function, argument) {
                calls.push(StringCall { function, argument, line });
            }
        }
    }

    calls.sort_by_key(|call| call.line);
    Ok(calls)
}
