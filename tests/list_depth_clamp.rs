use folio::parse::ParseOutput;
use folio::{ast::*, parse};

fn get_ast_file(src: String, parse_out: ParseOutput) -> AstFile {
    AstFile {
        schema_version: SCHEMA_VERSION,
        parser: ParserInfo {
            name: PARSER_NAME.to_string(),
            version: PARSER_VERSION.to_string(),
        },
        span_encoding: SpanEncoding::default(),
        post_id: "test".to_string(),
        source: SourceInfo {
            path: None,
            byte_len: src.len() as u64,
            normalized_len: src.len() as u64,
            converted: false,
        },
        diagnostics: parse_out.diagnostics,
        document: parse_out.document,
    }
}

fn max_depth(blocks: &[BlockNode]) -> usize {
    blocks
        .iter()
        .map(|b| match &b.kind {
            BlockKind::BlockQuote { blocks } => 1 + max_depth(blocks),
            BlockKind::List { list } => {
                1 + list.items.iter().map(|i| max_depth(&i.blocks)).max().unwrap_or(0)
            }
            _ => 0,
        })
        .max()
        .unwrap_or(0)
}

/// Without a depth cap, deeply nested containers produce an AST that exceeds
/// `serde_json`'s recursion limit when round-tripped through pretty JSON.
#[test]
fn json_round_trip_survives_pathological_quote_depth() {
    let src = format!("{}item\n", "> ".repeat(200));
    let parse_out = parse::parse_document(&src);
    assert_eq!(max_depth(&parse_out.document.blocks), parse::MAX_NESTING);
    let ast = get_ast_file(src, parse_out);

    let json = serde_json::to_string_pretty(&ast).expect("serialize");
    let back: AstFile = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(ast, back);
}

#[test]
fn json_round_trip_survives_pathological_list_depth() {
    let src = format!("{}item\n", "- ".repeat(200));
    let parse_out = parse::parse_document(&src);
    assert_eq!(max_depth(&parse_out.document.blocks), parse::MAX_NESTING);
    assert!(
        parse_out
            .diagnostics
            .iter()
            .any(|d| d.code.as_deref() == Some("markdown.nesting.clamped"))
    );
    let ast = get_ast_file(src, parse_out);

    let json = serde_json::to_string_pretty(&ast).expect("serialize");
    let back: AstFile = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(ast, back);
}

#[test]
fn regression_deeply_nested_mixed_containers() {
    let src = include_str!("crashes/minimized000.txt").to_string();
    let parse_out = parse::parse_document(&src);
    assert!(max_depth(&parse_out.document.blocks) <= parse::MAX_NESTING);
    let ast = get_ast_file(src, parse_out);

    let json = serde_json::to_string_pretty(&ast).expect("serialize");
    let back: AstFile = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(ast, back);
}
