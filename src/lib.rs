//! Content pipeline for portfolio posts.
//!
//! ```text
//! stored body -> normalize() -> markup -> render() -> blocks -> render_html() -> HTML
//! ```
//!
//! The pipeline functions are total. The file-mode helpers at the bottom of
//! this module wrap them for the `folio` binary.

pub mod ast;
pub mod code;
pub mod config;
pub mod copy;
pub mod normalize;
pub mod parse;
pub mod post;
pub mod render;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub use normalize::normalize;
pub use render::{RenderOptions, render_html};

/// Parses normalized markup into block nodes.
///
/// Same input, same tree. Never fails: malformed input degrades to text.
pub fn render(normalized: &str) -> Vec<ast::BlockNode> {
    parse::parse_document(normalized).document.blocks
}

/// Stored body straight to HTML.
pub fn content_to_html(content: &str, opts: &RenderOptions) -> String {
    render_html(&render(&normalize(content)), opts)
}

/// File extensions picked up by bulk mode.
pub const POST_EXTENSIONS: &[&str] = &["md", "markdown", "html", "htm"];

/// Options controlling what file mode writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Also write `<slug>.json` with the AST envelope.
    pub write_json: bool,

    /// Recompute derived frontmatter fields and write the frontmatter back
    /// into the source file. The stored body is left byte-for-byte intact.
    pub regenerate_frontmatter: bool,
}

/// A post file read from disk and run through the pipeline.
#[derive(Debug, Clone)]
pub struct LoadedPost {
    pub path: PathBuf,
    pub meta: post::PostMeta,
    /// The stored body, after frontmatter.
    pub body: String,
    pub normalized: String,
    pub parsed: parse::ParseOutput,
}

impl LoadedPost {
    /// True when the normalizer had to convert rich-editor markup.
    pub fn converted(&self) -> bool {
        self.normalized != self.body
    }

    pub fn ast_file(&self) -> ast::AstFile {
        ast::AstFile {
            schema_version: ast::SCHEMA_VERSION,
            parser: ast::ParserInfo {
                name: ast::PARSER_NAME.to_string(),
                version: ast::PARSER_VERSION.to_string(),
            },
            span_encoding: ast::SpanEncoding::default(),
            post_id: self.meta.slug.clone(),
            source: ast::SourceInfo {
                path: Some(self.path.to_string_lossy().to_string()),
                byte_len: self.body.len() as u64,
                normalized_len: self.normalized.len() as u64,
                converted: self.converted(),
            },
            diagnostics: self.parsed.diagnostics.clone(),
            document: self.parsed.document.clone(),
        }
    }
}

/// Output of [`render_file`].
#[derive(Debug, Clone)]
pub struct RenderedPost {
    pub post: LoadedPost,
    /// The full page: post header plus rendered body.
    pub html: String,
    pub html_path: PathBuf,
    pub json_path: Option<PathBuf>,
}

/// Reads a post file, falling back to lossy UTF-8 conversion.
pub fn read_post_file(path: &Path) -> Result<String, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

/// Reads and parses one post file; frontmatter gaps are filled in memory.
pub fn load_post(path: &Path, regenerate_frontmatter: bool) -> Result<LoadedPost, Box<dyn Error>> {
    let text = read_post_file(path)?;
    let (existing, body) = post::parse_frontmatter(&text);
    let body = body.trim_start_matches(['\n', '\r']).to_string();

    let normalized = normalize(&body);
    let parsed = parse::parse_document(&normalized);
    for d in &parsed.diagnostics {
        debug!(path = %path.display(), code = ?d.code, "{}", d.message);
    }

    let meta = post::build_frontmatter(
        path,
        &parsed.document,
        &body,
        existing,
        regenerate_frontmatter,
    )?;

    Ok(LoadedPost {
        path: path.to_path_buf(),
        meta,
        body,
        normalized,
        parsed,
    })
}

/// Single file mode: render one post into `out_dir/<slug>.html`.
pub fn render_file(
    path: &Path,
    out_dir: &Path,
    render_opts: &RenderOptions,
    write_opts: &WriteOptions,
) -> Result<RenderedPost, Box<dyn Error>> {
    let post = load_post(path, write_opts.regenerate_frontmatter)?;
    if post.meta.slug.is_empty() {
        return Err(format!("cannot derive a slug for {}", path.display()).into());
    }

    fs::create_dir_all(out_dir)?;

    if write_opts.regenerate_frontmatter {
        write_frontmatter(&post)?;
    }

    let json_path = if write_opts.write_json {
        let json_path = out_dir.join(format!("{}.json", post.meta.slug));
        // prettify JSON so it's easy to inspect / diff.
        let json = serde_json::to_string_pretty(&post.ast_file())?;
        fs::write(&json_path, json)?;
        Some(json_path)
    } else {
        None
    };

    let body_html = render_html(&post.parsed.document.blocks, render_opts);
    let html = post::render_page(&post.meta, &body_html);
    let html_path = out_dir.join(format!("{}.html", post.meta.slug));
    fs::write(&html_path, &html)?;
    info!(path = %html_path.display(), "wrote post");

    Ok(RenderedPost {
        post,
        html,
        html_path,
        json_path,
    })
}

fn write_frontmatter(post: &LoadedPost) -> Result<(), Box<dyn Error>> {
    let mut out = post.meta.to_yaml_string()?;
    // blank line after frontmatter for readability.
    out.push('\n');
    out.push_str(&post.body);
    fs::write(&post.path, out)?;
    info!(path = %post.path.display(), "rewrote frontmatter");
    Ok(())
}

/// Bulk mode: render every post file under `content_root` into `out_root`.
///
/// Returns the number of posts written.
pub fn regenerate_all_in_dirs(
    content_root: &Path,
    out_root: &Path,
    render_opts: &RenderOptions,
    write_opts: &WriteOptions,
) -> Result<usize, Box<dyn Error>> {
    let start_time = Instant::now();

    if !content_root.exists() {
        return Err(format!("Content directory not found: {}", content_root.display()).into());
    }

    let mut entries: Vec<_> = WalkDir::new(content_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_post_file(e.path()))
        .collect();
    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let total = entries.len();
    let mut count = 0usize;
    let mut seen_slugs = std::collections::HashSet::new();

    for entry in entries {
        let rendered = render_file(entry.path(), out_root, render_opts, write_opts)?;
        if !seen_slugs.insert(rendered.post.meta.slug.clone()) {
            warn!(
                slug = %rendered.post.meta.slug,
                path = %entry.path().display(),
                "duplicate slug; earlier post was overwritten"
            );
        }
        count += 1;

        let total_ms = start_time.elapsed().as_millis();
        info!(
            "[{:>4}/{:>4}] [{:02}:{:02}.{:03}] Rendered: {}",
            count,
            total,
            total_ms / 60_000,
            (total_ms % 60_000) / 1_000,
            total_ms % 1_000,
            rendered.html_path.display()
        );
    }

    let total_secs = start_time.elapsed().as_secs_f64();
    let avg = if count > 0 {
        format!("{:.3}s", total_secs / count as f64)
    } else {
        "-".to_string()
    };
    info!("Done. Rendered {count} posts in {total_secs:.3}s (avg {avg}/post).");
    Ok(count)
}

fn is_post_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| POST_EXTENSIONS.iter().any(|p| p.eq_ignore_ascii_case(ext)))
}
