use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use folio::code::code_blocks;
use folio::config::Config;
use folio::copy::{CommandClipboard, CopyAction, SystemClock};
use folio::{RenderOptions, WriteOptions, load_post, regenerate_all_in_dirs, render_file};

/// Env var holding a `tracing` filter directive, e.g. `folio=debug`.
const LOG_ENV: &str = "FOLIO_LOG";

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Normalize and render portfolio posts")]
struct Cli {
    /// Config file; defaults to ./folio.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render one post to `<out>/<slug>.html` and print the page.
    Render {
        file: PathBuf,

        #[arg(long, default_value = "public/posts")]
        out: PathBuf,

        #[command(flatten)]
        write: OutputArgs,

        /// Recompute derived frontmatter and write it back into FILE.
        #[arg(long)]
        regenerate_frontmatter: bool,
    },

    /// Render every post under a content directory.
    RegenerateAll {
        #[arg(long, default_value = "content")]
        content: PathBuf,

        #[arg(long, default_value = "public/posts")]
        out: PathBuf,

        #[command(flatten)]
        write: OutputArgs,
    },

    /// Print the normalized body of a post.
    Normalize { file: PathBuf },

    /// List the code blocks of a post.
    Blocks { file: PathBuf },

    /// Copy one code block to the system clipboard.
    Copy {
        file: PathBuf,

        /// Zero-based block index, as listed by `blocks`.
        #[arg(long)]
        block: usize,
    },
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Also write `<slug>.json` with the parsed tree.
    #[arg(long)]
    json: bool,

    /// Leave out the Copy button on code blocks.
    #[arg(long)]
    no_copy_button: bool,

    /// Open links in the same tab.
    #[arg(long)]
    same_tab: bool,
}

impl OutputArgs {
    /// Applies flag overrides on top of the configured options.
    fn render_options(&self, configured: &RenderOptions) -> RenderOptions {
        let mut opts = configured.clone();
        if self.no_copy_button {
            opts.copy_button = false;
        }
        if self.same_tab {
            opts.links_in_new_tab = false;
        }
        opts
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.quiet {
        "folio=error"
    } else {
        match cli.verbose {
            0 => "folio=info",
            1 => "folio=debug",
            _ => "folio=trace",
        }
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::discover(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            file,
            out,
            write,
            regenerate_frontmatter,
        } => {
            let opts = WriteOptions {
                write_json: write.json,
                regenerate_frontmatter,
            };
            let render_opts = write.render_options(&config.render);
            let rendered = render_file(&file, &out, &render_opts, &opts)?;
            println!("{}", rendered.html);
        }
        Command::RegenerateAll {
            content,
            out,
            write,
        } => {
            let opts = WriteOptions {
                write_json: write.json,
                regenerate_frontmatter: false,
            };
            let render_opts = write.render_options(&config.render);
            regenerate_all_in_dirs(&content, &out, &render_opts, &opts)?;
        }
        Command::Normalize { file } => {
            let post = load_post(&file, false)?;
            println!("{}", post.normalized);
        }
        Command::Blocks { file } => {
            let post = load_post(&file, false)?;
            for (i, block) in code_blocks(&post.parsed.document.blocks).iter().enumerate() {
                let label = block.language_label().unwrap_or_else(|| "-".to_string());
                match &block.title {
                    Some(title) => println!("{i}\t{label}\t{title}\t{} lines", block.line_count()),
                    None => println!("{i}\t{label}\t\t{} lines", block.line_count()),
                }
            }
        }
        Command::Copy { file, block } => {
            let post = load_post(&file, false)?;
            let blocks = code_blocks(&post.parsed.document.blocks);
            let Some(code) = blocks.get(block) else {
                return Err(format!(
                    "{} has {} code blocks; index {block} is out of range",
                    file.display(),
                    blocks.len()
                )
                .into());
            };

            let mut clipboard = CommandClipboard::from_config(&config.clipboard);
            let mut action =
                CopyAction::for_block(code).with_revert_after(config.clipboard.revert_after());
            // a failed copy is logged by the action and leaves it idle.
            if action.copy(&mut clipboard, &SystemClock).is_some() {
                info!(block, bytes = action.payload().len(), "copied code block");
            }
            println!("{}", action.label());
        }
    }
    Ok(())
}
