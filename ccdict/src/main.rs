use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use ccdict::{CcdictConfig, SearchCommand, Shell};
use ccdict_core::{CantoDict, DictField, OutputFormat, SearchExpr};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ccdict")]
#[command(about = "Cantonese dictionary built from CC-Canto, CC-CEDICT and CC-CEDICT-Canto")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dictionary database (overrides the configured path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the dictionary from the source files
    Reconcile {
        /// Directory holding the dictionary sources
        #[arg(long)]
        dict_dir: Option<PathBuf>,
        /// Cangjie definition file
        #[arg(long)]
        cangjie: Option<PathBuf>,
        /// Rebuild even when the database already holds a dictionary
        #[arg(long)]
        force: bool,
        /// Parse at most this many lines of each source
        #[arg(long)]
        max_lines: Option<usize>,
    },
    /// Run one search command
    Search {
        /// Search command, e.g. `吼` or `(jyutping "jyun." 1) (english surname)`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
        /// Field to match the search text against
        #[arg(long)]
        field: Option<DictField>,
        /// Match with regular expressions
        #[arg(long = "re", overrides_with = "no_re")]
        re: bool,
        /// Match exactly
        #[arg(long = "no-re")]
        no_re: bool,
        /// Only search the configured (or traditional) field
        #[arg(long)]
        not_all: bool,
        /// Search every candidate field instead of stopping at the first hit
        #[arg(long)]
        not_lazy: bool,
        /// Keep pinyin readings apart
        #[arg(long)]
        not_flatten: bool,
        /// Field to display; repeat for several
        #[arg(short = 'd', long = "display-field")]
        display_fields: Vec<DictField>,
        /// One line per result
        #[arg(short, long)]
        compact: bool,
        /// Output format
        #[arg(short = 'f', long = "output-format")]
        output_format: Option<OutputFormat>,
        /// Prefix of every output line
        #[arg(long)]
        indent: Option<String>,
    },
    /// Interactive search shell
    Shell,
    /// Table sizes and the last reconciliation
    Stats,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> anyhow::Result<CcdictConfig> {
    let mut config = match &cli.config {
        Some(path) => CcdictConfig::load_toml(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CcdictConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    Ok(config)
}

fn open_dict(config: &CcdictConfig) -> anyhow::Result<CantoDict> {
    CantoDict::open(&config.db_path)
        .with_context(|| format!("opening dictionary database {}", config.db_path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Reconcile {
            dict_dir,
            cangjie,
            force,
            max_lines,
        } => {
            if let Some(dir) = dict_dir {
                config.dict_dir = dir;
            }
            if max_lines.is_some() {
                config.max_source_lines = max_lines;
            }
            let cangjie = cangjie.unwrap_or_else(|| config.cangjie_path());

            let mut dict = open_dict(&config)?;
            match dict.reconcile(&config.sources(), force).context("reconciling dictionary sources")? {
                Some(stats) => {
                    println!("seeded (CC-Canto):             {}", stats.seeded);
                    println!("joined (CC-CEDICT + readings): {}", stats.joined);
                    println!("CC-CEDICT orphans:             {}", stats.cedict_orphans);
                    println!("CC-CEDICT-Canto orphans:       {}", stats.cedict_canto_orphans);
                    println!("total rows:                    {}", stats.total());
                }
                None => println!("dictionary already built; use --force to rebuild"),
            }
            let loaded = dict
                .load_input_codes(&cangjie, force)
                .with_context(|| format!("loading input codes from {}", cangjie.display()))?;
            if loaded {
                println!("input codes loaded: {} characters", dict.codes().character_count());
            }
        }
        Commands::Search {
            command,
            field,
            re,
            no_re,
            not_all,
            not_lazy,
            not_flatten,
            display_fields,
            compact,
            output_format,
            indent,
        } => {
            let parsed = SearchCommand::parse(&command.join(" ")).context("parsing search command")?;
            let Some(expr) = &parsed.expr else {
                anyhow::bail!("nothing to search for");
            };

            let base = config.base_mut();
            if field.is_some() {
                base.search.search_field = field;
            }
            if re {
                base.search.use_regex = Some(true);
            } else if no_re {
                base.search.use_regex = Some(false);
            }
            if not_all {
                base.search.try_all_fields = false;
            }
            if not_lazy {
                base.search.lazy = false;
            }
            if not_flatten {
                base.search.flatten_pinyin = false;
            }
            if !display_fields.is_empty() {
                base.format.fields = display_fields;
            }
            if compact {
                base.format.compact = true;
            }
            if let Some(format) = output_format {
                base.format.output_format = format;
            }
            if let Some(indent) = indent {
                base.format.indent = indent;
            }

            let dict = open_dict(&config)?;
            let (search, format) = parsed.options(config.base());
            print_results(&dict, expr, &search, &format)?;
        }
        Commands::Shell => {
            let dict = open_dict(&config)?;
            if !dict.store().has_entries()? {
                eprintln!("⚠ dictionary is empty; run `ccdict reconcile` first");
            }
            println!("Cantonese dictionary search shell (? for help, q to quit)");
            let mut shell = Shell::new(dict, config.into_base());
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
        }
        Commands::Stats => {
            let dict = open_dict(&config)?;
            for table in dict.store().table_stats()? {
                println!("{:<20} {}", table.name, table.rows);
            }
            match dict.store().reconcile_stats()? {
                Some(meta) => {
                    println!(
                        "last rebuild: seeded={} joined={} cedict_orphans={} cedict_canto_orphans={}",
                        meta.stats.seeded, meta.stats.joined, meta.stats.cedict_orphans, meta.stats.cedict_canto_orphans
                    );
                    if let Some(cap) = meta.max_source_lines {
                        println!("source line cap: {}", cap);
                    }
                }
                None => println!("no reconciliation recorded"),
            }
        }
    }
    Ok(())
}

fn print_results(
    dict: &CantoDict,
    expr: &SearchExpr,
    search: &ccdict_core::SearchOptions,
    format: &ccdict_core::FormatOptions,
) -> anyhow::Result<()> {
    let rendered = dict.search_formatted(expr, search, format).context("searching")?;
    info!(results = rendered.len(), "search complete");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for text in rendered {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}
