//! CLI binary for parallel-reader.
//!
//! A thin shim over the library crate: maps CLI flags to `ReaderConfig`,
//! runs the interactive prompts the library leaves to its caller (file
//! picker, languages, column order, cost confirmation) and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use parallel_reader::{
    estimate_cost, prepare, resolve_backend, translate_units, write_table, BackendKind,
    ColumnOrder, HaltReason, PageMarker, ProgressCallback, ReaderConfig, RunStats,
    SegmentStrategy, TranslationProgressCallback,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: one bar over all units, with a log line for
/// every failure and retry.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Translating");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_units: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} units  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_units as u64);
        self.bar.set_style(style);
        self.bar.reset_eta();
    }

    fn on_unit_start(&self, index: usize, _total: usize) {
        self.bar.set_message(format!("unit {index}"));
    }

    fn on_unit_complete(&self, _index: usize, _total: usize, _chars: usize) {
        self.bar.inc(1);
    }

    fn on_unit_error(&self, index: usize, total: usize, error: String) {
        // Keep log lines to one terminal row.
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error
        };

        self.bar.println(format!(
            "  {} Unit {:>4}/{:<4}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_retry(&self, index: usize, attempt: u32, delay: Duration) {
        self.bar.println(format!(
            "  {} Unit {:>4}  {}",
            yellow("↻"),
            index,
            dim(&format!("retry {attempt} in {:.1}s", delay.as_secs_f64()))
        ));
    }

    fn on_run_complete(&self, stats: &RunStats) {
        self.bar.finish_and_clear();
        if stats.failed == 0 && stats.not_attempted == 0 {
            eprintln!(
                "{} {} units translated",
                green("✔"),
                bold(&stats.translated.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} units translated  ({} failed, {} not attempted)",
                if stats.translated == 0 {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&stats.translated.to_string()),
                stats.total_units,
                red(&stats.failed.to_string()),
                stats.not_attempted,
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # No input path: pick a file from ./SourcePDFs
  parallel-reader

  # Also ask for the languages and column order
  parallel-reader --interactive

  # English → Danish with DeepL, translation in the first column
  parallel-reader book.pdf -o OutputPDFs/book.pdf

  # Original first, German target, no confirmation prompt
  parallel-reader --original-first --target-lang DE --yes book.pdf

  # Play script: one row per speaker turn
  parallel-reader --strategy speaker script.pdf

  # Translate through an LLM instead of DeepL
  parallel-reader --backend llm --provider openai --model gpt-4.1-mini book.pdf

  # Plain text source, first 500 lines only
  parallel-reader --limit 500 notes.txt

FAILURES:
  A unit that cannot be translated keeps its original text and shows a
  marker in the translation column:
    [Translation Error]                   HTTP error or retries exhausted
    [Invalid API Response]                response had no translation
    [Translation Error: Quota exceeded]   quota hit; later units are left empty
  Connection failures and timeouts are retried after --retry-backoff.

ENVIRONMENT VARIABLES:
  DEEPL_AUTH_KEY          DeepL authentication key (":fx" keys use the free API)
  OPENAI_API_KEY          OpenAI API key (LLM backend)
  ANTHROPIC_API_KEY       Anthropic API key (LLM backend)
  GEMINI_API_KEY          Google Gemini API key (LLM backend)
  EDGEQUAKE_LLM_PROVIDER  LLM provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         LLM model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Turn a PDF or text book into a bilingual parallel-text PDF.
#[derive(Parser, Debug)]
#[command(
    name = "parallel-reader",
    version,
    about = "Turn a PDF or text book into a bilingual parallel-text PDF",
    long_about = "Extract the text of a PDF or plain-text book, split it into sentences or \
speaker turns, translate each one with DeepL or an LLM, and render a numbered two-column \
table of original and translation for language study.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source .pdf or .txt file. Prompts for one from --source-dir when omitted.
    input: Option<PathBuf>,

    /// Output PDF path [default: OutputPDFs/<input stem>_parallel.pdf].
    #[arg(short, long, env = "PARALLEL_READER_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory listed by the file picker.
    #[arg(long, env = "PARALLEL_READER_SOURCE_DIR", default_value = "SourcePDFs")]
    source_dir: PathBuf,

    /// Translation backend.
    #[arg(long, env = "PARALLEL_READER_BACKEND", value_enum, default_value = "deepl")]
    backend: BackendArg,

    /// DeepL authentication key.
    #[arg(long, env = "DEEPL_AUTH_KEY", hide_env_values = true)]
    auth_key: Option<String>,

    /// Override the DeepL endpoint URL.
    #[arg(long, env = "PARALLEL_READER_DEEPL_ENDPOINT")]
    deepl_endpoint: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (default gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Source language code.
    #[arg(long, env = "PARALLEL_READER_SOURCE_LANG", default_value = "EN")]
    source_lang: String,

    /// Target language code.
    #[arg(long, env = "PARALLEL_READER_TARGET_LANG", default_value = "DA")]
    target_lang: String,

    /// Maximum pages (PDF) or lines (text) to read.
    #[arg(long, env = "PARALLEL_READER_LIMIT", default_value_t = 151)]
    limit: usize,

    /// Segmentation strategy.
    #[arg(long, env = "PARALLEL_READER_STRATEGY", value_enum, default_value = "sentence")]
    strategy: StrategyArg,

    /// Sentences shorter than this many characters merge into the previous one.
    #[arg(long, env = "PARALLEL_READER_MIN_LEN", default_value_t = 6)]
    min_len: usize,

    /// Page marker: dashes, tildes, or a template containing {page}.
    #[arg(long, env = "PARALLEL_READER_PAGE_MARKER", default_value = "dashes")]
    page_marker: String,

    /// Token replacing form feeds in the extracted text.
    #[arg(long, env = "PARALLEL_READER_BREAK_MARKER", default_value = ";;;;")]
    break_marker: String,

    /// Seconds to wait between translation requests.
    #[arg(long, env = "PARALLEL_READER_COOLDOWN", default_value_t = 1.0)]
    cooldown: f64,

    /// Seconds to wait before retrying after a connection failure or timeout.
    #[arg(long, env = "PARALLEL_READER_RETRY_BACKOFF", default_value_t = 5.0)]
    retry_backoff: f64,

    /// Retries per unit after connection failures or timeouts.
    #[arg(long, env = "PARALLEL_READER_MAX_RETRIES", default_value_t = 5)]
    max_retries: u32,

    /// Retry connection failures without limit.
    #[arg(long, env = "PARALLEL_READER_RETRY_FOREVER", conflicts_with = "max_retries")]
    retry_forever: bool,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "PARALLEL_READER_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Put the original text in the first column.
    #[arg(long, env = "PARALLEL_READER_ORIGINAL_FIRST")]
    original_first: bool,

    /// Add a header row naming the languages on every page.
    #[arg(long, env = "PARALLEL_READER_HEADER")]
    header: bool,

    /// TrueType font for the table text (needed for non-Latin scripts).
    #[arg(long, env = "PARALLEL_READER_FONT")]
    font: Option<PathBuf>,

    /// Price per million characters, for the pre-flight estimate.
    #[arg(long, env = "PARALLEL_READER_PRICE", default_value_t = 25.0)]
    price: f64,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PARALLEL_READER_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens per unit.
    #[arg(long, env = "PARALLEL_READER_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Ask for languages and column order.
    #[arg(short, long)]
    interactive: bool,

    /// Skip the cost confirmation.
    #[arg(short, long)]
    yes: bool,

    /// Print run statistics as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PARALLEL_READER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PARALLEL_READER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PARALLEL_READER_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Deepl,
    Llm,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Deepl => BackendKind::DeepL,
            BackendArg::Llm => BackendKind::Llm,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Sentence,
    Speaker,
}

impl From<StrategyArg> for SegmentStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Sentence => SegmentStrategy::Sentence,
            StrategyArg::Speaker => SegmentStrategy::Speaker,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let mut input_lines = stdin.lock();

    // ── Choose source and languages ──────────────────────────────────────
    let input = match cli.input.clone() {
        Some(path) => path,
        None => pick_source(&cli.source_dir, &mut input_lines)?,
    };

    let (source_lang, target_lang, column_order) = if cli.interactive {
        let source = ask(
            &mut input_lines,
            "What is the original language of the text?",
            &cli.source_lang,
        )?;
        let target = ask(
            &mut input_lines,
            "What language should it be translated to?",
            &cli.target_lang,
        )?;
        let order = ask_column_order(&mut input_lines, &source, &target)?;
        (source, target, order)
    } else {
        let order = if cli.original_first {
            ColumnOrder::OriginalFirst
        } else {
            ColumnOrder::TranslationFirst
        };
        (cli.source_lang.clone(), cli.target_lang.clone(), order)
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, source_lang, target_lang, column_order, progress_cb)?;

    // ── Prepare and estimate ─────────────────────────────────────────────
    let units = prepare(&input, &config)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let estimate = estimate_cost(&units, config.price_per_million_chars);

    if !cli.quiet {
        eprintln!(
            "{} {}  {} units, {} characters, estimated cost {}",
            cyan("◆"),
            bold(&input.display().to_string()),
            estimate.units,
            estimate.characters,
            bold(&format!("${:.2}", estimate.estimated_cost)),
        );
    }
    if !cli.yes && !confirm(&mut input_lines, "Proceed?")? {
        eprintln!("{} Aborted", dim("Note:"));
        return Ok(());
    }

    // ── Translate and render ─────────────────────────────────────────────
    let backend = resolve_backend(&config).context("Translation backend is not configured")?;
    let run = translate_units(backend.as_ref(), units, &config).await;

    let pages = write_table(&run.units, &output, &config)
        .await
        .context("Failed to write output PDF")?;

    if let Some(HaltReason::QuotaExceeded { unit, ref detail }) = run.halted {
        eprintln!(
            "{} Quota exceeded at unit {} ({}); the remaining {} units were not translated",
            yellow("⚠"),
            unit,
            detail,
            run.stats.not_attempted
        );
    }

    if cli.json {
        let summary = serde_json::json!({
            "output": &output,
            "pages": pages,
            "stats": &run.stats,
            "halted": &run.halted,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    }

    if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Translated {}/{} units ({} failed, {} retries) in {}ms",
                run.stats.translated,
                run.stats.total_units,
                run.stats.failed,
                run.stats.retries,
                run.stats.duration_ms
            );
        }
        eprintln!(
            "{}  {} pages  →  {}",
            if run.halted.is_none() && run.stats.failed == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            pages,
            bold(&output.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ReaderConfig`.
fn build_config(
    cli: &Cli,
    source_lang: String,
    target_lang: String,
    column_order: ColumnOrder,
    progress: Option<ProgressCallback>,
) -> Result<ReaderConfig> {
    let cooldown = Duration::try_from_secs_f64(cli.cooldown)
        .with_context(|| format!("Invalid --cooldown {}", cli.cooldown))?;
    let retry_backoff = Duration::try_from_secs_f64(cli.retry_backoff)
        .with_context(|| format!("Invalid --retry-backoff {}", cli.retry_backoff))?;

    let mut builder = ReaderConfig::builder()
        .limit(cli.limit)
        .page_marker(parse_page_marker(&cli.page_marker))
        .break_marker(cli.break_marker.clone())
        .strategy(cli.strategy.into())
        .min_unit_len(cli.min_len)
        .backend(cli.backend.into())
        .languages(source_lang, target_lang)
        .cooldown(cooldown)
        .retry_backoff(retry_backoff)
        .max_retries((!cli.retry_forever).then_some(cli.max_retries))
        .request_timeout_secs(cli.timeout)
        .column_order(column_order)
        .header(cli.header)
        .price_per_million_chars(cli.price)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens);

    if let Some(ref key) = cli.auth_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.deepl_endpoint {
        builder = builder.deepl_endpoint(url.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--page-marker` into `PageMarker`.
fn parse_page_marker(s: &str) -> PageMarker {
    match s.to_lowercase().as_str() {
        "dashes" => PageMarker::Dashes,
        "tildes" => PageMarker::Tildes,
        _ => PageMarker::Custom(s.to_string()),
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    PathBuf::from("OutputPDFs").join(format!("{stem}_parallel.pdf"))
}

// ── Prompts ──────────────────────────────────────────────────────────────────

fn read_answer(input: &mut impl BufRead) -> Result<String> {
    io::stderr().flush().ok();
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read from stdin")? == 0 {
        bail!("stdin closed while waiting for an answer");
    }
    Ok(line.trim().to_string())
}

/// List `.pdf` and `.txt` files in `dir` and ask for one by number.
fn pick_source(dir: &Path, input: &mut impl BufRead) -> Result<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("No input given and cannot list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf") || e.eq_ignore_ascii_case("txt"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("No .pdf or .txt files found in {}", dir.display());
    }

    eprintln!("{}", bold("Available files:"));
    for (i, file) in files.iter().enumerate() {
        let name = file.file_name().unwrap_or_default().to_string_lossy();
        eprintln!("  {}. {}", i + 1, name);
    }

    loop {
        eprint!("\nEnter the number of the file you want to process: ");
        let answer = read_answer(input)?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => return Ok(files.swap_remove(n - 1)),
            Ok(_) => eprintln!("Invalid number. Please try again."),
            Err(_) => eprintln!("Please enter a valid number."),
        }
    }
}

/// Ask a free-text question; an empty answer keeps `default`.
fn ask(input: &mut impl BufRead, question: &str, default: &str) -> Result<String> {
    eprint!("{question} {} ", dim(&format!("[{default}]")));
    let answer = read_answer(input)?;
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer
    })
}

fn ask_column_order(input: &mut impl BufRead, source: &str, target: &str) -> Result<ColumnOrder> {
    loop {
        eprint!(
            "\nWhich text should be in the first column?\n1. {source}\n2. {target}\nEnter 1 or 2: "
        );
        match read_answer(input)?.as_str() {
            "1" => return Ok(ColumnOrder::OriginalFirst),
            "2" => return Ok(ColumnOrder::TranslationFirst),
            _ => eprintln!("Please enter either 1 or 2."),
        }
    }
}

fn confirm(input: &mut impl BufRead, question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    let answer = read_answer(input)?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
