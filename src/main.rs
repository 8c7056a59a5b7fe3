use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use litscout::aggregator::Aggregator;
use litscout::config::{default_config_path, find_config_file, load_config, render_config, save_config, Config};
use litscout::models::{PaperRecord, SearchQuery, SearchResults};
use litscout::refine::refine_query;
use litscout::report::{build_report, format_citation, CitationStyle, GeneratedReport, SelectedPaper};
use litscout::server::{self, AppState};
use litscout::sources::SourceRegistry;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// litscout - Search PubMed and arXiv and build research reports
#[derive(Parser, Debug)]
#[command(name = "litscout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search PubMed and arXiv and build research reports", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Sources that can be searched
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    #[value(name = "pubmed")]
    Pubmed,
    #[value(name = "arxiv")]
    Arxiv,
    #[value(name = "all")]
    All,
}

impl Source {
    fn id(self) -> Option<&'static str> {
        match self {
            Source::Pubmed => Some("pubmed"),
            Source::Arxiv => Some("arxiv"),
            Source::All => None,
        }
    }
}

/// Citation style for the report's citation list
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CiteStyle {
    Apa,
    Mla,
    Bibtex,
}

impl From<CiteStyle> for CitationStyle {
    fn from(style: CiteStyle) -> Self {
        match style {
            CiteStyle::Apa => CitationStyle::Apa,
            CiteStyle::Mla => CitationStyle::Mla,
            CiteStyle::Bibtex => CitationStyle::Bibtex,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Maximum results per source (defaults to search.max_results)
        #[arg(long, short)]
        max_results: Option<usize>,

        /// Source to search
        #[arg(long, short, value_enum, default_value_t = Source::All)]
        source: Source,
    },

    /// Generate a research report from selected papers
    Report {
        /// JSON file with the selection: a paper array, {"papers": [...]}, or saved search output
        #[arg(long, short)]
        input: PathBuf,

        /// Query the papers were selected for
        #[arg(long)]
        query: String,

        /// Citation style for the citation list
        #[arg(long, value_enum, default_value_t = CiteStyle::Apa)]
        style: CiteStyle,

        /// Write the report to a file instead of stdout
        #[arg(long = "out-file", short = 'f')]
        out_file: Option<PathBuf>,
    },

    /// Suggest follow-up questions and refined queries
    Refine {
        /// Query to refine
        query: String,
    },

    /// Run the HTTP API server
    Serve {
        /// Host to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// List the enabled sources
    Sources,

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write the effective configuration to a file
    Init {
        /// Destination (defaults to the per-user config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("litscout={}", level)),
    );

    // Logs go to stderr so stdout stays parseable
    if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit --config must load; a discovered file falls back to defaults
    let (config, discovered_error) = match &cli.config {
        Some(path) => (
            load_config(Some(path.as_path()))
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None,
        ),
        None => match load_config(find_config_file().as_deref()) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };

    init_tracing(&cli, &config);
    if let Some(e) = discovered_error {
        tracing::warn!("Ignoring unreadable configuration: {}", e);
    }

    let output = cli.output.resolve();

    match cli.command {
        Some(Commands::Search {
            query,
            max_results,
            source,
        }) => {
            let registry = build_registry(&config, source)?;
            let aggregator = Aggregator::new(Arc::new(registry));
            let search_query = SearchQuery::new(query)
                .max_results(max_results.unwrap_or(config.search.max_results));

            let results = aggregator.search_with(&search_query).await?;

            if !cli.quiet {
                for (source_id, papers) in &results.results {
                    match results.errors.get(source_id) {
                        Some(reason) => eprintln!("Error searching {}: {}", source_id, reason),
                        None => eprintln!("Found {} papers from {}", papers.len(), source_id),
                    }
                }
            }

            output_results(&results, output)?;
        }

        Some(Commands::Report {
            input,
            query,
            style,
            out_file,
        }) => {
            let papers = read_selection(&input)?;
            let report = build_report(&papers, &query)?;

            // Markdown unless JSON is asked for explicitly
            let rendered = if cli.output == OutputFormat::Json {
                serde_json::to_string_pretty(&report)?
            } else {
                render_report(&report, style.into())
            };

            match out_file {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.quiet {
                        eprintln!("Report written to {}", path.display());
                    }
                }
                None => println!("{}", rendered),
            }
        }

        Some(Commands::Refine { query }) => {
            let refinement = refine_query(&query)?;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&refinement)?),
                _ => {
                    println!("Follow-up questions:");
                    for question in &refinement.follow_up_questions {
                        println!("  - {}", question);
                    }
                    println!();
                    println!("Refined queries:");
                    for refined in &refinement.refined_queries {
                        println!("  - {}", refined);
                    }
                    println!();
                    println!("{}", refinement.explanation);
                }
            }
        }

        Some(Commands::Serve { host, port }) => {
            let mut server_config = config.server.clone();
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }

            let registry = SourceRegistry::from_config(&config)?;
            let aggregator =
                Aggregator::new(Arc::new(registry)).max_results(config.search.max_results);

            server::serve(&server_config, AppState::new(aggregator))
                .await
                .context("Server failed")?;
        }

        Some(Commands::Sources) => {
            let registry = SourceRegistry::from_config(&config)?;
            match output {
                OutputFormat::Json => {
                    let sources: Vec<_> = registry
                        .all()
                        .map(|s| serde_json::json!({ "id": s.id(), "name": s.name() }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&sources)?);
                }
                _ => {
                    for src in registry.all() {
                        println!("{} - {}", src.id(), src.name());
                    }
                }
            }
        }

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { path, force } => {
                let path = path
                    .or_else(default_config_path)
                    .context("No configuration directory available; pass --path")?;
                save_config(&config, &path, force)?;
                if !cli.quiet {
                    eprintln!("Configuration written to {}", path.display());
                }
            }
            ConfigAction::Show => match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                _ => print!("{}", render_config(&config)?),
            },
        },

        None => {
            println!("litscout v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information.");
            println!();
            println!("Commands:");
            println!("  search <query>   - Search PubMed and arXiv");
            println!("  report           - Generate a report from selected papers");
            println!("  refine <query>   - Suggest refined queries");
            println!("  serve            - Run the HTTP API server");
            println!("  sources          - List enabled sources");
            println!("  config           - Show or create the configuration");
        }
    }

    Ok(())
}

/// Registry restricted to the requested source
fn build_registry(config: &Config, source: Source) -> Result<SourceRegistry> {
    let registry = SourceRegistry::from_config(config)?;
    match source.id() {
        Some(id) => registry
            .select(id)
            .with_context(|| format!("Source '{}' is not enabled", id)),
        None => Ok(registry),
    }
}

/// Load a paper selection.
///
/// Accepts a JSON array of papers, an object with a `papers` array, or the
/// JSON output of `litscout search`.
fn read_selection(path: &Path) -> Result<Vec<SelectedPaper>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_selection(&text).with_context(|| format!("Invalid paper selection in {}", path.display()))
}

fn parse_selection(text: &str) -> Result<Vec<SelectedPaper>> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let papers = match value {
        serde_json::Value::Object(mut map) => match map.remove("papers") {
            Some(list) => serde_json::from_value(list)?,
            None => {
                let results: SearchResults = serde_json::from_value(serde_json::Value::Object(map))?;
                results.all_papers().map(SelectedPaper::from).collect()
            }
        },
        other => serde_json::from_value(other)?,
    };

    Ok(papers)
}

/// Markdown report followed by the formatted citation list
fn render_report(report: &GeneratedReport, style: CitationStyle) -> String {
    let mut out = report.report.clone();
    out.push_str(&format!("\n## Citations ({})\n\n", style));
    for citation in &report.citations {
        out.push_str(&format!("[{}] {}\n\n", citation.id, format_citation(citation, style)));
    }
    out.push_str(&format!("_Generated at {}_\n", report.generated_at));
    out
}

/// Truncate to `max` characters with a trailing ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn source_identifier(paper: &PaperRecord) -> &str {
    paper.pmid().or(paper.arxiv_id()).unwrap_or_default()
}

fn output_results(results: &SearchResults, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
        OutputFormat::Plain => {
            for paper in results.all_papers() {
                println!("{} - {} ({})", paper.title, paper.authors.join(", "), paper.source);
                println!("  Year: {}", paper.year);
                println!("  URL: {}", paper.url);
                println!();
            }
            println!("Total: {}", results.total_count);
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Source", "Year", "ID"]);

            for paper in results.all_papers() {
                table.add_row(vec![
                    Cell::new(truncate(&paper.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(truncate(&paper.authors.join(", "), 30)),
                    Cell::new(paper.source.to_string()),
                    Cell::new(&paper.year),
                    Cell::new(source_identifier(paper)),
                ]);
            }
            println!("{table}");
            println!("Total: {}", results.total_count);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["litscout"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert!(cli.config.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["litscout", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["litscout", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["litscout", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["litscout", "sources", "--output", "plain"]);
        assert_eq!(cli.output, OutputFormat::Plain);
        assert_eq!(OutputFormat::Plain.resolve(), OutputFormat::Plain);
    }

    #[test]
    fn test_cli_config_flag() {
        let cli = Cli::parse_from(["litscout", "--config", "/path/to/litscout.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/litscout.toml")));
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["litscout", "search", "diabetes"]);
        match &cli.command {
            Some(Commands::Search {
                query,
                max_results,
                source,
            }) => {
                assert_eq!(query, "diabetes");
                assert_eq!(*max_results, None);
                assert_eq!(*source, Source::All);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_search_with_options() {
        let cli = Cli::parse_from([
            "litscout",
            "search",
            "neural networks",
            "--max-results",
            "5",
            "--source",
            "arxiv",
        ]);
        match &cli.command {
            Some(Commands::Search {
                max_results,
                source,
                ..
            }) => {
                assert_eq!(*max_results, Some(5));
                assert_eq!(source.id(), Some("arxiv"));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_report_command() {
        let cli = Cli::parse_from([
            "litscout",
            "report",
            "--input",
            "papers.json",
            "--query",
            "diabetes",
            "--style",
            "bibtex",
        ]);
        match &cli.command {
            Some(Commands::Report {
                input,
                query,
                style,
                out_file,
            }) => {
                assert_eq!(input, &PathBuf::from("papers.json"));
                assert_eq!(query, "diabetes");
                assert_eq!(CitationStyle::from(*style), CitationStyle::Bibtex);
                assert!(out_file.is_none());
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["litscout", "serve", "--port", "8080"]);
        match &cli.command {
            Some(Commands::Serve { host, port }) => {
                assert!(host.is_none());
                assert_eq!(*port, Some(8080));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_config_init() {
        let cli = Cli::parse_from(["litscout", "config", "init", "--path", "x.toml", "--force"]);
        match &cli.command {
            Some(Commands::Config {
                action: ConfigAction::Init { path, force },
            }) => {
                assert_eq!(path.as_deref(), Some(Path::new("x.toml")));
                assert!(*force);
            }
            _ => panic!("Expected config init"),
        }
    }

    #[test]
    fn test_parse_selection_shapes() {
        let array = r#"[{"title": "A"}, {"title": "B", "authors": ["X"]}]"#;
        let papers = parse_selection(array).unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1].authors, vec!["X"]);
        assert_eq!(papers[0].year, "Unknown");

        let wrapped = r#"{"papers": [{"title": "A"}], "query": "q"}"#;
        assert_eq!(parse_selection(wrapped).unwrap()[0].title, "A");

        let search_output = r#"{
            "pubmed": [{
                "title": "T", "abstract": "Ab", "authors": [], "year": "2020",
                "source": "PubMed", "url": "https://pubmed.ncbi.nlm.nih.gov/1/",
                "pmid": "1", "journal": "J"
            }],
            "arxiv": [],
            "total_count": 1
        }"#;
        let papers = parse_selection(search_output).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].pmid, "1");
        assert_eq!(papers[0].source, "PubMed");

        assert!(parse_selection("\"nope\"").is_err());
    }

    #[test]
    fn test_render_report_lists_citations() {
        let papers = vec![SelectedPaper {
            title: "Deep Learning".to_string(),
            authors: vec!["Ada Lovelace".to_string()],
            year: "2023".to_string(),
            source: "ArXiv".to_string(),
            ..SelectedPaper::default()
        }];
        let report = build_report(&papers, "ml").unwrap();
        let rendered = render_report(&report, CitationStyle::Apa);

        assert!(rendered.starts_with("# Research Report: ml"));
        assert!(rendered.contains("## Citations (APA 7th)"));
        assert!(rendered.contains("[1] Lovelace, A. (2023). Deep Learning. ArXiv."));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
