//! `coursefit` command-line front end.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use coursefit_recommender::{
    EmbeddingProviderType, Recommendation, RecommendationService, RecommenderConfig,
};

/// Exit code for a request that needs different input.
pub const EXIT_NEEDS_INPUT: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "coursefit")]
#[command(about = "Recommend training courses for a job description")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML). Defaults apply when it does not exist.
    #[arg(short, long, global = true, default_value = "coursefit.toml")]
    pub config: PathBuf,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Job table CSV (overrides the config file).
    #[arg(long, global = true)]
    pub job_table: Option<PathBuf>,

    /// Course table CSV (overrides the config file).
    #[arg(long, global = true)]
    pub course_table: Option<PathBuf>,

    /// Embedding provider: openai or hashing.
    #[arg(long, global = true)]
    pub provider: Option<EmbeddingProviderType>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recommend courses for a job description
    Recommend {
        /// Job description, e.g. "I build React and Node.js web apps"
        query: Vec<String>,

        /// Number of courses to show (config default when unset)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the recommendations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show job and course counts
    Stats,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    pub fn resolve_config(&self) -> anyhow::Result<RecommenderConfig> {
        let mut config = RecommenderConfig::load(&self.config)?;
        if let Some(path) = &self.job_table {
            config.data.job_table = path.clone();
        }
        if let Some(path) = &self.course_table {
            config.data.course_table = path.clone();
        }
        if let Some(provider) = self.provider {
            config.embedding.provider = provider;
        }
        Ok(config)
    }
}

/// Install the stderr log subscriber.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Recommend {
            query,
            top_k,
            json,
        } => {
            let Some(query) = query_text(&query) else {
                warn!("Empty job description");
                eprintln!("Describe the job role to get course recommendations.");
                return Ok(ExitCode::from(EXIT_NEEDS_INPUT));
            };
            let k = top_k.unwrap_or(config.query.top_k);

            let service = RecommendationService::builder()
                .with_config(config)
                .build()
                .await?;
            let results = match service.recommend(&query, k).await {
                Ok(results) => results,
                Err(err) if err.is_recoverable() => {
                    eprintln!("{err}");
                    return Ok(ExitCode::from(EXIT_NEEDS_INPUT));
                }
                Err(err) => return Err(err.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!("{}", render_cards(&results));
            }
        }
        Command::Stats => {
            let service = RecommendationService::builder()
                .with_config(config)
                .build()
                .await?;
            let stats = service.stats();
            println!("jobs: {}", stats.jobs);
            println!("courses: {}", stats.courses);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Join the query words, or `None` when nothing but whitespace was given.
fn query_text(words: &[String]) -> Option<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Numbered cards, one per course, similarity shown as a percentage.
pub fn render_cards(results: &[Recommendation]) -> String {
    if results.is_empty() {
        return "No matching courses.\n".to_string();
    }

    let mut out = String::new();
    for (rank, rec) in results.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", rank + 1, rec.name);
        let _ = writeln!(out, "   category:   {}", rec.category);
        let _ = writeln!(out, "   duration:   {}", rec.duration);
        let _ = writeln!(out, "   similarity: {:.1}%", rec.similarity * 100.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn rec(index: usize, name: &str, similarity: f64) -> Recommendation {
        Recommendation {
            index,
            category: "IT".to_string(),
            name: name.to_string(),
            duration: "10h".to_string(),
            similarity,
        }
    }

    #[test]
    fn test_parse_recommend() {
        let cli = Cli::try_parse_from([
            "coursefit",
            "recommend",
            "python",
            "backend",
            "developer",
            "-k",
            "3",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("coursefit.toml"));
        assert_eq!(cli.log_level, "info");
        match cli.command {
            Command::Recommend { query, top_k, json } => {
                assert_eq!(query_text(&query).unwrap(), "python backend developer");
                assert_eq!(top_k, Some(3));
                assert!(json);
            }
            Command::Stats => panic!("expected recommend"),
        }
    }

    #[test]
    fn test_blank_query_needs_input() {
        assert_eq!(query_text(&[]), None);
        assert_eq!(query_text(&["  ".to_string(), "\t".to_string()]), None);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Cli::try_parse_from(["coursefit", "--provider", "bert", "stats"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_win_over_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("coursefit.toml");
        std::fs::write(
            &config_path,
            "[data]\njob_table = \"jobs.csv\"\ncourse_table = \"courses.csv\"\n\n[query]\ntop_k = 3\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "coursefit",
            "stats",
            "--config",
            config_path.to_str().unwrap(),
            "--course-table",
            "other.csv",
            "--provider",
            "openai",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.data.job_table, PathBuf::from("jobs.csv"));
        assert_eq!(config.data.course_table, PathBuf::from("other.csv"));
        assert_eq!(config.embedding.provider, EmbeddingProviderType::OpenAI);
        assert_eq!(config.query.top_k, 3);
    }

    #[test]
    fn test_render_cards() {
        let out = render_cards(&[rec(2, "Advanced Python", 0.2887), rec(0, "Intro to Python", 0.2357)]);

        assert_eq!(
            out,
            "1. Advanced Python\n\
             \x20  category:   IT\n\
             \x20  duration:   10h\n\
             \x20  similarity: 28.9%\n\
             2. Intro to Python\n\
             \x20  category:   IT\n\
             \x20  duration:   10h\n\
             \x20  similarity: 23.6%\n"
        );
    }

    #[test]
    fn test_render_no_results() {
        assert_eq!(render_cards(&[]), "No matching courses.\n");
    }

    #[tokio::test]
    async fn test_stats_command_runs() {
        let dir = TempDir::new().unwrap();
        let jobs = dir.path().join("jobs.csv");
        let courses = dir.path().join("courses.csv");
        std::fs::write(&jobs, "code,name,desc\nJ01,Backend,APIs\n").unwrap();
        std::fs::write(&courses, "no,category,name,duration\n1,IT,Intro to Python,10h\n").unwrap();

        let cli = Cli::try_parse_from([
            "coursefit",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--job-table",
            jobs.to_str().unwrap(),
            "--course-table",
            courses.to_str().unwrap(),
            "stats",
        ])
        .unwrap();

        assert!(run(cli).await.is_ok());
    }
}
