//! cv-matcher: hybrid CV-to-job matching and job-category classification

use clap::Parser;
use cv_matcher::cli::{self, Cli, Commands, ConfigAction, RulesAction};
use cv_matcher::config::{Config, OutputFormat};
use cv_matcher::output::formatter::formatter_for;
use cv_matcher::processing::keyword_rules::RuleTable;
use cv_matcher::processing::text_processor::TextProcessor;
use cv_matcher::{AnalysisEngine, ClassifyOptions, MatchOptions, MatcherError, Result};
use log::{error, info};
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {}", e);
        process::exit(if e.is_input_error() { 2 } else { 1 });
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => Config::load_from(path),
        Some(path) => {
            info!("No configuration at {}; writing defaults", path.display());
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
        None => Config::load(),
    }
}

fn output_format(json: bool, config: &Config) -> OutputFormat {
    if json {
        OutputFormat::Json
    } else {
        config.output.format
    }
}

async fn run_command(
    command: Commands,
    config: Config,
    config_path: Option<PathBuf>,
) -> Result<()> {
    match command {
        Commands::Classify { cv, json, no_analyst } => {
            let text = cli::read_text(&cv)?;
            let engine = AnalysisEngine::from_config(&config)?;

            let result = engine
                .classify(&text, ClassifyOptions { use_analyst: !no_analyst })
                .await?;

            let formatter = formatter_for(output_format(json, &config), &config.output);
            println!("{}", formatter.format_classification(&result)?);
        }

        Commands::Match {
            cv,
            jobs,
            jobs_json,
            top_k,
            semantic_only,
            json,
        } => {
            let cv_text = cli::read_text(&cv)?;
            let mut candidates = cli::read_candidates(&jobs)?;
            if let Some(path) = &jobs_json {
                candidates.extend(cli::read_candidates_json(path)?);
            }
            if candidates.is_empty() {
                return Err(MatcherError::InvalidInput(
                    "Provide at least one --job file or --jobs-json".to_string(),
                ));
            }

            let engine = AnalysisEngine::from_config(&config)?;
            let options = MatchOptions {
                top_k,
                use_hybrid: semantic_only.then_some(false),
            };
            info!("Matching {} against {} job(s)", cv.display(), candidates.len());
            let report = engine.match_jobs(&cv_text, &candidates, options).await?;

            let formatter = formatter_for(output_format(json, &config), &config.output);
            println!("{}", formatter.format_matches(&report)?);
        }

        Commands::RankCvs {
            job,
            cvs,
            top_k,
            semantic_only,
            json,
        } => {
            let job_text = cli::read_text(&job)?;
            let candidates = cli::read_candidates(&cvs)?;

            let engine = AnalysisEngine::from_config(&config)?;
            let options = MatchOptions {
                top_k,
                use_hybrid: semantic_only.then_some(false),
            };
            info!("Ranking {} CV(s) for {}", candidates.len(), job.display());
            let report = engine.match_cvs(&job_text, &candidates, options).await?;

            let formatter = formatter_for(output_format(json, &config), &config.output);
            println!("{}", formatter.format_matches(&report)?);
        }

        Commands::Status { json } => {
            let engine = AnalysisEngine::from_config(&config)?;
            let formatter = formatter_for(output_format(json, &config), &config.output);
            println!("{}", formatter.format_status(&engine.status())?);
        }

        Commands::Rules { action } => {
            let processor = TextProcessor::new()?;
            match action {
                RulesAction::Validate { path } => {
                    let path = path.or_else(|| config.classification.rules_path.clone());
                    let rules = RuleTable::load_or_bundled(path.as_deref(), &processor)?;
                    rules.ensure_label_absent(&config.classification.sentinel_label)?;
                    rules.ensure_label_absent(&config.classification.default_label)?;
                    println!(
                        "✅ Rule table v{} is valid ({} categories)",
                        rules.version,
                        rules.rules.len()
                    );
                }
                RulesAction::Show { json } => {
                    let rules = RuleTable::load_or_bundled(
                        config.classification.rules_path.as_deref(),
                        &processor,
                    )?;
                    let formatter = formatter_for(output_format(json, &config), &config.output);
                    println!("{}", formatter.format_rules(&rules)?);
                }
            }
        }

        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    MatcherError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("{}", content);
            }
            ConfigAction::Reset => {
                let path = match config_path {
                    Some(path) => {
                        Config::default().save_to(&path)?;
                        path
                    }
                    None => {
                        Config::default().save()?;
                        Config::config_path()
                    }
                };
                println!("✅ Configuration reset to defaults at {}", path.display());
            }
            ConfigAction::Path => {
                let path = config_path.unwrap_or_else(Config::config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}
