//! xtumlc: the xtUML model compiler CLI.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tracing_subscriber::EnvFilter;

use xtuml_compiler::{CompiledModel, Compiler, CompilerConfig, CompilerError};

mod ui;

#[derive(Parser)]
#[command(name = "xtumlc")]
#[command(about = "Compile xtUML model documents into runnable Python projects")]
struct Cli {
    /// Log compiler internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a model document (or a directory of them) to Python
    Compile {
        /// Model document or directory of documents
        input: PathBuf,

        /// Output directory for the generated project
        #[arg(short, long, default_value = "generated")]
        output: PathBuf,

        /// Override the model name used in the generated app
        #[arg(long)]
        name: Option<String>,

        /// Print every generated file instead of writing them
        #[arg(long)]
        stdout: bool,

        /// Fail on unresolved attribute or class references
        #[arg(long)]
        strict: bool,
    },

    /// Validate model documents without generating code
    Check {
        /// Model document or directory of documents
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },

    /// Recompile whenever the input changes
    Watch {
        /// Model document or directory of documents
        input: PathBuf,

        /// Output directory for the generated project
        #[arg(short, long, default_value = "generated")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            output,
            name,
            stdout,
            strict,
        } => {
            let config = CompilerConfig {
                input,
                out_dir: output,
                model_name: name,
                strict_symbols: strict,
            };
            if stdout {
                print_project(&config)?;
            } else {
                compile_project(config)?;
            }
        }

        Commands::Check { input, format } => {
            check_models(&input, format)?;
        }

        Commands::Watch { input, output } => {
            run_watch_mode(&input, &output).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("xtuml_compiler={level},xtumlc={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn compile_project(config: CompilerConfig) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner("Compiling model...");

    let compiler = Compiler::new(config);
    let compiled = match compiler.build() {
        Ok(compiled) => compiled,
        Err(e) => {
            spinner.finish_and_clear();
            report_failure(&e);
            return Err(e.into());
        }
    };
    let result = compiler.write(&compiled);
    spinner.finish_and_clear();
    let result = result?;

    ui::box_header("MODELS");
    ui::box_line("");
    let max_files = compiled.iter().map(|m| m.code.file_count()).max().unwrap_or(1);
    for model in &compiled {
        ui::box_line(&ui::model_line(
            &model_label(model),
            model.code.file_count(),
            model.code.warnings.len(),
            max_files,
        ));
    }
    ui::box_line("");
    ui::box_footer();

    if !result.warnings.is_empty() {
        println!();
        ui::info("Translation notes:");
        for note in &result.warnings {
            ui::note(note);
        }
    }

    println!();
    ui::timing(
        &format!("Wrote {} file(s) for {} model(s)", result.files, result.models),
        start.elapsed().as_millis(),
    );
    for out_dir in &result.outputs {
        ui::dim(&format!("python {}", out_dir.join("app.py").display()));
    }
    println!();
    Ok(())
}

fn print_project(config: &CompilerConfig) -> miette::Result<()> {
    let compiler = Compiler::new(config.clone());
    for model in compiler.build()? {
        print!("{}", model.code.combined_preview());
    }
    Ok(())
}

fn check_models(input: &Path, format: Format) -> miette::Result<()> {
    let compiler = Compiler::new(CompilerConfig {
        input: input.to_path_buf(),
        ..CompilerConfig::default()
    });

    if format == Format::Json {
        let report = match compiler.check() {
            Ok(models) => serde_json::json!({"valid": true, "models": models, "issues": []}),
            Err(e) => serde_json::json!({
                "valid": false,
                "error": e.to_string(),
                "issues": e.issues(),
            }),
        };
        let text = serde_json::to_string_pretty(&report).map_err(|e| miette::miette!("{}", e))?;
        println!("{text}");
        if report["valid"] == serde_json::Value::Bool(false) {
            std::process::exit(1);
        }
        return Ok(());
    }

    let spinner = ui::spinner("Checking model...");
    match compiler.check() {
        Ok(models) => {
            spinner.finish_and_clear();
            ui::looking_good();
            ui::dim(&format!("{} document(s) checked", models));
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            report_failure(&e);
            Err(e.into())
        }
    }
}

fn report_failure(error: &CompilerError) {
    ui::nope_header();
    for issue in error.issues() {
        ui::issue(issue);
    }
    if !error.issues().is_empty() {
        println!();
    }
}

fn model_label(model: &CompiledModel) -> String {
    model
        .source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "model".to_string())
}

/// True when a changed path can affect the compiled output.
fn is_model_change(changed: &Path, input: &Path, input_is_dir: bool) -> bool {
    if input_is_dir {
        changed.extension().is_some_and(|ext| ext == "json")
    } else {
        changed.file_name() == input.file_name()
    }
}

async fn run_watch_mode(input: &Path, output: &Path) -> miette::Result<()> {
    ui::info(&format!("Watching {}", input.display()));
    println!();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    let input_is_dir = input.is_dir();
    let watch_root = if input_is_dir {
        input.to_path_buf()
    } else {
        // Editors replace files on save, so watch the parent directory.
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    let filter_input = input.to_path_buf();
    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |result: DebounceEventResult| {
            if let Ok(events) = result {
                if events
                    .iter()
                    .any(|e| is_model_change(&e.path, &filter_input, input_is_dir))
                {
                    let _ = tx.try_send(());
                }
            }
        },
    )
    .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    let mode = if input_is_dir {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    debouncer
        .watcher()
        .watch(&watch_root, mode)
        .map_err(|e| miette::miette!("Failed to watch {}: {}", watch_root.display(), e))?;

    let config = CompilerConfig {
        input: input.to_path_buf(),
        out_dir: output.to_path_buf(),
        ..CompilerConfig::default()
    };
    recompile(&config);
    ui::info("Ready! Waiting for changes...");

    loop {
        tokio::select! {
            _ = rx.recv() => {
                println!();
                recompile(&config);
                println!();
                ui::info("Ready! Waiting for changes...");
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

fn recompile(config: &CompilerConfig) {
    tracing::debug!(input = %config.input.display(), "recompiling");
    let spinner = ui::spinner("Recompiling...");
    let start = Instant::now();

    match Compiler::new(config.clone()).compile() {
        Ok(result) => {
            spinner.finish_and_clear();
            ui::success(&format!(
                "Compiled {} model(s), {} file(s) in {}ms",
                result.models,
                result.files,
                start.elapsed().as_millis()
            ));
            for note in &result.warnings {
                ui::note(note);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            ui::error(&e.to_string());
            for issue in e.issues() {
                ui::issue(issue);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compile_flags() {
        let cli = Cli::try_parse_from([
            "xtumlc", "compile", "model.json", "-o", "out", "--name", "shop", "--strict",
        ])
        .unwrap();
        match cli.command {
            Commands::Compile {
                input,
                output,
                name,
                stdout,
                strict,
            } => {
                assert_eq!(input, PathBuf::from("model.json"));
                assert_eq!(output, PathBuf::from("out"));
                assert_eq!(name.as_deref(), Some("shop"));
                assert!(!stdout);
                assert!(strict);
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn test_check_format() {
        let cli = Cli::try_parse_from(["xtumlc", "-v", "check", "models", "--format", "json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Check { format: Format::Json, .. }));
    }

    #[test]
    fn test_is_model_change() {
        let file = Path::new("models/shop.json");
        assert!(is_model_change(Path::new("/abs/models/shop.json"), file, false));
        assert!(!is_model_change(Path::new("/abs/models/other.json"), file, false));

        let dir = Path::new("models");
        assert!(is_model_change(Path::new("models/nested/a.json"), dir, true));
        assert!(!is_model_change(Path::new("models/notes.txt"), dir, true));
    }
}
