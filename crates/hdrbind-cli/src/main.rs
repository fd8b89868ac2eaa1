//! hdrbind
//!
//! Command-line front end: generates `api.rs` and `funcs.rs` from a C header.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hdrbind_codegen::{generate, CodegenResult, ConfigFile, GenerateOptions};
use miette::{IntoDiagnostic, WrapErr};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hdrbind")]
#[command(version, about = "Generate typed Rust bindings from an exported-API C header")]
struct Cli {
    /// C header to read
    #[arg(long, value_name = "PATH")]
    header: PathBuf,

    /// Directory receiving the generated files
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Package name recorded in the generated files [default: output directory name]
    #[arg(long)]
    package: Option<String>,

    /// TOML file with generator settings; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Macro token before each exported prototype's return type
    #[arg(long, value_name = "TOKEN")]
    export_marker: Option<String>,

    /// Macro token between the return type and the function name
    #[arg(long, value_name = "TOKEN")]
    call_marker: Option<String>,

    /// Prefix removed from native function names
    #[arg(long, value_name = "PREFIX")]
    strip_prefix: Option<String>,

    /// File name of the handle and trait declarations
    #[arg(long, value_name = "FILE")]
    api_file: Option<String>,

    /// File name of the function table
    #[arg(long, value_name = "FILE")]
    funcs_file: Option<String>,

    /// Path of the runtime crate used in generated code
    #[arg(long, value_name = "PATH")]
    runtime_crate: Option<String>,

    /// Write the generated source without running rustfmt
    #[arg(long)]
    no_format: bool,

    /// Fail if the header declares no exported functions
    #[arg(long)]
    require_functions: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Defaults, then the config file, then explicit flags
    fn options(&self) -> CodegenResult<GenerateOptions> {
        let mut options = GenerateOptions::new(&self.header, &self.out);

        if let Some(path) = &self.config {
            options.apply_file(ConfigFile::load(path)?);
        }

        if let Some(package) = &self.package {
            options.package = Some(package.clone());
        }
        if let Some(export) = &self.export_marker {
            options.markers.export = export.clone();
        }
        if let Some(call) = &self.call_marker {
            options.markers.call = call.clone();
        }
        if let Some(prefix) = &self.strip_prefix {
            options.strip_prefix = prefix.clone();
        }
        if let Some(api_file) = &self.api_file {
            options.api_file = api_file.clone();
        }
        if let Some(funcs_file) = &self.funcs_file {
            options.funcs_file = funcs_file.clone();
        }
        if let Some(runtime_crate) = &self.runtime_crate {
            options.runtime_crate = runtime_crate.clone();
        }
        if self.no_format {
            options.format = false;
        }
        if self.require_functions {
            options.require_functions = true;
        }

        Ok(options)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{:?}", report);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> miette::Result<()> {
    let options = cli
        .options()
        .into_diagnostic()
        .wrap_err("failed to load generator settings")?;

    let report = generate(&options)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to generate bindings from {}", options.header.display()))?;

    info!(
        "Wrote {} opaque type(s) and {} function(s) for package {}",
        report.opaque_type_count, report.function_count, report.package_name
    );
    if report.duplicate_functions > 0 {
        info!("Dropped {} duplicate prototype(s)", report.duplicate_functions);
    }
    if report.unmatched_prototypes > 0 {
        info!("Skipped {} unrecognized prototype(s)", report.unmatched_prototypes);
    }
    Ok(())
}

/// Filter directive used when `RUST_LOG` is not set
fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    let formatter = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_level(true);

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(formatter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_header_and_out_are_required() {
        assert!(Cli::try_parse_from(["hdrbind", "--out", "gen"]).is_err());
        assert!(Cli::try_parse_from(["hdrbind", "--header", "api.h"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["hdrbind", "--header", "a.h", "--out", "o", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_default_filter_levels() {
        assert_eq!(default_filter(0, false), "info");
        assert_eq!(default_filter(1, false), "debug");
        assert_eq!(default_filter(3, false), "trace");
        assert_eq!(default_filter(0, true), "error");
    }

    #[test]
    fn test_flags_without_config() {
        let cli = Cli::try_parse_from([
            "hdrbind",
            "--header",
            "include/ort_genai_c.h",
            "--out",
            "src/genai",
            "--strip-prefix",
            "Ort",
            "--no-format",
        ])
        .unwrap();

        let options = cli.options().unwrap();
        assert_eq!(options.header, PathBuf::from("include/ort_genai_c.h"));
        assert_eq!(options.package_name(), "genai");
        assert_eq!(options.strip_prefix, "Ort");
        assert!(!options.format);
        assert!(options.markers.is_default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("hdrbind.toml");
        fs::write(
            &config,
            "package = \"from_file\"\nexport_marker = \"ORT_EXPORT\"\napi_file = \"ort_api.rs\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "hdrbind",
            "--header",
            "api.h",
            "--out",
            "gen",
            "--config",
            config.to_str().unwrap(),
            "--package",
            "from_flag",
        ])
        .unwrap();

        let options = cli.options().unwrap();
        assert_eq!(options.package_name(), "from_flag");
        assert_eq!(options.markers.export, "ORT_EXPORT");
        assert_eq!(options.api_file, "ort_api.rs");
        assert_eq!(options.funcs_file, "funcs.rs");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "hdrbind",
            "--header",
            "api.h",
            "--out",
            "gen",
            "--config",
            "/nonexistent/hdrbind.toml",
        ])
        .unwrap();

        assert!(cli.options().is_err());
    }
}
