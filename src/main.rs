use clap::{Parser, Subcommand};
use release_stage::commands;
use release_stage::core::error::{ReleaseError, print_error};
use release_stage::manifest::ManifestField;
use release_stage::package::PackageOptions;
use std::path::PathBuf;

/// Stage, package and publish release artefacts from CI
#[derive(Parser)]
#[command(name = "release-stage")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Staging
  // ============================================================================
  /// Stage artefacts for one target using a TOML configuration file
  Stage {
    /// Path to the staging configuration file
    config_file: PathBuf,
    /// Target key in the configuration file (e.g. linux-x86_64)
    target: String,
    /// Workspace root containing the build outputs
    #[arg(long, env = "GITHUB_WORKSPACE")]
    workspace: Option<PathBuf>,
    /// File that receives the workflow outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,
  },

  // ============================================================================
  // Packaging & Publishing
  // ============================================================================
  /// Build Linux packages for a release binary with nFPM
  #[command(disable_version_flag = true)]
  Package {
    /// Workspace root
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,
    /// Name of the built binary
    #[arg(long)]
    bin_name: String,
    /// Override the package name (default: bin name)
    #[arg(long)]
    package_name: Option<String>,
    /// Target triple the binary was built for
    #[arg(long)]
    target: String,
    /// Package version (a leading `v` is stripped)
    #[arg(long)]
    version: String,
    /// nFPM packagers to run
    #[arg(long, num_args = 1.., default_values_t = vec!["deb".to_string()])]
    formats: Vec<String>,
    /// Man page path relative to the project dir (repeatable)
    #[arg(long = "man-path")]
    man_paths: Vec<PathBuf>,
    /// Section used when a man page name carries none
    #[arg(long, default_value = "1")]
    man_section: String,
    /// Debian dependencies (repeatable, comma or space separated)
    #[arg(long)]
    deb_depends: Vec<String>,
    /// RPM dependencies (default: the Debian dependencies)
    #[arg(long)]
    rpm_depends: Option<Vec<String>>,
    /// Output directory for built packages
    #[arg(long, default_value = "dist")]
    outdir: PathBuf,
    /// Where to write the nFPM manifest
    #[arg(long, default_value = "dist/nfpm.yaml")]
    config_path: PathBuf,
    #[arg(long)]
    license: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    maintainer: Option<String>,
    #[arg(long)]
    homepage: Option<String>,
    /// nFPM executable to invoke
    #[arg(long, default_value = "nfpm")]
    nfpm_binary: String,
  },

  /// Upload staged artefacts to a GitHub release
  Upload {
    /// Release tag to upload to
    #[arg(long, env = "INPUT_RELEASE_TAG")]
    release_tag: String,
    /// Binary name used to pick artefacts
    #[arg(long, env = "INPUT_BIN_NAME")]
    bin_name: String,
    /// Directory holding the staged artefacts
    #[arg(long, env = "INPUT_DIST_DIR", default_value = "dist")]
    dist_dir: PathBuf,
    /// Print the planned uploads without running gh
    #[arg(long, env = "INPUT_DRY_RUN")]
    dry_run: bool,
  },

  // ============================================================================
  // Workflow helpers
  // ============================================================================
  /// Derive release modes from the triggering workflow event
  ReleaseModes {
    /// Event name (push or workflow_call)
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    event_name: Option<String>,
    /// Path to the event payload JSON
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,
    /// File that receives the workflow outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,
  },

  /// Re-export the staged binary and licence paths in Windows form
  WindowsPaths {
    /// `artefact_map` JSON emitted by `stage`
    #[arg(long, env = "ARTEFACT_MAP")]
    artefact_map: Option<String>,
    /// File that receives the workflow outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,
  },

  /// Print a field from a Cargo.toml package table
  Manifest {
    /// Field to print
    #[arg(value_enum)]
    field: ManifestField,
    /// Path to Cargo.toml
    #[arg(long, env = "CARGO_TOML_PATH", default_value = "Cargo.toml")]
    manifest_path: PathBuf,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Stage {
      config_file,
      target,
      workspace,
      github_output,
    } => commands::run_stage(config_file, target, workspace, github_output),

    Commands::Package {
      project_dir,
      bin_name,
      package_name,
      target,
      version,
      formats,
      man_paths,
      man_section,
      deb_depends,
      rpm_depends,
      outdir,
      config_path,
      license,
      description,
      maintainer,
      homepage,
      nfpm_binary,
    } => commands::run_package(PackageOptions {
      project_dir,
      bin_name,
      package_name,
      target,
      version,
      formats,
      man_paths,
      man_section,
      deb_depends,
      rpm_depends,
      outdir,
      config_path,
      license,
      description,
      maintainer,
      homepage,
      nfpm_binary,
    }),

    Commands::Upload {
      release_tag,
      bin_name,
      dist_dir,
      dry_run,
    } => commands::run_upload(release_tag, bin_name, dist_dir, dry_run),

    Commands::ReleaseModes {
      event_name,
      event_path,
      github_output,
    } => commands::run_release_modes(event_name, event_path, github_output),

    Commands::WindowsPaths {
      artefact_map,
      github_output,
    } => commands::run_windows_paths(artefact_map, github_output),

    Commands::Manifest { field, manifest_path } => commands::run_manifest(field, manifest_path),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
