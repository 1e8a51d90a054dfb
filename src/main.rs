use clap::{Parser, Subcommand};
use nbgallery::gallery::{self, BuildError};
use nbgallery::{config, output, version};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nbgallery")]
#[command(about = "Build an HTML gallery from directories of Jupyter notebooks")]
#[command(long_about = "\
Build an HTML gallery from directories of Jupyter notebooks

Every top-level directory of the gallery root is a section. Each notebook in a
section is rendered to a standalone HTML page and its last image output is
saved as the thumbnail. When every notebook succeeds, gallery.json lists the
sections and their entries.

Gallery structure:

  root/
  ├── config.toml              # Optional
  ├── resources/               # Reserved: must exist, never a section
  ├── .git/                    # Reserved: must exist, never a section
  ├── tutorials/               # Section
  │   ├── a.ipynb
  │   ├── a.html               # Written
  │   └── a.jpg                # Written (last image output)
  └── gallery.json             # Written on success

Tool version (first available wins):
  --tool-version flag → meta.tool_version → output of meta.version_command

Run 'nbgallery gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Gallery root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Version recorded in the manifest instead of running the version command
    #[arg(long, global = true)]
    tool_version: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every notebook and write the manifest (default)
    Build,
    /// List sections and notebooks without converting anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let config = config::load_config(&cli.root)?;
            let tool_version =
                version::resolve_tool_version(cli.tool_version.as_deref(), &config.meta)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = gallery::build(&cli.root, &config, &tool_version, Some(tx));
            printer
                .join()
                .map_err(|_| "build output printer panicked")?;

            match result {
                Ok(_) => {}
                Err(BuildError::Failed { report }) => {
                    output::print_failures(&report);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            println!("==> Checking {}", cli.root.display());
            let sections = gallery::check(&cli.root, &config)?;
            output::print_check_output(&sections, &config);
            println!("==> Layout is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
