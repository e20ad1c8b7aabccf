use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "snack-import")]
#[command(bin_name = "snack-import")]
#[command(version)]
#[command(about = "Import a git repository into a new snack")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a diagnostics log under ~/.config/snack-import/diagnostics"
    )]
    pub diagnostics: bool,

    #[arg(long, value_name = "URL", help = "Pre-fill the import form")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Import a repository without the interactive form")]
    Import(ImportArgs),
    #[command(about = "Show what a repository URL resolves to, without importing")]
    Parse {
        #[arg(value_name = "URL")]
        url: String,
    },
    #[command(about = "Run environment and configuration checks")]
    Doctor,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(
        value_name = "URL",
        required_unless_present = "advanced",
        conflicts_with = "advanced"
    )]
    pub url: Option<String>,

    #[arg(long, help = "Enter repository, subpath and branch separately")]
    pub advanced: bool,

    #[arg(long, requires = "advanced", value_name = "REPO")]
    pub repo: Option<String>,

    #[arg(long, requires = "advanced", value_name = "PATH")]
    pub subpath: Option<String>,

    #[arg(long, requires = "advanced", value_name = "BRANCH")]
    pub branch: Option<String>,
}
