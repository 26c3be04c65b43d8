use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("TOOLSHELF_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("TOOLSHELF_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("TOOLSHELF_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "toolshelf")]
#[command(about = "Install and activate side-by-side versions of tools in container images")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read settings from this JSON file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install every manifest version of each tool directory, then link aliases
    #[command(
        after_help = "Each tool directory must contain a manifest (default 'versions.txt') and an\nexecutable installer hook (default 'install').\n\nExamples:\n  toolshelf install /opt/tools/jdk /opt/tools/node\n  toolshelf install --strict --report /tmp/install.json /opt/tools/*"
    )]
    Install {
        /// Tool directories, processed in the order given
        #[arg(required = true, value_name = "TOOL_DIR")]
        tool_dirs: Vec<PathBuf>,
        /// Enable debug output for toolshelf and installer hooks
        #[arg(long)]
        debug: bool,
        /// Exit non-zero when any tool is skipped or fails
        #[arg(long)]
        strict: bool,
        /// Write a JSON (or YAML for .yaml/.yml) run report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Refresh version aliases inside a tool directory
    Link {
        /// Tool directory containing the installed version
        tool_dir: PathBuf,
        /// Installed version to derive truncated aliases from
        #[arg(id = "version_arg", value_name = "VERSION", required_unless_present = "latest")]
        version: Option<String>,
        /// Point 'latest' at the highest version directory on disk
        #[arg(long)]
        latest: bool,
    },

    /// Fetch an archive and unpack it as DEST/VERSION (for use in installer hooks)
    #[command(
        after_help = "Examples:\n  toolshelf unpack \"$1\" \"$2\" --prune src.zip --prune demo\n  toolshelf unpack 11.0.20.1 https://example.com/jdk.tar.gz --link lib/security/cacerts=/etc/ssl/certs/java/cacerts"
    )]
    Unpack {
        /// Version name of the directory to create
        #[arg(id = "version_arg", value_name = "VERSION")]
        version: String,
        /// http(s) URL, file:// URL or local path of a .tar.gz/.tgz/.tar.xz/.txz/.tar/.zip archive
        location: String,
        /// Directory to create the version directory in (defaults to the current directory)
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
        /// Replace an existing version directory
        #[arg(long)]
        force: bool,
        /// Remove every file or directory with this name after unpacking
        #[arg(long, value_name = "NAME")]
        prune: Vec<String>,
        /// Replace RELATIVE_PATH inside the version with a symlink to TARGET
        #[arg(long, value_name = "RELATIVE_PATH=TARGET")]
        link: Vec<String>,
    },

    /// Print the concrete directory for a version or alias
    Resolve {
        /// Tool directory to resolve in
        tool_dir: PathBuf,
        /// Version or alias (defaults to $<TOOL>_VERSION, then 'latest')
        #[arg(id = "version_arg", value_name = "VERSION")]
        version: Option<String>,
    },

    /// List installed versions and aliases of a tool directory
    List {
        tool_dir: PathBuf,
    },

    /// Inspect toolshelf's configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show the current version
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a configuration setting
    Get {
        /// Key to get (e.g. 'manifest-name')
        key: String,
    },
    /// Show the effective configuration
    Show {
        /// Output format (json, yaml, plain)
        #[arg(long, default_value = "json")]
        format: String,
    },
}
