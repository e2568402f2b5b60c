use clap::{Args, Parser, Subcommand};
use cmdb_attrs::model::{AttrId, AttributeFlags, FlagsUpdate, ValueType};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2026-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "cmdb-attrs", bin_name = "cmdb-attrs", version = get_version())]
#[command(about = "Manage the attribute catalogue of a CMDB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: config.toml in the OS config directory)
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Directory holding attributes.json (overrides config)
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List attributes, optionally filtered by name or alias
    #[command(alias = "ls", display_order = 1)]
    Search {
        /// Substring of the name (takes precedence over --alias)
        #[arg(long)]
        name: Option<String>,

        /// Substring of the alias
        #[arg(long)]
        alias: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Attributes per page (default: all)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Show one attribute by name, id or alias
    #[command(display_order = 2)]
    Get { key: String },

    /// Create an attribute
    #[command(display_order = 3)]
    Add {
        name: String,

        /// Display alias (defaults to the name)
        #[arg(long)]
        alias: Option<String>,

        /// Value type: int, float, text, datetime, date or time
        #[arg(long = "type", value_name = "TYPE", default_value = "text")]
        value_type: ValueType,

        /// Legal value; repeat for each value
        #[arg(long = "choice", value_name = "VALUE")]
        choices: Vec<String>,

        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Edit an attribute. Omitting --choice clears its legal values
    #[command(display_order = 4)]
    Update {
        id: AttrId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        alias: Option<String>,

        /// Legal value; repeat for each value
        #[arg(long = "choice", value_name = "VALUE")]
        choices: Vec<String>,

        #[command(flatten)]
        flags: FlagArgs,
    },

    /// Delete an attribute and detach it from CI types
    #[command(alias = "rm", display_order = 5)]
    Delete { id: AttrId },
}

/// Definition flags. A bare `--index` means `--index true`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct FlagArgs {
    /// Index the field in the search index
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub index: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub list: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub uniq: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub link: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub password: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub sortable: Option<bool>,
}

impl From<FlagArgs> for FlagsUpdate {
    fn from(args: FlagArgs) -> Self {
        FlagsUpdate {
            is_index: args.index,
            is_list: args.list,
            is_uniq: args.uniq,
            is_link: args.link,
            is_password: args.password,
            is_sortable: args.sortable,
        }
    }
}

impl From<FlagArgs> for AttributeFlags {
    fn from(args: FlagArgs) -> Self {
        let mut flags = AttributeFlags::default();
        FlagsUpdate::from(args).apply(&mut flags);
        flags
    }
}
