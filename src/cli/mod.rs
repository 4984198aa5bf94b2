use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::extract::ReaderConfig;
use crate::guard::SizeLimits;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Size ceiling overrides shared by the reading commands.
#[derive(ClapArgs, Clone, Debug)]
pub struct LimitArgs {
    /// Reject archives larger than this many bytes. [default: 1 MiB]
    #[arg(long)]
    pub max_compressed: Option<u64>,

    /// Reject archives whose files decompress to more than this many bytes. [default: 1 MiB]
    #[arg(long)]
    pub max_decompressed: Option<u64>,

    /// JSON file with a reader configuration (limits, allowed_extensions, ignored_prefixes).
    /// Flags above take precedence over its limits.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the source tree of an archive as JSON.
    #[command(alias = "t")]
    Tree {
        /// The ZIP archive to read.
        #[arg(required = true)]
        archive: PathBuf,

        /// Wrap the tree under a single top-level folder with this name (e.g. "Source Code").
        #[arg(long)]
        root: Option<String>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// List the accepted entries of an archive.
    #[command(alias = "l")]
    List {
        /// The ZIP archive to read.
        #[arg(required = true)]
        archive: PathBuf,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Read an archive, rebuild its tree and write it back as `<NAME>.zip`.
    Repack {
        /// The ZIP archive to read.
        #[arg(required = true)]
        archive: PathBuf,

        /// Directory to write the new archive into.
        #[arg(short, long)]
        output: PathBuf,

        /// Archive name without extension. Defaults to the input file stem.
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        limits: LimitArgs,
    },

    /// Pack a tree JSON document (as printed by `tree`) into `<NAME>.zip`.
    PackJson {
        /// The tree JSON file.
        #[arg(required = true)]
        tree: PathBuf,

        /// Directory to write the archive into.
        #[arg(short, long)]
        output: PathBuf,

        /// Archive name without extension.
        #[arg(long)]
        name: String,
    },
}

impl LimitArgs {
    /// Builds the reader configuration: defaults, then the config file, then flags.
    pub fn reader_config(&self) -> Result<ReaderConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
            None => ReaderConfig::default(),
        };
        let SizeLimits { max_compressed_bytes, max_decompressed_bytes } = config.limits;
        config.limits = SizeLimits {
            max_compressed_bytes: self.max_compressed.unwrap_or(max_compressed_bytes),
            max_decompressed_bytes: self.max_decompressed.unwrap_or(max_decompressed_bytes),
        };
        Ok(config)
    }
}

/// Reads the log filter from `SOURCEBUNDLE_LOG`, falling back to `warn`.
pub fn log_filter_from_env() -> String {
    std::env::var("SOURCEBUNDLE_LOG").unwrap_or_else(|_| "warn".to_string())
}

/// Parses command-line arguments using `clap` and returns the command to execute.
///
/// Parse failures, `--help` and `--version` come back as a `clap::Error` so the
/// caller decides how to print them and which exit code to use.
pub fn run() -> Result<Commands, Box<dyn std::error::Error>> {
    let args = Args::try_parse()?;
    Ok(args.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_tree_with_limits() {
        let args = Args::parse_from(["sourcebundle", "tree", "a.zip", "--root", "Source Code", "--max-decompressed", "10"]);
        match args.command {
            Commands::Tree { archive, root, limits } => {
                assert_eq!(archive, PathBuf::from("a.zip"));
                assert_eq!(root.as_deref(), Some("Source Code"));
                assert_eq!(limits.max_decompressed, Some(10));
                assert_eq!(limits.max_compressed, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"limits": {{"max_compressed_bytes": 5, "max_decompressed_bytes": 6}}, "allowed_extensions": ["vy"]}}"#)?;

        let limits = LimitArgs {
            max_compressed: None,
            max_decompressed: Some(99),
            config: Some(file.path().to_path_buf()),
        };
        let config = limits.reader_config()?;
        assert_eq!(config.limits.max_compressed_bytes, 5);
        assert_eq!(config.limits.max_decompressed_bytes, 99);
        assert_eq!(config.allowed_extensions, vec!["vy".to_string()]);
        assert_eq!(config.ignored_prefixes, ReaderConfig::default().ignored_prefixes);
        Ok(())
    }
}
