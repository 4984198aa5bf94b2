//! Command implementations for the `sourcebundle` binary.

use crate::archive::{archive_download_name, write_tree};
use crate::cli::{self, Commands};
use crate::common::{to_pretty_json, wrap_root, FileSystemObject, Tree};
use crate::extract::read_entries;
use crate::serialize::serialize_reader;
use std::error::Error;
use std::path::Path;

/// Public entry for running CLI logic.
pub async fn run_cli_app() -> Result<(), Box<dyn Error>> {
    let command = cli::run()?;

    match &command {
        Commands::Tree { archive, root, limits } => {
            let config = limits.reader_config()?;
            let file = tokio::fs::File::open(archive).await?;
            let mut tree = serialize_reader(file, config).await?;
            if let Some(name) = root {
                tree = wrap_root(tree, name);
            }
            println!("{}", to_pretty_json(&tree)?);
        }
        Commands::List { archive, limits } => {
            let config = limits.reader_config()?;
            let bytes = tokio::fs::read(archive).await?;
            let entries = read_entries(&bytes, &config)?;

            println!("Archive entries ({}):", entries.len());
            for (path, entry) in &entries {
                match entry {
                    FileSystemObject::File { content } => println!("- {} ({} bytes)", path, content.len()),
                    FileSystemObject::Folder { .. } => println!("- {}", path),
                }
            }
        }
        Commands::Repack { archive, output, name, limits } => {
            let config = limits.reader_config()?;
            let file = tokio::fs::File::open(archive).await?;
            let tree = serialize_reader(file, config).await?;
            let name = match name {
                Some(n) => n.clone(),
                None => archive
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .ok_or("cannot derive an archive name from the input path")?,
            };
            save_tree(&tree, output, &name).await?;
        }
        Commands::PackJson { tree, output, name } => {
            let json = tokio::fs::read(tree).await?;
            let tree: Tree = serde_json::from_slice(&json)?;
            save_tree(&tree, output, name).await?;
        }
    }

    Ok(())
}

async fn save_tree(tree: &Tree, output_dir: &Path, name: &str) -> Result<(), Box<dyn Error>> {
    let bytes = write_tree(tree)?;
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(archive_download_name(name));
    tokio::fs::write(&path, &bytes).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "archive saved");
    println!("{}", path.display());
    Ok(())
}
