use super::exit_codes;
use crate::cli::args::InitDbArgs;
use sqlgate_core::config::write_sample_config;
use sqlgate_core::executor::SqliteExecutor;
use std::path::Path;

pub fn cmd_init_db(args: InitDbArgs) -> anyhow::Result<i32> {
    ensure_parent_dir(&args.db)?;
    let store = SqliteExecutor::open(&args.db)?;
    store.init_schema()?;
    eprintln!("initialized pp_complete in {}", args.db.display());

    if let Some(path) = &args.write_config {
        if path.exists() {
            eprintln!("note: {} already exists (skipped)", path.display());
        } else {
            ensure_parent_dir(path)?;
            write_sample_config(path)?;
            eprintln!("created {}", path.display());
        }
    }
    Ok(exit_codes::OK)
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
