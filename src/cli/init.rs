use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::{get_connection, init_db};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    let data_dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    std::fs::create_dir_all(settings.exports_dir())?;
    save_settings(&settings)?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;
    tracing::info!(data_dir = %data_dir.display(), "initialized");

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", settings.db_path().display());
    println!();
    println!("Ready. Create an account with `raporlama register EMAIL`.");
    Ok(())
}
