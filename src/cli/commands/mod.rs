//! CLI command implementations.

mod config;
mod doctor;
mod init;
mod list;
mod process;
mod products;
mod resume;
mod search;
mod show;

pub use config::run_config;
pub use doctor::run_doctor;
pub use init::run_init;
pub use list::run_list;
pub use process::run_process;
pub use products::run_products;
pub use resume::run_resume;
pub use search::run_search;
pub use show::run_show;

use crate::config::Settings;
use crate::store::SqliteStore;
use std::sync::Arc;

/// Open the store at the configured path.
fn open_store(settings: &Settings) -> crate::error::Result<Arc<SqliteStore>> {
    Ok(Arc::new(SqliteStore::new(&settings.sqlite_path())?))
}
