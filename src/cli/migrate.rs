use crate::core::db::{async_db, migrate_db};
use anyhow::{Result, anyhow};

pub async fn run(db: bool, db_path: &str) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for migrate \"--db\""));
    }

    // Run the DB migration script
    println!("Migrating db...");
    let db = async_db(db_path).await?;
    let applied = db
        .call(|conn| migrate_db(conn).map_err(|e| tokio_rusqlite::Error::Other(e.into())))
        .await?;
    println!("Finished migrating db ({} migrations applied)", applied);

    Ok(())
}
