use crate::core::db::{async_db, ensure_db_dir, initialize_db};
use anyhow::{Result, anyhow};

pub async fn run(db: bool, db_path: &str) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for init \"--db\""));
    }

    println!("Initializing db...");
    ensure_db_dir(db_path)?;
    let db = async_db(db_path).await?;
    db.call(|conn| {
        initialize_db(conn).map_err(|e| tokio_rusqlite::Error::Other(e.into()))?;
        Ok(())
    })
    .await?;
    println!("Finished initializing db");

    Ok(())
}
