use anyhow::Result;
use std::path::Path;
use tokio_rusqlite::Connection;

pub mod drains;

pub async fn init(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path.to_path_buf()).await?;
    apply_schema(&conn).await?;
    Ok(conn)
}

pub async fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().await?;
    apply_schema(&conn).await?;
    Ok(conn)
}

async fn apply_schema(conn: &Connection) -> Result<()> {
    conn.call(|conn| {
        let schema = include_str!("schema.sql");
        conn.execute_batch(schema)?;

        // Enable foreign keys (SQLite disables them by default!)
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        Ok::<(), tokio_rusqlite::rusqlite::Error>(())
    })
    .await?;

    Ok(())
}
