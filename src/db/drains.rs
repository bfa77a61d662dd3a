use anyhow::{Result, anyhow};
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params, rusqlite};
use uuid::Uuid;

use crate::core::{DrainRecord, DrainReport, DrainStatus};

pub async fn create(conn: &Connection, drain_id: String, vault_name: String) -> Result<()> {
    conn.call(move |c| {
        let tx = c.transaction()?;

        tx.execute(
            "INSERT INTO drains (id, vault_name) VALUES (?1, ?2)",
            params![&drain_id, &vault_name],
        )?;

        let log_id = Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO drain_status_log (id, drain_id, status, description)
             VALUES (?1, ?2, ?3, 'Drain started')",
            params![log_id, &drain_id, DrainStatus::Started.as_str()],
        )?;

        tx.commit()?;
        Ok::<(), rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

pub async fn set_job(conn: &Connection, drain_id: String, job_id: String) -> Result<()> {
    conn.call(move |c| {
        let tx = c.transaction()?;

        tx.execute(
            "UPDATE drains SET job_id = ?2 WHERE id = ?1",
            params![&drain_id, &job_id],
        )?;

        let log_id = Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO drain_status_log (id, drain_id, status, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                log_id,
                &drain_id,
                DrainStatus::InventoryRequested.as_str(),
                format!("Inventory job {job_id}")
            ],
        )?;

        tx.commit()?;
        Ok::<(), rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

pub async fn update_status(
    conn: &Connection,
    drain_id: String,
    status: DrainStatus,
    description: Option<String>,
) -> Result<()> {
    conn.call(move |c| {
        let log_id = Uuid::now_v7().to_string();
        c.execute(
            "INSERT INTO drain_status_log (id, drain_id, status, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![log_id, drain_id, status.as_str(), description],
        )?;
        Ok::<(), rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

/// Store the final counters and mark the drain complete, or interrupted when the
/// deletion loop was cancelled.
pub async fn record_result(conn: &Connection, report: &DrainReport) -> Result<()> {
    let drain_id = report.drain_id.clone();
    let processed = report.archives_processed as i64;
    let succeeded = report.succeeded as i64;
    let failed = report.failed as i64;
    let vault_deleted = report.vault_deleted;
    let elapsed_secs = report.elapsed.as_secs_f64();
    let (status, description) = if report.interrupted {
        (
            DrainStatus::Interrupted,
            format!("Interrupted after {processed} archives"),
        )
    } else {
        (
            DrainStatus::Complete,
            format!("{succeeded} deleted, {failed} failed"),
        )
    };

    conn.call(move |c| {
        let tx = c.transaction()?;

        tx.execute(
            "UPDATE drains SET
                archives_processed = ?2,
                archives_succeeded = ?3,
                archives_failed = ?4,
                vault_deleted = ?5,
                elapsed_secs = ?6
             WHERE id = ?1",
            params![
                &drain_id,
                processed,
                succeeded,
                failed,
                vault_deleted,
                elapsed_secs
            ],
        )?;

        let log_id = Uuid::now_v7().to_string();
        tx.execute(
            "INSERT INTO drain_status_log (id, drain_id, status, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                log_id,
                &drain_id,
                status.as_str(),
                description
            ],
        )?;

        tx.commit()?;
        Ok::<(), rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

/// Job id of the latest drain of `vault_name` that requested an inventory within the
/// last day but never got as far as deleting. Job output expires after a day.
pub async fn find_resumable_job(conn: &Connection, vault_name: String) -> Result<Option<String>> {
    conn.call(move |c| {
        let mut stmt = c.prepare(
            "SELECT d.job_id
             FROM drains d
             WHERE d.vault_name = ?1
               AND d.job_id IS NOT NULL
               AND d.created_at >= datetime('now', '-1 day')
               AND NOT EXISTS (
                   SELECT 1 FROM drain_status_log l
                   WHERE l.drain_id = d.id AND l.status IN (?2, ?3)
               )
             ORDER BY d.created_at DESC, d.rowid DESC
             LIMIT 1",
        )?;

        stmt.query_row(
            params![
                vault_name,
                DrainStatus::Deleting.as_str(),
                DrainStatus::Complete.as_str()
            ],
            |row| row.get::<_, String>(0),
        )
        .optional()
    })
    .await
    .map_err(|e| anyhow!("Failed to look up resumable job: {}", e))
}

pub async fn recent(conn: &Connection, limit: u32) -> Result<Vec<DrainRecord>> {
    conn.call(move |c| {
        let mut stmt = c.prepare(
            "SELECT d.id, d.vault_name, d.job_id, d.archives_processed, d.archives_succeeded,
                    d.archives_failed, d.vault_deleted, d.created_at,
             COALESCE((SELECT status FROM drain_status_log
                       WHERE drain_id = d.id
                       ORDER BY created_at DESC, rowid DESC LIMIT 1), 'Unknown') as status
             FROM drains d
             ORDER BY d.created_at DESC, d.rowid DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(DrainRecord {
                id: row.get(0)?,
                vault_name: row.get(1)?,
                job_id: row.get(2)?,
                archives_processed: row.get(3)?,
                archives_succeeded: row.get(4)?,
                archives_failed: row.get(5)?,
                vault_deleted: row.get(6)?,
                created_at: row.get(7)?,
                status: row.get(8)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok::<_, rusqlite::Error>(records)
    })
    .await
    .map_err(|e| anyhow!("Failed to list drains: {}", e))
}
