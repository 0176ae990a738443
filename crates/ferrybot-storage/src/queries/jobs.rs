// SPDX-FileCopyrightText: 2026 Ferrybot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crash-safe background job queue.
//!
//! Desk-sync and webhook deliveries go through here so the inbound request
//! path never waits on downstream systems. Delivery is at-least-once: a
//! worker that dies mid-job leaves a lock that expires after five minutes,
//! after which the job is claimable again.

use ferrybot_core::FerrybotError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::JobEntry;

fn row_to_job(row: &rusqlite::Row<'_>) -> Result<JobEntry, rusqlite::Error> {
    Ok(JobEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

const JOB_COLUMNS: &str =
    "id, queue_name, payload, status, attempts, max_attempts, created_at, updated_at, locked_until";

/// Enqueue a job. Returns its id.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
) -> Result<i64, FerrybotError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO jobs (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Claim the next runnable job in the named queue.
///
/// Pending jobs and jobs whose processing lock has expired are eligible.
/// The claim and the lock write are one statement, so two workers cannot
/// claim the same job.
pub async fn claim_next(
    db: &Database,
    queue_name: &str,
) -> Result<Option<JobEntry>, FerrybotError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "UPDATE jobs SET
                         status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = (
                         SELECT id FROM jobs
                         WHERE queue_name = ?1
                           AND (status = 'pending'
                                OR (status = 'processing'
                                    AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                         ORDER BY id
                         LIMIT 1
                     )
                     RETURNING {JOB_COLUMNS}"
                ),
                params![queue_name],
                row_to_job,
            );
            match result {
                Ok(job) => Ok(Some(job)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a claimed job as completed.
pub async fn complete(db: &Database, id: i64) -> Result<(), FerrybotError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE jobs SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record a failed attempt.
///
/// Returns the job to "pending" for retry, or parks it as "failed" once
/// attempts reach max_attempts.
pub async fn fail(db: &Database, id: i64) -> Result<(), FerrybotError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE jobs SET
                     attempts = attempts + 1,
                     status = CASE
                         WHEN attempts + 1 >= max_attempts THEN 'failed'
                         ELSE 'pending'
                     END,
                     locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn enqueue_claim_complete_lifecycle() {
        let (db, _dir) = setup_db().await;
        let id = enqueue(&db, "desk_sync", r#"{"msg":"hello"}"#).await.unwrap();
        assert!(id > 0);

        let job = claim_next(&db, "desk_sync").await.unwrap().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status, "processing");
        assert!(job.locked_until.is_some());

        // Nothing else claimable while locked.
        assert!(claim_next(&db, "desk_sync").await.unwrap().is_none());

        complete(&db, id).await.unwrap();
        assert!(claim_next(&db, "desk_sync").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queues_are_independent() {
        let (db, _dir) = setup_db().await;
        enqueue(&db, "desk_sync", "a").await.unwrap();
        assert!(claim_next(&db, "webhook").await.unwrap().is_none());
        assert!(claim_next(&db, "desk_sync").await.unwrap().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_retries_until_max_attempts() {
        let (db, _dir) = setup_db().await;
        let id = enqueue(&db, "webhook", "p").await.unwrap();

        for _ in 0..2 {
            let job = claim_next(&db, "webhook").await.unwrap().unwrap();
            assert_eq!(job.id, id);
            fail(&db, id).await.unwrap();
        }

        // Third failure parks the job.
        let job = claim_next(&db, "webhook").await.unwrap().unwrap();
        assert_eq!(job.attempts, 2);
        fail(&db, id).await.unwrap();
        assert!(claim_next(&db, "webhook").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
