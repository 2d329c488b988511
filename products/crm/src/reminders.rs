//! One pass of the task reminder worker. The server owns the loop.

use sea_orm::DatabaseConnection;
use sea_orm::prelude::DateTimeWithTimeZone;
use tracing::info;

use crate::error::CrmResult;
use crate::repo;

pub const BATCH_SIZE: u64 = 100;

/// Marks every due reminder as sent and returns how many were claimed.
pub async fn run_reminder_pass(
    db: &DatabaseConnection,
    now: DateTimeWithTimeZone,
) -> CrmResult<usize> {
    let due = repo::tasks::due_reminders(db, now, BATCH_SIZE).await?;
    let mut sent = 0;
    for task in due {
        if !repo::tasks::mark_reminded(db, task.id, now).await? {
            continue;
        }
        info!(
            task_id = %task.id,
            user_id = %task.user_id,
            title = %task.title,
            reminder_at = ?task.reminder_at,
            "task reminder due"
        );
        sent += 1;
    }
    Ok(sent)
}
