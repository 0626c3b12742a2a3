//! Postgres-backed [`EntityStore`].
//!
//! Schema lives in `migrations/`. The one-open-timer and one-active-pause rules
//! are partial unique indexes; their violations surface as
//! [`StoreError::UniqueViolation`] through `From<sqlx::Error>`.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreResult, StoreTable};
use crate::config::DatabaseConfig;
use crate::models::{Cell, Job, Operation, Part, TimeEntry, TimeEntryPause};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool sized from configuration
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            "Connected production store pool"
        );
        Ok(Self { pool })
    }

    /// Apply embedded schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }
}

fn expect_one_row(rows_affected: u64, table: StoreTable, id: Uuid) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::RowNotFound { table, id });
    }
    Ok(())
}

const OPERATION_COLUMNS: &str = "id, part_id, cell_id, operation_name, sequence, status, \
     estimated_time, actual_time, assigned_operator_id, completed_at, completion_percentage";

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT id, job_number, status, current_cell_id, due_date FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO jobs (id, job_number, status, current_cell_id, due_date) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(job.id)
        .bind(&job.job_number)
        .bind(job.status)
        .bind(job.current_cell_id)
        .bind(job.due_date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_job_progress(&self, job: &Job) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, current_cell_id = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(job.id)
        .bind(job.status)
        .bind(job.current_cell_id)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::Jobs, job.id)
    }

    async fn get_part(&self, id: Uuid) -> StoreResult<Option<Part>> {
        let part = sqlx::query_as::<_, Part>(
            "SELECT id, job_id, part_number, parent_part_id, status, current_cell_id \
             FROM parts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(part)
    }

    async fn insert_part(&self, part: &Part) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO parts (id, job_id, part_number, parent_part_id, status, current_cell_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(part.id)
        .bind(part.job_id)
        .bind(&part.part_number)
        .bind(part.parent_part_id)
        .bind(part.status)
        .bind(part.current_cell_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_part_progress(&self, part: &Part) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE parts SET status = $2, current_cell_id = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(part.id)
        .bind(part.status)
        .bind(part.current_cell_id)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::Parts, part.id)
    }

    async fn set_part_parent(&self, part_id: Uuid, parent_part_id: Option<Uuid>) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE parts SET parent_part_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(part_id)
        .bind(parent_part_id)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::Parts, part_id)
    }

    async fn list_parts_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Part>> {
        let parts = sqlx::query_as::<_, Part>(
            "SELECT id, job_id, part_number, parent_part_id, status, current_cell_id \
             FROM parts WHERE job_id = $1 ORDER BY part_number, id",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(parts)
    }

    async fn list_child_parts(&self, parent_part_id: Uuid) -> StoreResult<Vec<Part>> {
        let parts = sqlx::query_as::<_, Part>(
            "SELECT id, job_id, part_number, parent_part_id, status, current_cell_id \
             FROM parts WHERE parent_part_id = $1 ORDER BY part_number, id",
        )
        .bind(parent_part_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(parts)
    }

    async fn count_parts(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM parts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn get_operation(&self, id: Uuid) -> StoreResult<Option<Operation>> {
        let sql = format!("SELECT {OPERATION_COLUMNS} FROM operations WHERE id = $1");
        let operation = sqlx::query_as::<_, Operation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(operation)
    }

    async fn insert_operation(&self, operation: &Operation) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO operations ({OPERATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        sqlx::query(&sql)
            .bind(operation.id)
            .bind(operation.part_id)
            .bind(operation.cell_id)
            .bind(&operation.operation_name)
            .bind(operation.sequence)
            .bind(operation.status)
            .bind(operation.estimated_time)
            .bind(operation.actual_time)
            .bind(operation.assigned_operator_id)
            .bind(operation.completed_at)
            .bind(operation.completion_percentage)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_operation_progress(&self, operation: &Operation) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE operations SET status = $2, assigned_operator_id = $3, completed_at = $4, \
             completion_percentage = $5, updated_at = NOW() WHERE id = $1",
        )
        .bind(operation.id)
        .bind(operation.status)
        .bind(operation.assigned_operator_id)
        .bind(operation.completed_at)
        .bind(operation.completion_percentage)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::Operations, operation.id)
    }

    async fn mark_operation_started(&self, id: Uuid, operator_id: Uuid) -> StoreResult<Option<Operation>> {
        let sql = format!(
            "UPDATE operations SET status = 'in_progress', \
             assigned_operator_id = COALESCE(assigned_operator_id, $2), updated_at = NOW() \
             WHERE id = $1 AND status = 'not_started' RETURNING {OPERATION_COLUMNS}"
        );
        let operation = sqlx::query_as::<_, Operation>(&sql)
            .bind(id)
            .bind(operator_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(operation)
    }

    async fn add_operation_actual_time(&self, id: Uuid, minutes: i32) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE operations SET actual_time = actual_time + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(minutes)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::Operations, id)
    }

    async fn list_operations_for_part(&self, part_id: Uuid) -> StoreResult<Vec<Operation>> {
        let sql = format!(
            "SELECT {OPERATION_COLUMNS} FROM operations WHERE part_id = $1 ORDER BY sequence, id"
        );
        let operations = sqlx::query_as::<_, Operation>(&sql)
            .bind(part_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(operations)
    }

    async fn get_cell(&self, id: Uuid) -> StoreResult<Option<Cell>> {
        let cell = sqlx::query_as::<_, Cell>("SELECT id, name, sequence FROM cells WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cell)
    }

    async fn insert_cell(&self, cell: &Cell) -> StoreResult<()> {
        sqlx::query("INSERT INTO cells (id, name, sequence) VALUES ($1, $2, $3)")
            .bind(cell.id)
            .bind(&cell.name)
            .bind(cell.sequence)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_time_entry(&self, id: Uuid) -> StoreResult<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(
            "SELECT id, operation_id, operator_id, start_time, end_time, duration, is_paused \
             FROM time_entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn insert_time_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO time_entries (id, operation_id, operator_id, start_time, end_time, duration, is_paused) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(entry.operation_id)
        .bind(entry.operator_id)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.duration)
        .bind(entry.is_paused)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE time_entries SET end_time = $2, duration = $3, is_paused = $4 WHERE id = $1",
        )
        .bind(entry.id)
        .bind(entry.end_time)
        .bind(entry.duration)
        .bind(entry.is_paused)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::TimeEntries, entry.id)
    }

    async fn find_open_time_entry_for_operator(&self, operator_id: Uuid) -> StoreResult<Option<TimeEntry>> {
        let entry = sqlx::query_as::<_, TimeEntry>(
            "SELECT id, operation_id, operator_id, start_time, end_time, duration, is_paused \
             FROM time_entries WHERE operator_id = $1 AND end_time IS NULL",
        )
        .bind(operator_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list_open_time_entries_for_operation(&self, operation_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        let entries = sqlx::query_as::<_, TimeEntry>(
            "SELECT id, operation_id, operator_id, start_time, end_time, duration, is_paused \
             FROM time_entries WHERE operation_id = $1 AND end_time IS NULL ORDER BY start_time",
        )
        .bind(operation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn insert_time_entry_pause(&self, pause: &TimeEntryPause) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO time_entry_pauses (id, time_entry_id, paused_at, resumed_at, duration) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(pause.id)
        .bind(pause.time_entry_id)
        .bind(pause.paused_at)
        .bind(pause.resumed_at)
        .bind(pause.duration)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_time_entry_pause(&self, pause: &TimeEntryPause) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE time_entry_pauses SET resumed_at = $2, duration = $3 WHERE id = $1",
        )
        .bind(pause.id)
        .bind(pause.resumed_at)
        .bind(pause.duration)
        .execute(&self.pool)
        .await?;
        expect_one_row(result.rows_affected(), StoreTable::TimeEntryPauses, pause.id)
    }

    async fn find_active_pause(&self, time_entry_id: Uuid) -> StoreResult<Option<TimeEntryPause>> {
        let pause = sqlx::query_as::<_, TimeEntryPause>(
            "SELECT id, time_entry_id, paused_at, resumed_at, duration \
             FROM time_entry_pauses WHERE time_entry_id = $1 AND resumed_at IS NULL",
        )
        .bind(time_entry_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pause)
    }

    async fn list_pauses(&self, time_entry_id: Uuid) -> StoreResult<Vec<TimeEntryPause>> {
        let pauses = sqlx::query_as::<_, TimeEntryPause>(
            "SELECT id, time_entry_id, paused_at, resumed_at, duration \
             FROM time_entry_pauses WHERE time_entry_id = $1 ORDER BY paused_at",
        )
        .bind(time_entry_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pauses)
    }
}
