pub use sea_orm_migration::prelude::*;

mod m20250301_000001_identity;
mod m20250301_000002_accounts;
mod m20250301_000003_pipeline;
mod m20250301_000004_work_items;
mod m20250301_000005_email_sequences;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_identity::Migration),
            Box::new(m20250301_000002_accounts::Migration),
            Box::new(m20250301_000003_pipeline::Migration),
            Box::new(m20250301_000004_work_items::Migration),
            Box::new(m20250301_000005_email_sequences::Migration),
        ]
    }
}

/// Single-column, non-unique index. Works on both Postgres and SQLite.
pub(crate) async fn create_index<T, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    table: T,
    column: C,
) -> Result<(), DbErr>
where
    T: IntoTableRef,
    C: IntoIndexColumn,
{
    manager
        .create_index(
            Index::create()
                .if_not_exists()
                .name(name)
                .table(table)
                .col(column)
                .to_owned(),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    #[tokio::test]
    async fn migrations_apply_and_roll_back_on_sqlite() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let manager = SchemaManager::new(&db);
        for table in ["users", "orgs", "pipelines", "deal_stages", "deals", "deal_stage_changes"] {
            assert!(manager.has_table(table).await.unwrap(), "missing {table}");
        }
        Migrator::down(&db, None).await.unwrap();
        assert!(!manager.has_table("deals").await.unwrap());
    }
}
