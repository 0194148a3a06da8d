use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{
    sea_query::OnConflict, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::trace;

use crate::database::models::{hash_entry, set_entry};

use super::{StorageError, WriteCommand};

pub(super) async fn hash_entries(
    db: &DatabaseConnection,
    key: &str,
) -> Result<BTreeMap<String, String>, StorageError> {
    let entries = hash_entry::Entity::find()
        .filter(hash_entry::Column::Key.eq(key))
        .all(db)
        .await?;

    Ok(entries
        .into_iter()
        .map(|entry| (entry.field, entry.value))
        .collect())
}

pub(super) async fn set_members(
    db: &DatabaseConnection,
    key: &str,
) -> Result<BTreeSet<String>, StorageError> {
    let members = set_entry::Entity::find()
        .filter(set_entry::Column::Key.eq(key))
        .all(db)
        .await?;

    Ok(members.into_iter().map(|member| member.value).collect())
}

/// Applies all commands inside one database transaction.
///
/// If any command fails the transaction is dropped uncommitted, which rolls it back.
pub(super) async fn apply(
    db: &DatabaseConnection,
    commands: Vec<WriteCommand>,
) -> Result<(), StorageError> {
    let txn = db.begin().await?;

    for command in commands {
        apply_command(&txn, command).await?;
    }

    txn.commit().await?;
    Ok(())
}

async fn apply_command(txn: &DatabaseTransaction, command: WriteCommand) -> Result<(), StorageError> {
    match command {
        WriteCommand::AddToSet { key, value } => {
            trace!("SADD {} {}", key, value);
            set_entry::Entity::insert(set_entry::ActiveModel {
                key: Set(key),
                value: Set(value),
            })
            .on_conflict(
                OnConflict::columns([set_entry::Column::Key, set_entry::Column::Value])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(txn)
            .await?;
        }
        WriteCommand::RemoveFromSet { key, value } => {
            trace!("SREM {} {}", key, value);
            set_entry::Entity::delete_many()
                .filter(set_entry::Column::Key.eq(key))
                .filter(set_entry::Column::Value.eq(value))
                .exec(txn)
                .await?;
        }
        WriteCommand::SetRangeInHash { key, entries } => {
            trace!("HSET {} ({} field(s))", key, entries.len());
            for (field, value) in entries {
                hash_entry::Entity::insert(hash_entry::ActiveModel {
                    key: Set(key.clone()),
                    field: Set(field),
                    value: Set(value),
                })
                .on_conflict(
                    OnConflict::columns([hash_entry::Column::Key, hash_entry::Column::Field])
                        .update_column(hash_entry::Column::Value)
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{storage::Storage, tests::setup_test::setup_sqlite_storage};

    #[tokio::test]
    async fn test_set_membership_round_trips_through_tables() {
        let storage = setup_sqlite_storage().await;

        let mut transaction = storage.write_transaction();
        transaction
            .add_to_set("pause-state:nightly", "true")
            .add_to_set("pause-state:nightly", "true");
        transaction.commit().await.unwrap();

        let members = storage.set_members("pause-state:nightly").await.unwrap();
        assert_eq!(members.len(), 1);
        assert!(members.contains("true"));

        let mut transaction = storage.write_transaction();
        transaction
            .remove_from_set("pause-state:nightly", "true")
            .add_to_set("pause-state:nightly", "false");
        transaction.commit().await.unwrap();

        let members = storage.set_members("pause-state:nightly").await.unwrap();
        assert_eq!(members.into_iter().collect::<Vec<_>>(), vec!["false"]);
    }

    #[tokio::test]
    async fn test_hash_fields_are_upserted() {
        let storage = setup_sqlite_storage().await;

        let mut transaction = storage.write_transaction();
        transaction.set_range_in_hash("recurring-job:nightly", [("Cron", "0 0 * * *"), ("Queue", "default")]);
        transaction.commit().await.unwrap();

        let mut transaction = storage.write_transaction();
        transaction.set_range_in_hash("recurring-job:nightly", [("Cron", "*/5 * * * *")]);
        transaction.commit().await.unwrap();

        let entries = storage.hash_entries("recurring-job:nightly").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("Cron").map(String::as_str), Some("*/5 * * * *"));
        assert_eq!(entries.get("Queue").map(String::as_str), Some("default"));
    }

    #[tokio::test]
    async fn test_ping_succeeds_on_live_connection() {
        let storage = setup_sqlite_storage().await;

        assert!(matches!(storage, Storage::Database(_)));
        assert!(storage.ping().await.is_ok());
    }
}
