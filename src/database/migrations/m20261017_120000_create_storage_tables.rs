use sea_orm_migration::{
    prelude::*,
    schema::{string, text},
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Hash fields, one row per (key, field)
        manager
            .create_table(
                Table::create()
                    .table(StorageHash::Table)
                    .if_not_exists()
                    .col(string(StorageHash::Key))
                    .col(string(StorageHash::Field))
                    .col(text(StorageHash::Value))
                    .primary_key(
                        Index::create()
                            .col(StorageHash::Key)
                            .col(StorageHash::Field),
                    )
                    .to_owned(),
            )
            .await?;

        // Set members, one row per (key, value)
        manager
            .create_table(
                Table::create()
                    .table(StorageSet::Table)
                    .if_not_exists()
                    .col(string(StorageSet::Key))
                    .col(string(StorageSet::Value))
                    .primary_key(Index::create().col(StorageSet::Key).col(StorageSet::Value))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StorageSet::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(StorageHash::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StorageHash {
    Table,
    Key,
    Field,
    Value,
}

#[derive(DeriveIden)]
enum StorageSet {
    Table,
    Key,
    Value,
}
