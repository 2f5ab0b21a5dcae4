use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Keywords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Keywords::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Keywords::Keyword).string().not_null())
                    .col(
                        ColumnDef::new(Keywords::FirstCreatedTime)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Keywords::LastUsedTime).string().null())
                    .col(ColumnDef::new(Keywords::Source).string().null())
                    .col(ColumnDef::new(Keywords::TrendPercentage).double().null())
                    .col(ColumnDef::new(Keywords::LastUpdated).string().null())
                    .col(ColumnDef::new(Keywords::Type).string().null())
                    .col(
                        ColumnDef::new(Keywords::Ignore)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Keywords::IgnoreTime).string().null())
                    .to_owned(),
            )
            .await?;

        // The keyword text is the natural key; the unique index is what makes
        // the ON CONFLICT upsert path work.
        manager
            .create_index(
                Index::create()
                    .name("idx_keywords_keyword_unique")
                    .table(Keywords::Table)
                    .col(Keywords::Keyword)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_keywords_last_used_time")
                    .table(Keywords::Table)
                    .col(Keywords::LastUsedTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Keywords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Keywords {
    Table,
    Id,
    Keyword,
    FirstCreatedTime,
    LastUsedTime,
    Source,
    TrendPercentage,
    LastUpdated,
    Type,
    Ignore,
    IgnoreTime,
}
