use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_auto(Categories::Id))
                    .col(string_len_uniq(Categories::Name, 100))
                    .col(string_len_null(Categories::Description, 500))
                    .col(string_len_null(Categories::ImageUrl, 200))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(pk_auto(Books::Id))
                    .col(string_len(Books::Title, 200))
                    .col(string_len(Books::Author, 100))
                    .col(string_len_null(Books::Description, 1000))
                    .col(decimal_len(Books::Price, 18, 2))
                    .col(integer(Books::CategoryId))
                    .col(string_len_null(Books::ImageUrl, 200))
                    .col(
                        timestamp_with_time_zone(Books::CreatedDate)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_books_category")
                            .from(Books::Table, Books::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_books_category_id")
                    .table(Books::Table)
                    .col(Books::CategoryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Categories {
    Table,
    Id,
    Name,
    Description,
    ImageUrl,
}

#[derive(DeriveIden)]
pub enum Books {
    Table,
    Id,
    Title,
    Author,
    Description,
    Price,
    CategoryId,
    ImageUrl,
    CreatedDate,
}
