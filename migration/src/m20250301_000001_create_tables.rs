use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(string(User::Id).primary_key())
                    .col(string(User::Name))
                    .col(string_uniq(User::Email))
                    .col(boolean(User::EmailVerified).default(false))
                    .col(string_null(User::PasswordHash))
                    .col(string_null(User::Image))
                    .col(text_null(User::Bio))
                    .col(string_null(User::Instagram))
                    .col(string_null(User::Website))
                    .col(big_integer(User::CreatedAt))
                    .col(big_integer(User::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Session::Table)
                    .if_not_exists()
                    .col(string(Session::Token).primary_key())
                    .col(string(Session::UserId))
                    .col(big_integer(Session::ExpiresAt))
                    .col(big_integer(Session::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_user")
                            .from(Session::Table, Session::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_session_user_id")
                    .table(Session::Table)
                    .col(Session::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string(Films::Title))
                    .col(string(Films::Url))
                    .col(text_null(Films::Description))
                    .col(string_null(Films::Thumbnail))
                    .col(string_null(Films::PublishedAt))
                    .col(string_null(Films::Author))
                    .col(big_integer_null(Films::ViewCount))
                    .col(big_integer_null(Films::LikeCount))
                    .col(text(Films::Categories).default("[]"))
                    .col(string(Films::CreatedBy))
                    .col(big_integer(Films::CreatedAt))
                    .col(big_integer(Films::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_created_by")
                            .from(Films::Table, Films::CreatedBy)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Session::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Name,
    Email,
    EmailVerified,
    PasswordHash,
    Image,
    Bio,
    Instagram,
    Website,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Session {
    Table,
    Token,
    UserId,
    ExpiresAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Films {
    Table,
    Id,
    Title,
    Url,
    Description,
    Thumbnail,
    PublishedAt,
    Author,
    ViewCount,
    LikeCount,
    Categories,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
