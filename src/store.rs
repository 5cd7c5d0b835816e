use jiff::Timestamp;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use crate::{
    entities::{film, session, user},
    error::AppResult,
    models::{Film, FilmInput, ProfileInput, Session, User},
};

#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_films(&self) -> AppResult<Vec<Film>> {
        let rows = film::Entity::find().order_by_asc(film::Column::Id).all(&self.db).await?;
        Ok(rows.into_iter().map(Film::from).collect())
    }

    pub async fn get_film(&self, id: i32) -> AppResult<Option<Film>> {
        let row = film::Entity::find_by_id(id).one(&self.db).await?;
        Ok(row.map(Film::from))
    }

    pub async fn insert_film(&self, input: &FilmInput, created_by: &str) -> AppResult<Film> {
        let now = now_sec();
        let mut model = film::ActiveModel {
            created_by: Set(created_by.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_film_input(&mut model, input)?;

        let row = model.insert(&self.db).await?;
        tracing::info!(film_id = row.id, created_by = %created_by, "film added");
        Ok(Film::from(row))
    }

    /// `Ok(None)` when no film has this id.
    pub async fn update_film(&self, id: i32, input: &FilmInput) -> AppResult<Option<Film>> {
        let Some(row) = film::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut model = row.into_active_model();
        apply_film_input(&mut model, input)?;
        model.updated_at = Set(now_sec());

        let row = model.update(&self.db).await?;
        tracing::info!(film_id = row.id, "film updated");
        Ok(Some(Film::from(row)))
    }

    /// Returns whether a row was removed.
    pub async fn delete_film(&self, id: i32) -> AppResult<bool> {
        let res = film::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let row = user::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(row.map(User::from))
    }

    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        let row = user::Entity::find().filter(user::Column::Email.eq(email)).one(&self.db).await?;
        Ok(row)
    }

    pub async fn insert_user(&self, new: NewUser<'_>) -> AppResult<User> {
        let now = now_sec();
        let model = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(new.name.to_string()),
            email: Set(new.email.to_string()),
            email_verified: Set(false),
            password_hash: Set(Some(new.password_hash.to_string())),
            image: Set(None),
            bio: Set(None),
            instagram: Set(None),
            website: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let row = model.insert(&self.db).await?;
        tracing::info!(user_id = %row.id, "user registered");
        Ok(User::from(row))
    }

    /// `Ok(None)` when no user has this id.
    pub async fn update_user(&self, id: &str, input: &ProfileInput) -> AppResult<Option<User>> {
        let Some(row) = user::Entity::find_by_id(id.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        let email_changed = row.email != input.email;
        let mut model = row.into_active_model();
        model.name = Set(input.name.clone());
        model.email = Set(input.email.clone());
        if email_changed {
            model.email_verified = Set(false);
        }
        model.bio = Set(input.bio.clone());
        model.instagram = Set(input.instagram.clone());
        model.website = Set(input.website.clone());
        model.image = Set(input.image.clone());
        model.updated_at = Set(now_sec());

        let row = model.update(&self.db).await?;
        Ok(Some(User::from(row)))
    }

    pub async fn insert_session(&self, user_id: &str, ttl_seconds: i64) -> AppResult<Session> {
        let now = now_sec();
        let model = session::ActiveModel {
            token: Set(uuid::Uuid::new_v4().simple().to_string()),
            user_id: Set(user_id.to_string()),
            expires_at: Set(now.saturating_add(ttl_seconds)),
            created_at: Set(now),
        };
        let row = model.insert(&self.db).await?;
        Ok(Session::from(row))
    }

    /// Live session for `token`. Expired sessions are removed and reported as absent.
    pub async fn find_session(&self, token: &str) -> AppResult<Option<Session>> {
        let Some(row) = session::Entity::find_by_id(token.to_string()).one(&self.db).await? else {
            return Ok(None);
        };
        if row.expires_at <= now_sec() {
            self.delete_session(token).await?;
            return Ok(None);
        }
        Ok(Some(Session::from(row)))
    }

    pub async fn delete_session(&self, token: &str) -> AppResult<()> {
        session::Entity::delete_by_id(token.to_string()).exec(&self.db).await?;
        Ok(())
    }
}

fn apply_film_input(model: &mut film::ActiveModel, input: &FilmInput) -> AppResult<()> {
    model.title = Set(input.title.clone());
    model.url = Set(input.url.clone());
    model.description = Set(input.description.clone());
    model.thumbnail = Set(input.thumbnail.clone());
    model.published_at = Set(input.published_at.map(|d| d.to_string()));
    model.author = Set(input.author.clone());
    model.view_count = Set(input.view_count);
    model.like_count = Set(input.like_count);
    model.categories = Set(serde_json::to_string(&input.categories)?);
    Ok(())
}

impl From<film::Model> for Film {
    fn from(row: film::Model) -> Self {
        let categories = serde_json::from_str(&row.categories).unwrap_or_else(|err| {
            tracing::warn!(film_id = row.id, error = %err, "unreadable categories column");
            Vec::new()
        });
        Self {
            id: row.id,
            title: row.title,
            url: row.url,
            description: row.description,
            thumbnail: row.thumbnail,
            published_at: row.published_at.and_then(|d| d.parse().ok()),
            author: row.author,
            view_count: row.view_count,
            like_count: row.like_count,
            categories,
            created_by: row.created_by,
            created_at: from_sec(row.created_at),
            updated_at: from_sec(row.updated_at),
        }
    }
}

impl From<user::Model> for User {
    fn from(row: user::Model) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            email_verified: row.email_verified,
            image: row.image,
            bio: row.bio,
            instagram: row.instagram,
            website: row.website,
            created_at: from_sec(row.created_at),
        }
    }
}

impl From<session::Model> for Session {
    fn from(row: session::Model) -> Self {
        Self { token: row.token, user_id: row.user_id, expires_at: from_sec(row.expires_at) }
    }
}

fn now_sec() -> i64 {
    Timestamp::now().as_second()
}

fn from_sec(secs: i64) -> Timestamp {
    Timestamp::from_second(secs).unwrap_or(Timestamp::UNIX_EPOCH)
}
