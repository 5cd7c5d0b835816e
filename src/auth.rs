//! Email/password accounts and cookie sessions.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum_extra::extract::cookie::CookieJar;
use cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::{
    config::Config,
    error::{AppError, AppResult, FieldErrors},
    ingest::is_http_url,
    models::{ProfileInput, Session},
    store::Store,
};

pub const SESSION_COOKIE: &str = "session_token";
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password, `Err` only for a malformed stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn session_cookie(token: String, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(ttl_days))
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// The session carried by the request cookies, if it is still live.
pub async fn current_session(store: &Store, jar: &CookieJar) -> AppResult<Option<Session>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    store.find_session(cookie.value()).await
}

pub async fn require_session(store: &Store, jar: &CookieJar) -> AppResult<Session> {
    current_session(store, jar).await?.ok_or(AppError::Unauthorized)
}

pub async fn require_admin(store: &Store, jar: &CookieJar, config: &Config) -> AppResult<Session> {
    let session = require_session(store, jar).await?;
    if !config.is_admin(&session.user_id) {
        tracing::warn!(user_id = %session.user_id, "non-admin attempted a privileged action");
        return Err(AppError::Forbidden);
    }
    Ok(session)
}

#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    pub fn validate(self) -> AppResult<SignUpForm> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        if !looks_like_email(&email) {
            errors.add("email", "Please enter a valid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
            );
        }

        errors.finish(SignUpForm { name, email, password: self.password })
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
}

impl ProfileForm {
    pub fn validate(self) -> AppResult<ProfileInput> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        if !looks_like_email(&email) {
            errors.add("email", "Please enter a valid email address");
        }

        let mut optional_url = |field: &str, value: Option<String>| {
            let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
            if value.as_deref().is_some_and(|v| !is_http_url(v)) {
                errors.add(field, "Please enter a valid URL");
            }
            value
        };
        let instagram = optional_url("instagram", self.instagram);
        let website = optional_url("website", self.website);
        let image = optional_url("image", self.image);

        let bio = self.bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());

        errors.finish(ProfileInput { name, email, bio, instagram, website, image })
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong-horse", &hash).unwrap());
    }

    #[test]
    fn sign_up_rules() {
        let form = SignUpForm {
            name: "  ".into(),
            email: "nobody".into(),
            password: "short".into(),
        };
        let Err(AppError::Validation(errors)) = form.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert_eq!(errors.get("password").unwrap()[0], "Password must be at least 8 characters long");

        let ok = SignUpForm {
            name: " Rider ".into(),
            email: " Rider@Example.com".into(),
            password: "long-enough".into(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.name, "Rider");
        assert_eq!(ok.email, "rider@example.com");
    }

    #[test]
    fn profile_blank_links_become_none() {
        let input = ProfileForm {
            name: "Rider".into(),
            email: "rider@example.com".into(),
            bio: Some("  ".into()),
            instagram: Some("".into()),
            website: Some("https://rider.test".into()),
            image: None,
        }
        .validate()
        .unwrap();

        assert_eq!(input.bio, None);
        assert_eq!(input.instagram, None);
        assert_eq!(input.website.as_deref(), Some("https://rider.test"));
    }

    #[test]
    fn profile_rejects_bad_links() {
        let form = ProfileForm {
            name: "Rider".into(),
            email: "rider@example.com".into(),
            website: Some("javascript:alert(1)".into()),
            ..Default::default()
        };
        let Err(AppError::Validation(errors)) = form.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("website").is_some());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie("abc".into(), 30);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
