use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }

    fn parse(s: &str) -> Theme {
        match s {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            _ => Theme::Auto,
        }
    }
}

/// Per-user preferences. Rows are created lazily; a user who never saved
/// anything gets the defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Auto,
            is_anonymous: false,
            updated_at: None,
        }
    }
}

/// Partial update; absent fields keep their stored value. Unknown fields
/// are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub is_anonymous: Option<bool>,
}

pub fn get(pool: &DbPool, user_id: &str) -> ApiResult<UserSettings> {
    let conn = pool.get()?;
    let result = conn.query_row(
        "SELECT theme, is_anonymous, updated_at FROM user_settings WHERE user_id = ?1",
        params![user_id],
        |row| {
            let theme: String = row.get(0)?;
            Ok(UserSettings {
                theme: Theme::parse(&theme),
                is_anonymous: row.get(1)?,
                updated_at: Some(row.get(2)?),
            })
        },
    );
    match result {
        Ok(settings) => Ok(settings),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(UserSettings::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn update(
    pool: &DbPool,
    user_id: &str,
    patch: &SettingsPatch,
    now: &str,
) -> ApiResult<UserSettings> {
    let mut settings = get(pool, user_id)?;
    if let Some(theme) = patch.theme {
        settings.theme = theme;
    }
    if let Some(is_anonymous) = patch.is_anonymous {
        settings.is_anonymous = is_anonymous;
    }
    settings.updated_at = Some(now.to_string());

    store(pool, user_id, &settings)?;
    Ok(settings)
}

pub fn reset(pool: &DbPool, user_id: &str, now: &str) -> ApiResult<UserSettings> {
    let settings = UserSettings {
        updated_at: Some(now.to_string()),
        ..UserSettings::default()
    };
    store(pool, user_id, &settings)?;
    Ok(settings)
}

fn store(pool: &DbPool, user_id: &str, settings: &UserSettings) -> ApiResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO user_settings (user_id, theme, is_anonymous, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id) DO UPDATE SET
           theme = excluded.theme,
           is_anonymous = excluded.is_anonymous,
           updated_at = excluded.updated_at",
        params![
            user_id,
            settings.theme.as_str(),
            settings.is_anonymous,
            settings.updated_at,
        ],
    )?;
    Ok(())
}
