//! Database repository for user and audio file operations.
//!
//! Uses prepared statements; multi-row deletes run in a transaction.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{AudioFile, NewUser, User};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, yandex_id, email, username, is_active, is_superuser, created_at FROM users WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get a user by their Yandex identity.
    pub async fn get_user_by_yandex_id(&self, yandex_id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, yandex_id, email, username, is_active, is_superuser, created_at FROM users WHERE yandex_id = ?"
        )
        .bind(yandex_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Create a user from OAuth profile data.
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, yandex_id, email, username, is_active, is_superuser, created_at) VALUES (?, ?, ?, ?, 1, ?, ?)"
        )
        .bind(&id)
        .bind(&new_user.yandex_id)
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(new_user.is_superuser as i32)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            yandex_id: new_user.yandex_id.clone(),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            is_active: true,
            is_superuser: new_user.is_superuser,
            created_at: now,
        })
    }

    /// Update a user's display name.
    pub async fn update_username(&self, id: &str, username: &str) -> Result<User, AppError> {
        let result = sqlx::query("UPDATE users SET username = ? WHERE id = ?")
            .bind(username)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Delete a user together with their audio file rows.
    ///
    /// Returns the orphaned on-disk paths so the caller can remove the
    /// content.
    pub async fn delete_user(&self, id: &str) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query("SELECT file_path FROM audio_files WHERE owner_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let paths = rows
            .into_iter()
            .map(|row| row.get::<String, _>("file_path"))
            .collect();

        sqlx::query("DELETE FROM audio_files WHERE owner_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        tx.commit().await?;
        Ok(paths)
    }

    // ==================== AUDIO FILE OPERATIONS ====================

    /// Insert an audio file metadata record.
    pub async fn create_audio_file(
        &self,
        id: &str,
        filename: &str,
        file_path: &str,
        owner_id: &str,
    ) -> Result<AudioFile, AppError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO audio_files (id, filename, file_path, owner_id, created_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(id)
        .bind(filename)
        .bind(file_path)
        .bind(owner_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(AudioFile {
            id: id.to_string(),
            filename: filename.to_string(),
            file_path: file_path.to_string(),
            owner_id: owner_id.to_string(),
            created_at: now,
        })
    }

    /// List audio files owned by a user, newest first.
    pub async fn list_audio_files(&self, owner_id: &str) -> Result<Vec<AudioFile>, AppError> {
        let rows = sqlx::query(
            "SELECT id, filename, file_path, owner_id, created_at FROM audio_files WHERE owner_id = ? ORDER BY created_at DESC"
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(audio_file_from_row).collect())
    }

}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        yandex_id: row.get("yandex_id"),
        email: row.get("email"),
        username: row.get("username"),
        is_active: row.get::<i32, _>("is_active") != 0,
        is_superuser: row.get::<i32, _>("is_superuser") != 0,
        created_at: row.get("created_at"),
    }
}

fn audio_file_from_row(row: &sqlx::sqlite::SqliteRow) -> AudioFile {
    AudioFile {
        id: row.get("id"),
        filename: row.get("filename"),
        file_path: row.get("file_path"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
    }
}
