//! Book repository.
//!
//! Catalog search and metadata enrichment belong to the external search
//! collaborator; the chat core needs books only as chat room keys.

use super::DbPool;
use crate::{ReadRoomError, Result};

/// Book entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Book {
    /// Book ID, also the chat room key.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// New book for creation.
#[derive(Debug, Clone)]
pub struct NewBook {
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
}

impl NewBook {
    /// Create a new book record.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

/// Repository for book operations.
pub struct BookRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new book.
    pub async fn create(&self, new_book: &NewBook) -> Result<Book> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO books (title, author) VALUES ($1, $2) RETURNING id")
                .bind(&new_book.title)
                .bind(&new_book.author)
                .fetch_one(self.pool)
                .await
                .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ReadRoomError::NotFound("book".into()))
    }

    /// Get a book by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, title, author, created_at FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(book)
    }

    /// Check whether a book exists.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = BookRepository::new(db.pool());

        let book = repo
            .create(&NewBook::new("The Left Hand of Darkness", "Ursula K. Le Guin"))
            .await
            .unwrap();
        assert!(book.id > 0);

        let fetched = repo.get_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "The Left Hand of Darkness");
        assert_eq!(fetched.author, "Ursula K. Le Guin");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = BookRepository::new(db.pool());

        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = BookRepository::new(db.pool());

        let book = repo.create(&NewBook::new("Dune", "Frank Herbert")).await.unwrap();

        assert!(repo.exists(book.id).await.unwrap());
        assert!(!repo.exists(book.id + 1).await.unwrap());
    }
}
