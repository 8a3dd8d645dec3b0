use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Movie {
    pub id: i64,
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub director: String,
    pub description: String,
}

/// A movie about to be persisted; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub director: String,
    pub description: String,
}
