use sqlx::{
    migrate::MigrateDatabase, query, query_as, sqlite::SqlitePoolOptions, Sqlite, SqlitePool,
};

use crate::{
    error::{AppError, AppResult},
    model::{Todo, User},
    schema::TodoSchema,
};

const TODO_COLUMNS: &str = "id, title, description, priority, complete, owner_id";
const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, hashed_password, is_active, role";

/// Fields of a user row that registration supplies.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub hashed_password: &'a str,
    pub role: &'a str,
}

/// Open a pool, creating the database first if it does not exist.
/// An in-memory database lives only as long as its connection, so it is
/// pinned to a single connection that is never recycled.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        tracing::info!(url, "creating database");
        Sqlite::create_database(url).await?;
    }

    let options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections)
    };

    options.connect(url).await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    query(
        r#"CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        hashed_password TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        role TEXT NOT NULL DEFAULT 'user'
    );"#,
    )
    .execute(pool)
    .await?;

    query(
        r#"CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        priority INTEGER NOT NULL,
        complete BOOLEAN NOT NULL DEFAULT 0,
        owner_id INTEGER NOT NULL REFERENCES users(id)
    );"#,
    )
    .execute(pool)
    .await?;

    query("CREATE INDEX IF NOT EXISTS todos_owner_idx ON todos (owner_id)")
        .execute(pool)
        .await?;

    Ok(())
}

// ---- users ----

pub async fn find_user_by_username(pool: &SqlitePool, username: &str) -> AppResult<Option<User>> {
    let user = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn username_or_email_taken(
    pool: &SqlitePool,
    username: &str,
    email: &str,
) -> AppResult<bool> {
    let (count,): (i64,) =
        query_as("SELECT COUNT(*) FROM users WHERE username = ? OR email = ?")
            .bind(username)
            .bind(email)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Insert a new active user. A uniqueness violation surfaces as `Conflict`,
/// which covers a concurrent registration slipping past the pre-check.
pub async fn insert_user(pool: &SqlitePool, user: NewUser<'_>) -> AppResult<User> {
    let result = query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, first_name, last_name, hashed_password, is_active, role) \
         VALUES (?, ?, ?, ?, ?, 1, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(user.username)
    .bind(user.email)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.hashed_password)
    .bind(user.role)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
            "Username or email already exists".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn update_password(pool: &SqlitePool, user_id: i64, hashed_password: &str) -> AppResult<()> {
    query("UPDATE users SET hashed_password = ? WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---- todos ----
//
// Every statement below filters on owner_id; no todo query takes an id alone.

pub async fn list_todos(pool: &SqlitePool, owner_id: i64) -> AppResult<Vec<Todo>> {
    let todos = query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE owner_id = ? ORDER BY id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(todos)
}

/// The ownership guard: the todo `id` if and only if `owner_id` owns it.
/// A row owned by someone else is reported exactly like a missing row.
pub async fn find_owned(pool: &SqlitePool, id: i64, owner_id: i64) -> AppResult<Todo> {
    query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE id = ? AND owner_id = ?"
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::todo_not_found(id))
}

pub async fn insert_todo(pool: &SqlitePool, owner_id: i64, todo: &TodoSchema) -> AppResult<Todo> {
    let todo = query_as::<_, Todo>(&format!(
        "INSERT INTO todos (title, description, priority, complete, owner_id) \
         VALUES (?, ?, ?, ?, ?) RETURNING {TODO_COLUMNS}"
    ))
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(todo.priority)
    .bind(todo.complete)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(todo)
}

pub async fn update_owned(
    pool: &SqlitePool,
    id: i64,
    owner_id: i64,
    todo: &TodoSchema,
) -> AppResult<Todo> {
    find_owned(pool, id, owner_id).await?;

    query_as::<_, Todo>(&format!(
        "UPDATE todos SET title = ?, description = ?, priority = ?, complete = ? \
         WHERE id = ? AND owner_id = ? RETURNING {TODO_COLUMNS}"
    ))
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(todo.priority)
    .bind(todo.complete)
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::todo_not_found(id))
}

pub async fn delete_owned(pool: &SqlitePool, id: i64, owner_id: i64) -> AppResult<()> {
    find_owned(pool, id, owner_id).await?;

    let rows_affected = query("DELETE FROM todos WHERE id = ? AND owner_id = ?")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::todo_not_found(id));
    }
    Ok(())
}
