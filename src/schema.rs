use serde::Deserialize;
use validator::Validate;

// Request body for creating or replacing a Todo. The owner comes from the
// session, never from the body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TodoSchema {
    #[validate(length(min = 3, message = "title must be at least 3 characters"))]
    pub title: String,
    #[validate(length(
        min = 3,
        max = 100,
        message = "description must be between 3 and 100 characters"
    ))]
    pub description: String,
    #[validate(range(min = 1, max = 5, message = "priority must be between 1 and 5"))]
    pub priority: i64,
    pub complete: bool,
}

pub type CreateTodoSchema = TodoSchema;
pub type UpdateTodoSchema = TodoSchema;

#[derive(Debug, Deserialize)]
pub struct LoginSchema {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterSchema {
    pub email: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
    pub password2: String,
}

// `password` is the current password, `password2` the replacement.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordSchema {
    pub username: String,
    pub password: String,
    pub password2: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::field_messages;

    fn todo(title: &str, description: &str, priority: i64) -> TodoSchema {
        TodoSchema {
            title: title.to_string(),
            description: description.to_string(),
            priority,
            complete: false,
        }
    }

    #[test]
    fn test_title_length() {
        assert!(todo("ab", "valid description", 3).validate().is_err());
        assert!(todo("abc", "valid description", 3).validate().is_ok());
    }

    #[test]
    fn test_priority_bounds() {
        assert!(todo("title", "valid description", 0).validate().is_err());
        assert!(todo("title", "valid description", 6).validate().is_err());
        assert!(todo("title", "valid description", 1).validate().is_ok());
        assert!(todo("title", "valid description", 5).validate().is_ok());
    }

    #[test]
    fn test_description_bounds() {
        assert!(todo("title", "ab", 3).validate().is_err());
        assert!(todo("title", &"x".repeat(100), 3).validate().is_ok());
        assert!(todo("title", &"x".repeat(101), 3).validate().is_err());
    }

    #[test]
    fn test_errors_reported_per_field() {
        let errors = todo("ok", "ok", 9).validate().unwrap_err();
        let messages = field_messages(&errors);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages["title"], vec!["title must be at least 3 characters"]);
        assert_eq!(messages["priority"], vec!["priority must be between 1 and 5"]);
        assert!(messages.contains_key("description"));
    }

    #[test]
    fn test_complete_is_required() {
        let body = r#"{"title":"title","description":"description","priority":3}"#;
        assert!(serde_json::from_str::<TodoSchema>(body).is_err());
    }
}
