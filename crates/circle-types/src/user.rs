use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// An account as serialized by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_joined: Option<String>,
}

impl User {
    /// "First Last", or the username when no name is set.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_username() {
        let user: User = serde_json::from_str(
            r#"{"id": 3, "username": "jdoe", "first_name": null, "last_name": ""}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), "jdoe");
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_display_name_joins_names() {
        let user = User {
            id: 1,
            username: "jdoe".to_string(),
            email: String::new(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            date_joined: None,
        };
        assert_eq!(user.display_name(), "John Doe");
    }
}
