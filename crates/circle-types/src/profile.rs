use serde::{Deserialize, Serialize};

use crate::User;
use crate::null_as_default;

/// Public profile attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user: User,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Editable profile fields. `None` leaves the field as the form default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<String>,
}

impl ProfileUpdate {
    /// Form fields in submission order. Absent values are sent as empty strings.
    pub fn form_fields(&self) -> [(&'static str, String); 5] {
        let value = |field: &Option<String>| field.clone().unwrap_or_default();
        [
            ("first_name", value(&self.first_name)),
            ("last_name", value(&self.last_name)),
            ("bio", value(&self.bio)),
            ("location", value(&self.location)),
            ("birth_date", value(&self.birth_date)),
        ]
    }

    /// Fills unset fields from the current profile so a partial edit keeps
    /// existing values.
    #[must_use]
    pub fn merged_with(mut self, current: &Profile) -> Self {
        self.first_name
            .get_or_insert_with(|| current.user.first_name.clone());
        self.last_name
            .get_or_insert_with(|| current.user.last_name.clone());
        self.bio.get_or_insert_with(|| current.bio.clone());
        self.location.get_or_insert_with(|| current.location.clone());
        if self.birth_date.is_none() {
            self.birth_date.clone_from(&current.birth_date);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        serde_json::from_str(
            r#"{
                "user": {"id": 4, "username": "jane", "first_name": "Jane", "last_name": "Roe"},
                "bio": null,
                "location": "Lisbon",
                "birth_date": "1990-05-01",
                "avatar": null
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_profile_null_bio_decodes_empty() {
        let p = profile();
        assert_eq!(p.bio, "");
        assert_eq!(p.location, "Lisbon");
        assert!(p.avatar.is_none());
    }

    #[test]
    fn test_form_fields_send_empty_for_absent() {
        let update = ProfileUpdate {
            bio: Some("hello".to_string()),
            ..ProfileUpdate::default()
        };
        let fields = update.form_fields();
        assert_eq!(fields[0], ("first_name", String::new()));
        assert_eq!(fields[2], ("bio", "hello".to_string()));
    }

    #[test]
    fn test_merged_with_keeps_current_values() {
        let update = ProfileUpdate {
            bio: Some("new bio".to_string()),
            ..ProfileUpdate::default()
        }
        .merged_with(&profile());
        assert_eq!(update.first_name.as_deref(), Some("Jane"));
        assert_eq!(update.bio.as_deref(), Some("new bio"));
        assert_eq!(update.location.as_deref(), Some("Lisbon"));
        assert_eq!(update.birth_date.as_deref(), Some("1990-05-01"));
    }
}
