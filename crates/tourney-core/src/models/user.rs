use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user's account, as returned by `/users/profile/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub num_whatsapp: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.username, self.email)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_whatsapp: Option<String>,
}

/// Partial profile update; unset fields are left unchanged by the server
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_whatsapp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile() {
        let json = r#"{
            "id": 3,
            "username": "ana",
            "email": "ana@example.com",
            "avatar": null,
            "num_whatsapp": "+34600000000",
            "is_verified": true,
            "date_joined": "2024-05-01T10:15:30.123456Z"
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id, 3);
        assert!(profile.is_verified);
        assert_eq!(profile.display_name(), "ana <ana@example.com>");
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            num_whatsapp: Some("123".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"num_whatsapp":"123"}"#);
    }
}
