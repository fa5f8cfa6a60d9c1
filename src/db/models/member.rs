use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::default_true;

/// Member document. `memberName` is unique (backed by an index created at
/// startup) and is the key that contribution records denormalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub member_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemberRequest {
    pub member_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberRequest {
    pub member_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_active_defaults_to_true() {
        let member: Member = serde_json::from_str(
            r#"{"memberName":"Asha","createdAt":"2025-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(member.active);
        assert_eq!(member.email, "");
        assert_eq!(member.phone, "");
    }

    #[test]
    fn member_serializes_camel_case() {
        let member = Member {
            id: None,
            member_name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: String::new(),
            active: true,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["memberName"], "Asha");
        assert!(json.get("_id").is_none());
    }
}
