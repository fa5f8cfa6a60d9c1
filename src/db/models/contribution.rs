use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::default_true;

/// How a contribution was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContributionMethod {
    #[default]
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    Banking,
}

impl ContributionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionMethod::Cash => "Cash",
            ContributionMethod::Upi => "UPI",
            ContributionMethod::Banking => "Banking",
        }
    }
}

/// Settlement state of a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContributionStatus {
    Paid,
    Partial,
    #[default]
    Pending,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Paid => "Paid",
            ContributionStatus::Partial => "Partial",
            ContributionStatus::Pending => "Pending",
        }
    }
}

/// One member's fund obligation for a calendar month/year.
///
/// `email`, `phone` and `active` are snapshots of the member at creation
/// time and are deliberately not refreshed when the member is edited.
/// `balance` is stored as supplied by the caller; it is never recomputed
/// on updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub member_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub active: bool,
    pub target: f64,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub method: ContributionMethod,
    #[serde(default)]
    pub status: ContributionStatus,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub extra: f64,
    pub month: i32,
    pub year: i32,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContributionRequest {
    pub member_name: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub target: Option<f64>,
    pub amount_paid: Option<f64>,
    pub method: Option<ContributionMethod>,
    pub status: Option<ContributionStatus>,
    pub balance: Option<f64>,
    pub extra: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContributionRequest {
    pub member_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
    pub target: Option<f64>,
    pub amount_paid: Option<f64>,
    pub method: Option<ContributionMethod>,
    pub status: Option<ContributionStatus>,
    pub balance: Option<f64>,
    pub extra: Option<f64>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_wire_names() {
        assert_eq!(
            serde_json::to_string(&ContributionMethod::Upi).unwrap(),
            "\"UPI\""
        );
        assert_eq!(
            serde_json::from_str::<ContributionMethod>("\"Banking\"").unwrap(),
            ContributionMethod::Banking
        );
    }

    #[test]
    fn contribution_defaults() {
        let c: Contribution = serde_json::from_str(
            r#"{"memberName":"Ravi","target":300,"month":4,"year":2025,"createdAt":"2025-04-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(c.amount_paid, 0.0);
        assert_eq!(c.method, ContributionMethod::Cash);
        assert_eq!(c.status, ContributionStatus::Pending);
        assert_eq!(c.balance, 0.0);
        assert_eq!(c.extra, 0.0);
        assert!(c.active);
    }
}
