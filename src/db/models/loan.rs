//! Loan and installment models.
//!
//! Installments are embedded sub-documents owned by their loan; they have no
//! independent identity. All repayment accounting lives in
//! [`Loan::apply_installment`] so the arithmetic can be tested without a
//! database.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoanStatus {
    #[default]
    Active,
    Completed,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepaymentMode {
    #[default]
    #[serde(rename = "Calculated EMI")]
    CalculatedEmi,
    #[serde(rename = "Fixed Payment")]
    FixedPayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InstallmentMethod {
    #[default]
    Cash,
    Online,
    Bank,
    Other,
}

/// One recorded payment against a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub date: String,
    pub amount: f64,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub payment_method: InstallmentMethod,
    #[serde(default)]
    pub notes: String,
}

/// Loan document with its embedded, append-only installment history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub member_id: ObjectId,
    pub member_name: String,
    pub loan_amount: f64,
    pub interest_rate: f64,
    #[serde(default)]
    pub total_interest: f64,
    pub total_repayment: f64,
    pub tenure: i32,
    pub loan_start_date: String,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub repayment_mode: RepaymentMode,
    #[serde(rename = "monthlyEMI", default)]
    pub monthly_emi: f64,
    #[serde(default)]
    pub fixed_monthly_payment: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub amount_paid: f64,
    pub remaining_due: f64,
    #[serde(default)]
    pub installments: Vec<Installment>,
    pub created_at: String,
    pub updated_at: String,
}

impl Loan {
    /// Append a payment and bring the repayment totals back in line.
    ///
    /// Invariant: `remainingDue = totalRepayment - amountPaid`, clamped at
    /// zero. Hitting zero flips the loan to Completed; anything outstanding
    /// keeps (or returns) it to Active, even if it was Pending or Cancelled
    /// before.
    pub fn apply_installment(&mut self, installment: Installment) {
        self.amount_paid += installment.amount;
        self.installments.push(installment);
        self.remaining_due = self.total_repayment - self.amount_paid;
        if self.remaining_due <= 0.0 {
            self.remaining_due = 0.0;
            self.status = LoanStatus::Completed;
        } else {
            self.status = LoanStatus::Active;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub member_id: Option<String>,
    pub member_name: Option<String>,
    pub loan_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub total_interest: Option<f64>,
    pub total_repayment: Option<f64>,
    pub tenure: Option<i32>,
    pub loan_start_date: Option<String>,
    pub status: Option<LoanStatus>,
    pub repayment_mode: Option<RepaymentMode>,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: Option<f64>,
    pub fixed_monthly_payment: Option<f64>,
    pub notes: Option<String>,
    pub remaining_due: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoanRequest {
    pub member_name: Option<String>,
    pub loan_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub total_interest: Option<f64>,
    pub total_repayment: Option<f64>,
    pub tenure: Option<i32>,
    pub loan_start_date: Option<String>,
    pub status: Option<LoanStatus>,
    pub repayment_mode: Option<RepaymentMode>,
    #[serde(rename = "monthlyEMI")]
    pub monthly_emi: Option<f64>,
    pub fixed_monthly_payment: Option<f64>,
    pub notes: Option<String>,
    pub amount_paid: Option<f64>,
    pub remaining_due: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddInstallmentRequest {
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub receipt_number: Option<String>,
    pub payment_method: Option<InstallmentMethod>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loan(total_repayment: f64) -> Loan {
        Loan {
            id: None,
            member_id: ObjectId::new(),
            member_name: "Ravi".to_string(),
            loan_amount: total_repayment,
            interest_rate: 0.0,
            total_interest: 0.0,
            total_repayment,
            tenure: 10,
            loan_start_date: "2025-01-01T00:00:00Z".to_string(),
            status: LoanStatus::Active,
            repayment_mode: RepaymentMode::CalculatedEmi,
            monthly_emi: 0.0,
            fixed_monthly_payment: 0.0,
            notes: String::new(),
            amount_paid: 0.0,
            remaining_due: total_repayment,
            installments: Vec::new(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    fn installment(amount: f64) -> Installment {
        Installment {
            date: "2025-02-01T00:00:00Z".to_string(),
            amount,
            receipt_number: None,
            payment_method: InstallmentMethod::Cash,
            notes: String::new(),
        }
    }

    #[test]
    fn partial_payment_keeps_loan_active() {
        let mut loan = loan(1000.0);
        loan.apply_installment(installment(400.0));
        assert_eq!(loan.amount_paid, 400.0);
        assert_eq!(loan.remaining_due, 600.0);
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.installments.len(), 1);
    }

    #[test]
    fn overpayment_clamps_and_completes() {
        let mut loan = loan(1000.0);
        loan.apply_installment(installment(400.0));
        loan.apply_installment(installment(700.0));
        assert_eq!(loan.amount_paid, 1100.0);
        assert_eq!(loan.remaining_due, 0.0);
        assert_eq!(loan.status, LoanStatus::Completed);
        assert_eq!(loan.installments.len(), 2);
    }

    #[test]
    fn payment_reactivates_non_active_loan() {
        let mut loan = loan(1000.0);
        loan.status = LoanStatus::Pending;
        loan.apply_installment(installment(100.0));
        assert_eq!(loan.status, LoanStatus::Active);
    }

    #[test]
    fn repayment_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&RepaymentMode::CalculatedEmi).unwrap(),
            "\"Calculated EMI\""
        );
        assert_eq!(
            serde_json::from_str::<RepaymentMode>("\"Fixed Payment\"").unwrap(),
            RepaymentMode::FixedPayment
        );
    }

    #[test]
    fn monthly_emi_field_name() {
        let mut l = loan(500.0);
        l.monthly_emi = 50.0;
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["monthlyEMI"], 50.0);
    }
}
