//! Loan endpoints: CRUD plus the installment-append operation that drives
//! repayment accounting.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::validation::parse_object_id;
use crate::db::{AddInstallmentRequest, CreateLoanRequest, Installment, Loan, UpdateLoanRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LoanListResponse {
    pub success: bool,
    pub data: Vec<Loan>,
}

/// Response for single-loan reads. `data` is null for an unknown id: the
/// tolerant GET contract (see DESIGN.md).
#[derive(Debug, Serialize)]
pub struct LoanDataResponse {
    pub success: bool,
    pub data: Option<Loan>,
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub success: bool,
    pub message: String,
    pub data: Loan,
}

#[derive(Debug, Serialize)]
pub struct LoanDeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Create a loan. `remainingDue` defaults to the supplied value or else the
/// total repayment; `amountPaid` always starts at zero.
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let member_id = req
        .member_id
        .as_deref()
        .ok_or_else(|| ApiError::validation("Member id is required"))
        .and_then(parse_object_id)?;
    let member_name = match req.member_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(ApiError::validation("Member name is required")),
    };
    let loan_amount = req
        .loan_amount
        .ok_or_else(|| ApiError::validation("Loan amount is required"))?;
    let interest_rate = req
        .interest_rate
        .ok_or_else(|| ApiError::validation("Interest rate is required"))?;
    let total_repayment = req
        .total_repayment
        .ok_or_else(|| ApiError::validation("Total repayment is required"))?;
    let tenure = req
        .tenure
        .ok_or_else(|| ApiError::validation("Tenure is required"))?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut loan = Loan {
        id: None,
        member_id,
        member_name,
        loan_amount,
        interest_rate,
        total_interest: req.total_interest.unwrap_or(0.0),
        total_repayment,
        tenure,
        loan_start_date: req.loan_start_date.unwrap_or_else(|| now.clone()),
        status: req.status.unwrap_or_default(),
        repayment_mode: req.repayment_mode.unwrap_or_default(),
        monthly_emi: req.monthly_emi.unwrap_or(0.0),
        fixed_monthly_payment: req.fixed_monthly_payment.unwrap_or(0.0),
        notes: req.notes.unwrap_or_default(),
        amount_paid: 0.0,
        remaining_due: req.remaining_due.unwrap_or(total_repayment),
        installments: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    };

    let result = state.db.loans().insert_one(&loan).await?;
    loan.id = result.inserted_id.as_object_id();

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            success: true,
            message: "Loan created successfully".to_string(),
            data: loan,
        }),
    ))
}

/// List all loans, newest first
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LoanListResponse>, ApiError> {
    let loans: Vec<Loan> = state
        .db
        .loans()
        .find(doc! {})
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(LoanListResponse {
        success: true,
        data: loans,
    }))
}

/// Get one loan by id. An unknown id is not an error here: the response is
/// a 200 with a null payload.
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LoanDataResponse>, ApiError> {
    let oid = parse_object_id(&id)?;
    let loan = state.db.loans().find_one(doc! { "_id": oid }).await?;

    Ok(Json(LoanDataResponse {
        success: true,
        data: loan,
    }))
}

/// Partial update of a loan by id
pub async fn update_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLoanRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let oid = parse_object_id(&id)?;

    let mut set = Document::new();
    if let Some(name) = req.member_name {
        set.insert("memberName", Bson::String(name));
    }
    if let Some(loan_amount) = req.loan_amount {
        set.insert("loanAmount", loan_amount);
    }
    if let Some(interest_rate) = req.interest_rate {
        set.insert("interestRate", interest_rate);
    }
    if let Some(total_interest) = req.total_interest {
        set.insert("totalInterest", total_interest);
    }
    if let Some(total_repayment) = req.total_repayment {
        set.insert("totalRepayment", total_repayment);
    }
    if let Some(tenure) = req.tenure {
        set.insert("tenure", tenure);
    }
    if let Some(loan_start_date) = req.loan_start_date {
        set.insert("loanStartDate", Bson::String(loan_start_date));
    }
    if let Some(status) = req.status {
        set.insert("status", bson::to_bson(&status)?);
    }
    if let Some(repayment_mode) = req.repayment_mode {
        set.insert("repaymentMode", bson::to_bson(&repayment_mode)?);
    }
    if let Some(monthly_emi) = req.monthly_emi {
        set.insert("monthlyEMI", monthly_emi);
    }
    if let Some(fixed_monthly_payment) = req.fixed_monthly_payment {
        set.insert("fixedMonthlyPayment", fixed_monthly_payment);
    }
    if let Some(notes) = req.notes {
        set.insert("notes", Bson::String(notes));
    }
    if let Some(amount_paid) = req.amount_paid {
        set.insert("amountPaid", amount_paid);
    }
    if let Some(remaining_due) = req.remaining_due {
        set.insert("remainingDue", remaining_due);
    }
    if set.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }
    set.insert("updatedAt", Bson::String(chrono::Utc::now().to_rfc3339()));

    let loan = state
        .db
        .loans()
        .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Loan not found"))?;

    Ok(Json(LoanResponse {
        success: true,
        message: "Loan updated successfully".to_string(),
        data: loan,
    }))
}

/// Delete a loan by id. No cascade: members and contributions are untouched.
pub async fn delete_loan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LoanDeleteResponse>, ApiError> {
    let oid = parse_object_id(&id)?;

    let result = state.db.loans().delete_one(doc! { "_id": oid }).await?;
    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Loan not found"));
    }

    Ok(Json(LoanDeleteResponse {
        success: true,
        message: "Loan deleted successfully".to_string(),
    }))
}

/// Record a payment against a loan.
///
/// Read-modify-write over the whole document: the accounting happens in
/// [`Loan::apply_installment`] and the result is persisted with one
/// `replace_one`. There is no locking between the read and the write.
pub async fn add_installment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddInstallmentRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let oid = parse_object_id(&id)?;
    let amount = req
        .amount
        .ok_or_else(|| ApiError::validation("Installment amount is required"))?;

    let mut loan = state
        .db
        .loans()
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| ApiError::not_found("Loan not found"))?;

    let now = chrono::Utc::now().to_rfc3339();
    loan.apply_installment(Installment {
        date: req.date.unwrap_or_else(|| now.clone()),
        amount,
        receipt_number: req.receipt_number,
        payment_method: req.payment_method.unwrap_or_default(),
        notes: req.notes.unwrap_or_default(),
    });
    loan.updated_at = now;

    state
        .db
        .loans()
        .replace_one(doc! { "_id": oid }, &loan)
        .await?;

    Ok(Json(LoanResponse {
        success: true,
        message: "Installment added successfully".to_string(),
        data: loan,
    }))
}
