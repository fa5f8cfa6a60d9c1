//! Contribution endpoints: CRUD, filtered listing with pagination, and the
//! reporting surface (summary totals, chart series, CSV export).

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bson::{doc, Bson, Document};
use chrono::Datelike;
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use super::validation::parse_object_id;
use crate::db::{Contribution, CreateContributionRequest, UpdateContributionRequest};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub method: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub month: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ContributionListResponse {
    pub data: Vec<Contribution>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ContributionResponse {
    pub success: bool,
    pub message: String,
    pub data: Contribution,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Exact-match filter over the optional month/year window.
fn period_filter(month: Option<i32>, year: Option<i32>) -> Document {
    let mut filter = Document::new();
    if let Some(m) = month {
        filter.insert("month", m);
    }
    if let Some(y) = year {
        filter.insert("year", y);
    }
    filter
}

/// Full listing filter: period, method/status (ignoring the "All"
/// placeholder the UI sends), and a case-insensitive substring match on the
/// member name. Regex metacharacters in the search term are escaped so the
/// caller always gets a literal substring match.
fn list_filter(query: &ListQuery) -> Document {
    let mut filter = period_filter(query.month, query.year);
    if let Some(method) = query.method.as_deref() {
        if method != "All" {
            filter.insert("method", method);
        }
    }
    if let Some(status) = query.status.as_deref() {
        if status != "All" {
            filter.insert("status", status);
        }
    }
    if let Some(search) = query.search.as_deref() {
        if !search.is_empty() {
            filter.insert(
                "memberName",
                doc! { "$regex": regex::escape(search), "$options": "i" },
            );
        }
    }
    filter
}

/// 1-based page plus limit into an offset window. Out-of-range values are
/// clamped rather than rejected.
fn page_window(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (u64, i64) {
    let limit = limit.unwrap_or(default_limit).max(1);
    let page = page.unwrap_or(1).max(1);
    let skip = page.saturating_sub(1).saturating_mul(limit);
    (skip as u64, limit)
}

/// List contributions with filters and pagination; `total` counts every
/// match regardless of the page window.
pub async fn list_contributions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ContributionListResponse>, ApiError> {
    let filter = list_filter(&query);
    let (skip, limit) = page_window(
        query.page,
        query.limit,
        state.config.contributions.default_page_limit,
    );

    let data: Vec<Contribution> = state
        .db
        .contributions()
        .find(filter.clone())
        .sort(doc! { "memberName": 1 })
        .skip(skip)
        .limit(limit)
        .await?
        .try_collect()
        .await?;

    let total = state.db.contributions().count_documents(filter).await?;

    Ok(Json(ContributionListResponse { data, total }))
}

/// Create a contribution for an existing member, one per (member, month, year)
pub async fn create_contribution(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContributionRequest>,
) -> Result<Json<ContributionResponse>, ApiError> {
    let member_name = match req.member_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(ApiError::validation("Member name is required")),
    };
    let month = req
        .month
        .ok_or_else(|| ApiError::validation("Month is required"))?;
    if !(1..=12).contains(&month) {
        return Err(ApiError::validation("Month must be between 1 and 12"));
    }
    let year = req
        .year
        .ok_or_else(|| ApiError::validation("Year is required"))?;

    let member = state
        .db
        .members()
        .find_one(doc! { "memberName": &member_name })
        .await?
        .ok_or_else(|| {
            ApiError::validation(format!(
                "Member \"{member_name}\" not found. Please add in Members first."
            ))
        })?;

    let existing = state
        .db
        .contributions()
        .find_one(doc! { "memberName": &member_name, "month": month, "year": year })
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(format!(
            "Contribution for {member_name} in {month}/{year} already exists."
        )));
    }

    // Snapshot the member's contact fields; they stay as they were even if
    // the member record changes later.
    let mut contribution = Contribution {
        id: None,
        member_name,
        email: member.email,
        phone: member.phone,
        active: member.active,
        target: req
            .target
            .unwrap_or(state.config.contributions.default_target),
        amount_paid: req.amount_paid.unwrap_or(0.0),
        method: req.method.unwrap_or_default(),
        status: req.status.unwrap_or_default(),
        balance: req.balance.unwrap_or(0.0),
        extra: req.extra.unwrap_or(0.0),
        month,
        year,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let result = state.db.contributions().insert_one(&contribution).await?;
    contribution.id = result.inserted_id.as_object_id();

    Ok(Json(ContributionResponse {
        success: true,
        message: "Contribution added successfully".to_string(),
        data: contribution,
    }))
}

/// Update a contribution by id. Fields are replaced as supplied; in
/// particular `balance` is not recomputed from target and amountPaid.
pub async fn update_contribution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateContributionRequest>,
) -> Result<Json<ContributionResponse>, ApiError> {
    let oid = parse_object_id(&id)?;

    let mut set = Document::new();
    if let Some(name) = req.member_name {
        set.insert("memberName", Bson::String(name));
    }
    if let Some(email) = req.email {
        set.insert("email", Bson::String(email));
    }
    if let Some(phone) = req.phone {
        set.insert("phone", Bson::String(phone));
    }
    if let Some(active) = req.active {
        set.insert("active", Bson::Boolean(active));
    }
    if let Some(target) = req.target {
        set.insert("target", target);
    }
    if let Some(amount_paid) = req.amount_paid {
        set.insert("amountPaid", amount_paid);
    }
    if let Some(method) = req.method {
        set.insert("method", bson::to_bson(&method)?);
    }
    if let Some(status) = req.status {
        set.insert("status", bson::to_bson(&status)?);
    }
    if let Some(balance) = req.balance {
        set.insert("balance", balance);
    }
    if let Some(extra) = req.extra {
        set.insert("extra", extra);
    }
    if let Some(month) = req.month {
        if !(1..=12).contains(&month) {
            return Err(ApiError::validation("Month must be between 1 and 12"));
        }
        set.insert("month", month);
    }
    if let Some(year) = req.year {
        set.insert("year", year);
    }
    if set.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let contribution = state
        .db
        .contributions()
        .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Contribution not found"))?;

    Ok(Json(ContributionResponse {
        success: true,
        message: "Contribution updated successfully".to_string(),
        data: contribution,
    }))
}

/// Delete a contribution by id
pub async fn delete_contribution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let oid = parse_object_id(&id)?;

    let result = state
        .db
        .contributions()
        .delete_one(doc! { "_id": oid })
        .await?;
    if result.deleted_count == 0 {
        return Err(ApiError::not_found("Contribution not found"));
    }

    Ok(Json(DeleteResponse {
        success: true,
        message: "Contribution deleted successfully".to_string(),
    }))
}

// -------------------------------------------------------------------------
// Summary
// -------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct SummaryTotals {
    #[serde(default)]
    total_target: f64,
    #[serde(default)]
    total_collected: f64,
    #[serde(default)]
    total_pending: f64,
    #[serde(default)]
    total_extra: f64,
    #[serde(default)]
    count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub target_per_head: i64,
    pub monthly_target: f64,
    pub total_collected: f64,
    pub pending_balance: f64,
    pub extra_contributions: f64,
    pub count: i64,
}

fn summary_response(totals: SummaryTotals) -> SummaryResponse {
    let target_per_head = if totals.count > 0 {
        (totals.total_target / totals.count as f64).round() as i64
    } else {
        0
    };
    SummaryResponse {
        target_per_head,
        monthly_target: totals.total_target,
        total_collected: totals.total_collected,
        pending_balance: totals.total_pending,
        extra_contributions: totals.total_extra,
        count: totals.count,
    }
}

/// Aggregate totals over the optional month/year window
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let pipeline = vec![
        doc! { "$match": period_filter(query.month, query.year) },
        doc! { "$group": {
            "_id": null,
            "total_target": { "$sum": "$target" },
            "total_collected": { "$sum": "$amountPaid" },
            "total_pending": { "$sum": "$balance" },
            "total_extra": { "$sum": "$extra" },
            "count": { "$sum": 1 },
        }},
    ];

    let mut cursor = state.db.contributions().aggregate(pipeline).await?;
    let totals = match cursor.try_next().await? {
        Some(row) => bson::from_document(row)?,
        None => SummaryTotals::default(),
    };

    Ok(Json(summary_response(totals)))
}

// -------------------------------------------------------------------------
// Charts
// -------------------------------------------------------------------------

/// Per-month totals for one year. The group key stays `_id` on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyPoint {
    #[serde(rename = "_id")]
    pub month: i32,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub target: f64,
    #[serde(default)]
    pub extra: f64,
}

/// Collected amount per payment method.
#[derive(Debug, Serialize, Deserialize)]
pub struct MethodPoint {
    #[serde(rename = "_id")]
    pub method: String,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub monthly: Vec<MonthlyPoint>,
    pub methods: Vec<MethodPoint>,
}

/// Chart series: per-month totals for the whole year (ignoring the month
/// filter) plus per-method totals honoring it.
pub async fn charts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<ChartsResponse>, ApiError> {
    let year = query.year.unwrap_or_else(|| chrono::Utc::now().year());

    let monthly_pipeline = vec![
        doc! { "$match": { "year": year } },
        doc! { "$group": {
            "_id": "$month",
            "total": { "$sum": "$amountPaid" },
            "target": { "$sum": "$target" },
            "extra": { "$sum": "$extra" },
        }},
        doc! { "$sort": { "_id": 1 } },
    ];
    let monthly = collect_points::<MonthlyPoint>(&state, monthly_pipeline).await?;

    let methods_pipeline = vec![
        doc! { "$match": period_filter(query.month, Some(year)) },
        doc! { "$group": {
            "_id": "$method",
            "total": { "$sum": "$amountPaid" },
        }},
    ];
    let methods = collect_points::<MethodPoint>(&state, methods_pipeline).await?;

    Ok(Json(ChartsResponse { monthly, methods }))
}

async fn collect_points<T: serde::de::DeserializeOwned>(
    state: &AppState,
    pipeline: Vec<Document>,
) -> Result<Vec<T>, ApiError> {
    let mut cursor = state.db.contributions().aggregate(pipeline).await?;
    let mut points = Vec::new();
    while let Some(row) = cursor.try_next().await? {
        points.push(bson::from_document(row)?);
    }
    Ok(points)
}

// -------------------------------------------------------------------------
// CSV export
// -------------------------------------------------------------------------

const CSV_HEADER: &str = "memberName,target,amountPaid,method,status,balance,extra,month,year";

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render amounts without a trailing `.0` for whole numbers.
fn csv_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn render_csv(rows: &[Contribution]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for c in rows {
        // Stored balance of zero falls back to the derived value, matching
        // the historical export behavior.
        let balance = if c.balance == 0.0 {
            c.target - c.amount_paid
        } else {
            c.balance
        };
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_field(&c.member_name),
            csv_number(c.target),
            csv_number(c.amount_paid),
            c.method.as_str(),
            c.status.as_str(),
            csv_number(balance),
            csv_number(c.extra),
            c.month,
            c.year,
        ));
    }
    out
}

fn export_filename(month: Option<i32>, year: Option<i32>) -> String {
    let month = month.map_or_else(|| "all".to_string(), |m| m.to_string());
    let year = year.map_or_else(|| "all".to_string(), |y| y.to_string());
    format!("contributions_{month}_{year}.csv")
}

/// Export matching contributions as a CSV file download
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeriodQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows: Vec<Contribution> = state
        .db
        .contributions()
        .find(period_filter(query.month, query.year))
        .await?
        .try_collect()
        .await?;

    let body = render_csv(&rows);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(query.month, query.year)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ContributionMethod, ContributionStatus};

    fn contribution(name: &str, target: f64, paid: f64, balance: f64) -> Contribution {
        Contribution {
            id: None,
            member_name: name.to_string(),
            email: String::new(),
            phone: String::new(),
            active: true,
            target,
            amount_paid: paid,
            method: ContributionMethod::Upi,
            status: ContributionStatus::Partial,
            balance,
            extra: 0.0,
            month: 4,
            year: 2025,
            created_at: "2025-04-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn list_filter_exact_matches() {
        let query = ListQuery {
            month: Some(4),
            year: Some(2025),
            method: Some("UPI".to_string()),
            status: Some("Pending".to_string()),
            ..Default::default()
        };
        let filter = list_filter(&query);
        assert_eq!(filter.get_i32("month").unwrap(), 4);
        assert_eq!(filter.get_i32("year").unwrap(), 2025);
        assert_eq!(filter.get_str("method").unwrap(), "UPI");
        assert_eq!(filter.get_str("status").unwrap(), "Pending");
    }

    #[test]
    fn list_filter_skips_all_placeholder() {
        let query = ListQuery {
            method: Some("All".to_string()),
            status: Some("All".to_string()),
            ..Default::default()
        };
        let filter = list_filter(&query);
        assert!(filter.is_empty());
    }

    #[test]
    fn list_filter_escapes_search_regex() {
        let query = ListQuery {
            search: Some("a.b".to_string()),
            ..Default::default()
        };
        let filter = list_filter(&query);
        let name = filter.get_document("memberName").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), "a\\.b");
        assert_eq!(name.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn page_window_defaults_and_offsets() {
        assert_eq!(page_window(None, None, 100), (0, 100));
        assert_eq!(page_window(Some(2), Some(10), 100), (10, 10));
        assert_eq!(page_window(Some(5), Some(25), 100), (100, 25));
        // Out-of-range inputs clamp instead of erroring
        assert_eq!(page_window(Some(0), Some(0), 100), (0, 1));
        assert_eq!(page_window(Some(-3), None, 50), (0, 50));
    }

    #[test]
    fn page_window_saturates_on_huge_pages() {
        // Caller-supplied page/limit must never overflow the offset
        assert_eq!(
            page_window(Some(i64::MAX), Some(1000), 100),
            (i64::MAX as u64, 1000)
        );
        assert_eq!(
            page_window(Some(i64::MAX), Some(i64::MAX), 100),
            (i64::MAX as u64, i64::MAX)
        );
    }

    #[test]
    fn summary_of_empty_set_is_all_zero() {
        let response = summary_response(SummaryTotals::default());
        assert_eq!(response.target_per_head, 0);
        assert_eq!(response.monthly_target, 0.0);
        assert_eq!(response.total_collected, 0.0);
        assert_eq!(response.pending_balance, 0.0);
        assert_eq!(response.extra_contributions, 0.0);
        assert_eq!(response.count, 0);
    }

    #[test]
    fn summary_rounds_target_per_head() {
        let response = summary_response(SummaryTotals {
            total_target: 1000.0,
            total_collected: 700.0,
            total_pending: 300.0,
            total_extra: 0.0,
            count: 3,
        });
        assert_eq!(response.target_per_head, 333);
        assert_eq!(response.monthly_target, 1000.0);
    }

    #[test]
    fn csv_balance_falls_back_when_zero() {
        let rows = vec![contribution("Asha", 300.0, 100.0, 0.0)];
        let csv = render_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), CSV_HEADER);
        assert_eq!(lines.next().unwrap(), "Asha,300,100,UPI,Partial,200,0,4,2025");
    }

    #[test]
    fn csv_keeps_stored_nonzero_balance() {
        let rows = vec![contribution("Asha", 300.0, 100.0, 150.0)];
        let csv = render_csv(&rows);
        assert!(csv.lines().nth(1).unwrap().contains(",150,"));
    }

    #[test]
    fn csv_quotes_fields_with_delimiters() {
        assert_eq!(csv_field("Kumar, Jr."), "\"Kumar, Jr.\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn csv_row_count_matches_input() {
        let rows = vec![
            contribution("A", 300.0, 300.0, 0.0),
            contribution("B", 300.0, 0.0, 300.0),
            contribution("C", 300.0, 100.0, 200.0),
        ];
        let csv = render_csv(&rows);
        assert_eq!(csv.lines().count(), rows.len() + 1);
    }

    #[test]
    fn export_filename_encodes_filters() {
        assert_eq!(export_filename(Some(4), Some(2025)), "contributions_4_2025.csv");
        assert_eq!(export_filename(None, Some(2025)), "contributions_all_2025.csv");
        assert_eq!(export_filename(None, None), "contributions_all_all.csv");
    }
}
