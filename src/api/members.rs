//! Member CRUD endpoints.
//!
//! Deleting a member cascades to the contributions that carry the member's
//! name. The cascade is best effort: once the member document is gone a
//! failing cleanup is surfaced as an error but cannot be rolled back.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bson::{doc, Bson};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::validation::parse_object_id;
use crate::db::{CreateMemberRequest, Member, UpdateMemberRequest};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MemberListResponse {
    pub data: Vec<Member>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub message: String,
    pub data: Member,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List all members ordered by name ascending
pub async fn list_members(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MemberListResponse>, ApiError> {
    let members: Vec<Member> = state
        .db
        .members()
        .find(doc! {})
        .sort(doc! { "memberName": 1 })
        .await?
        .try_collect()
        .await?;

    Ok(Json(MemberListResponse { data: members }))
}

/// Create a new member, rejecting duplicate names
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let member_name = match req.member_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(ApiError::validation("Member name is required")),
    };

    let existing = state
        .db
        .members()
        .find_one(doc! { "memberName": &member_name })
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Member already exists"));
    }

    let mut member = Member {
        id: None,
        member_name,
        email: req.email.unwrap_or_default(),
        phone: req.phone.unwrap_or_default(),
        active: req.active.unwrap_or(true),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let result = state.db.members().insert_one(&member).await?;
    member.id = result.inserted_id.as_object_id();

    Ok((
        StatusCode::CREATED,
        Json(MemberResponse {
            message: "Member added successfully".to_string(),
            data: member,
        }),
    ))
}

/// Partial update of a member by id
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let oid = parse_object_id(&id)?;

    let mut set = bson::Document::new();
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
    if set.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let member = state
        .db
        .members()
        .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    Ok(Json(MemberResponse {
        message: "Member updated successfully".to_string(),
        data: member,
    }))
}

/// Delete a member and cascade-delete their contributions
pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let oid = parse_object_id(&id)?;

    let member = state
        .db
        .members()
        .find_one_and_delete(doc! { "_id": oid })
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    let removed = state
        .db
        .contributions()
        .delete_many(doc! { "memberName": &member.member_name })
        .await?;
    tracing::info!(
        member = %member.member_name,
        contributions = removed.deleted_count,
        "Deleted member and cascaded contributions"
    );

    Ok(Json(MessageResponse {
        message: "Member and contributions deleted successfully".to_string(),
    }))
}
