use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use closingdesk_audit::{AuditFilter, AuditPage, AuditQuery, AuditRecord, EntityType, Pagination};
use closingdesk_core::{AggregateRoot, DealId, PropertyId, UserId};
use closingdesk_deals::{Condition, Deal, DealStatus};
use closingdesk_infra::{DealFilter, TransactionFilter};
use closingdesk_ledger::{Reconciliation, Transaction, TransactionStatus, TransactionType, TrustAccount};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: DealStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReverseTransactionRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DealListQuery {
    pub status: Option<String>,
    pub property_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    pub deal_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditListQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub actor_id: Option<String>,
    pub event: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// -------------------------
// Query parsing
// -------------------------

fn parse_param<T>(raw: Option<String>) -> Result<Option<T>, axum::response::Response>
where
    T: std::str::FromStr<Err = closingdesk_core::EngineError>,
{
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse().map(Some).map_err(errors::engine_error_to_response),
        None => Ok(None),
    }
}

fn parse_timestamp(
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, axum::response::Response> {
    match raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => DateTime::parse_from_rfc3339(v)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| {
                errors::error_body(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    format!("{field} must be an RFC 3339 timestamp"),
                    json!({ "field": field }),
                )
            }),
        None => Ok(None),
    }
}

pub fn to_deal_filter(q: DealListQuery) -> Result<DealFilter, axum::response::Response> {
    Ok(DealFilter {
        status: parse_param::<DealStatus>(q.status)?,
        property_id: parse_param::<PropertyId>(q.property_id)?,
    })
}

pub fn to_transaction_filter(
    q: TransactionListQuery,
) -> Result<TransactionFilter, axum::response::Response> {
    Ok(TransactionFilter {
        deal_id: parse_param::<DealId>(q.deal_id)?,
        transaction_type: parse_param::<TransactionType>(q.transaction_type)?,
        status: parse_param::<TransactionStatus>(q.status)?,
        account_id: None,
    })
}

pub fn to_audit_query(q: AuditListQuery) -> Result<AuditQuery, axum::response::Response> {
    let filter = AuditFilter {
        entity_type: parse_param::<EntityType>(q.entity_type)?,
        entity_id: q.entity_id.filter(|v| !v.trim().is_empty()),
        actor_id: parse_param::<UserId>(q.actor_id)?,
        event: q.event.filter(|v| !v.trim().is_empty()),
        from: parse_timestamp("from", q.from)?,
        to: parse_timestamp("to", q.to)?,
    };
    Ok(AuditQuery {
        filter,
        pagination: Pagination::new(q.limit, q.offset),
    })
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn condition_to_json(c: &Condition) -> serde_json::Value {
    json!({
        "id": c.id,
        "type": c.condition_type,
        "description": c.description,
        "deadline": c.deadline,
        "status": c.status,
        "satisfied_at": c.satisfied_at,
        "created_at": c.created_at,
    })
}

pub fn deal_to_json(deal: &Deal) -> serde_json::Value {
    json!({
        "id": deal.id_typed(),
        "property_id": deal.property_id(),
        "offer_price": deal.offer_price(),
        "status": deal.status(),
        "participants": deal.participants().iter().map(|(role, p)| json!({
            "role": role,
            "user_id": p.user_id,
            "snapshot": p.snapshot,
        })).collect::<Vec<_>>(),
        "conditions": deal.conditions().iter().map(condition_to_json).collect::<Vec<_>>(),
        "closing_date": deal.closing_date(),
        "notes": deal.notes(),
        "status_history": deal.status_history().iter().map(|h| json!({
            "status": h.status,
            "timestamp": h.timestamp,
            "note": h.note,
        })).collect::<Vec<_>>(),
        "snapshot_version": deal.snapshot_version(),
        "snapshot_timestamp": deal.snapshot_timestamp(),
        "created_at": deal.created_at(),
        "updated_at": deal.updated_at(),
        "version": deal.version(),
    })
}

pub fn transaction_to_json(tx: &Transaction) -> serde_json::Value {
    json!({
        "id": tx.id_typed(),
        "deal_id": tx.deal_id(),
        "amount": tx.amount(),
        "type": tx.transaction_type(),
        "status": tx.status(),
        "from_account": tx.from_account(),
        "to_account": tx.to_account(),
        "description": tx.description(),
        "failure_reason": tx.failure_reason(),
        "created_at": tx.created_at(),
        "updated_at": tx.updated_at(),
    })
}

pub fn account_to_json(account: &TrustAccount) -> serde_json::Value {
    json!({
        "id": account.id_typed(),
        "account_number": account.account_number(),
        "holder_name": account.holder_name(),
        "balance": account.balance(),
        "status": account.status(),
        "created_at": account.created_at(),
        "updated_at": account.updated_at(),
    })
}

pub fn reconciliation_to_json(r: &Reconciliation) -> serde_json::Value {
    json!({
        "account_id": r.account_id,
        "stored_balance": r.stored_balance,
        "derived_balance": r.derived_balance,
        "balanced": r.balanced,
    })
}

pub fn audit_record_to_json(r: &AuditRecord) -> serde_json::Value {
    json!({
        "sequence": r.sequence,
        "entity_type": r.entity_type,
        "entity_id": r.entity_id,
        "event": r.event,
        "before": r.before,
        "after": r.after,
        "timestamp": r.timestamp,
        "actor_id": r.actor_id,
    })
}

pub fn audit_page_to_json(page: &AuditPage) -> serde_json::Value {
    json!({
        "items": page.records.iter().map(audit_record_to_json).collect::<Vec<_>>(),
        "total": page.total,
        "limit": page.pagination.limit,
        "offset": page.pagination.offset,
        "has_more": page.has_more,
    })
}
