//! Thin REST binding over the coordinator. Every route loads whatever
//! rows it needs directly from the store, runs the relevant policy, and
//! returns its result as JSON — no business logic lives here.

use crate::coordinator::Coordinator;
use crate::domain::{Listing, ListingStatus, OfferRecord, QueueEntry};
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::middleware::{request_logging_simple, RateLimitConfig, RateLimitLayer};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}

pub fn build_router(state: AppState) -> Router {
    let rate_limit = RateLimitLayer::new(RateLimitConfig::default());

    Router::new()
        .route("/health", get(health))
        .route("/policies/repricer/preview", get(repricer_preview))
        .route("/policies/repricer/run", post(repricer_run))
        .route("/policies/zombie-killer/scan", post(zombie_scan))
        .route("/policies/resurrector/:id/resurrect", post(resurrector_resurrect))
        .route("/policies/auto-relister/preview", get(auto_relister_preview))
        .route("/policies/auto-relister/run", post(auto_relister_run))
        .route("/policies/purgatory/donations", get(purgatory_donations))
        .route("/policies/purgatory/:id/enter", post(purgatory_enter))
        .route("/policies/kickstarter/:id/promote", post(kickstarter_promote))
        .route("/policies/kickstarter/cleanup", post(kickstarter_cleanup))
        .route("/policies/offer-sniper/:id/scan", post(offer_sniper_scan))
        .route("/policies/offer-sniper/:id/offer", post(offer_sniper_respond))
        .route("/policies/photo-shuffler/run", post(photo_shuffler_run))
        .route("/policies/store-pulse/extend", post(store_pulse_extend))
        .route("/policies/store-pulse/revert", post(store_pulse_revert))
        .route("/policies/smart-queue/status", get(queue_status))
        .route("/policies/smart-queue/:id/enqueue", post(queue_enqueue))
        .route("/policies/smart-queue/release", post(queue_release))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(request_logging_simple))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn active_listings(state: &AppState) -> anyhow::Result<Vec<Listing>> {
    state
        .coordinator
        .store()
        .with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM listings WHERE status = ?1 AND deleted = 0")?;
            let rows = stmt
                .query_map([ListingStatus::Active.as_str()], Listing::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
}

async fn listing_by_id(state: &AppState, id: i64) -> anyhow::Result<Option<Listing>> {
    state
        .coordinator
        .store()
        .with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM listings WHERE id = ?1")?;
            let mut rows = stmt.query_map([id], Listing::from_row)?;
            Ok(rows.next().transpose()?)
        })
        .await
}

fn not_found(entity: &str, id: i64) -> axum::response::Response {
    (StatusCode::NOT_FOUND, format!("{entity} {id} not found")).into_response()
}

async fn repricer_preview(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(listings) => {
            let actions = state.coordinator.repricer.preview(&listings);
            Json(json!({ "actions": actions })).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn repricer_run(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(mut listings) => {
            let result = state.coordinator.run_repricer(&mut listings).await;
            Json(json!({ "actions": result.actions, "errors": result.errors })).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn zombie_scan(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(mut listings) => {
            let result = state.coordinator.run_zombie_scan(&mut listings).await;
            Json(json!(result)).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn resurrector_resurrect(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let listing = match listing_by_id(&state, id).await {
        Ok(Some(l)) => l,
        Ok(None) => return not_found("listing", id),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    let mut listing = listing;
    let result = state.coordinator.run_resurrect(&mut listing).await;
    Json(json!({
        "success": result.success,
        "listing_id": result.listing_id,
        "old_sku": result.old_sku,
        "new_sku": result.new_sku,
        "old_item_id": result.old_item_id,
        "new_item_id": result.new_item_id,
        "cycle": result.cycle,
        "error": result.error,
    }))
    .into_response()
}

async fn auto_relister_preview(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(listings) => {
            let candidates = state.coordinator.auto_relister.preview(&listings);
            Json(json!({ "candidates": candidates })).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn auto_relister_run(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(mut listings) => {
            let records = state.coordinator.run_auto_relist(&mut listings).await;
            Json(json!({ "relisted": records.len() })).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn purgatory_donations(State(state): State<AppState>) -> impl IntoResponse {
    let result = state
        .coordinator
        .store()
        .with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM listings WHERE status = ?1 AND deleted = 0")?;
            let rows = stmt
                .query_map([ListingStatus::Purgatory.as_str()], Listing::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await;

    match result {
        Ok(listings) => {
            let suggestions = state.coordinator.purgatory.scan_for_purgatory(&listings);
            Json(json!({ "suggestions": suggestions })).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn purgatory_enter(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let mut listing = match listing_by_id(&state, id).await {
        Ok(Some(l)) => l,
        Ok(None) => return not_found("listing", id),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    let result = state.coordinator.run_purgatory_entry(&mut listing).await;
    Json(json!({
        "success": result.success,
        "listing_id": result.listing_id,
        "markdown_price": result.markdown_price,
        "estimated_loss": result.estimated_loss,
        "error": result.error,
    }))
    .into_response()
}

async fn campaigns_for(state: &AppState, listing_id: i64) -> anyhow::Result<Vec<crate::domain::Campaign>> {
    state
        .coordinator
        .store()
        .with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM campaigns WHERE listing_id = ?1")?;
            let rows = stmt
                .query_map([listing_id], crate::domain::Campaign::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
}

async fn kickstarter_promote(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let mut listing = match listing_by_id(&state, id).await {
        Ok(Some(l)) => l,
        Ok(None) => return not_found("listing", id),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    let existing = match campaigns_for(&state, id).await {
        Ok(c) => c,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    match state.coordinator.run_kickstarter_promote(&mut listing, &existing).await {
        Ok(result) => Json(json!({
            "ebay_campaign_id": result.ebay_campaign_id,
            "listing_id": listing.id,
            "ad_rate_percent": listing.ad_rate_percent,
        }))
        .into_response(),
        Err(e) => (StatusCode::CONFLICT, e.to_string()).into_response(),
    }
}

async fn kickstarter_cleanup(State(state): State<AppState>) -> impl IntoResponse {
    let campaigns = state
        .coordinator
        .store()
        .with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM campaigns WHERE status = 'active'")?;
            let rows = stmt
                .query_map([], crate::domain::Campaign::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await;

    let mut campaigns = match campaigns {
        Ok(c) => c,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let mut reset_ids = Vec::new();
    let (ended, errors) = state
        .coordinator
        .kickstarter
        .cleanup_expired(&mut campaigns, &mut |listing_id| reset_ids.push(listing_id), chrono::Utc::now())
        .await;

    for campaign in campaigns.iter().filter(|c| c.status == crate::domain::CampaignStatus::Ended) {
        if let Err(e) = state.coordinator.store().update_campaign_status(campaign.id, campaign.status).await {
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    }

    for listing_id in reset_ids {
        let listing = match listing_by_id(&state, listing_id).await {
            Ok(Some(l)) => l,
            Ok(None) => continue,
            Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        };
        let mut listing = listing;
        listing.ad_rate_percent = 0.0;
        if let Err(e) = state.coordinator.store().save_listings(std::slice::from_ref(&listing)).await {
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    }

    Json(json!({ "ended": ended, "errors": errors })).into_response()
}

async fn offer_sniper_scan(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let listing = match listing_by_id(&state, id).await {
        Ok(Some(l)) => l,
        Ok(None) => return not_found("listing", id),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let existing: anyhow::Result<Vec<OfferRecord>> = state
        .coordinator
        .store()
        .with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM offer_records WHERE listing_id = ?1")?;
            let rows = stmt
                .query_map([id], OfferRecord::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await;

    let existing = match existing {
        Ok(e) => e,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let (sent, errors) = state
        .coordinator
        .run_offer_snipe(&listing, &existing, chrono::Utc::now())
        .await;
    Json(json!({ "sent": sent, "errors": errors })).into_response()
}

#[derive(Deserialize)]
struct IncomingOfferPayload {
    offer_id: String,
    current_price: f64,
    offer_amount: f64,
}

async fn offer_sniper_respond(
    State(state): State<AppState>,
    Path(_id): Path<i64>,
    Json(payload): Json<IncomingOfferPayload>,
) -> impl IntoResponse {
    match state
        .coordinator
        .offer_sniper
        .handle_incoming_offer(&payload.offer_id, payload.current_price, payload.offer_amount)
        .await
    {
        Ok((action, counter)) => Json(json!({
            "action": action.as_str(),
            "counter_price": counter,
        }))
        .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn photo_shuffler_run(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(mut listings) => {
            let (shuffled, skipped) = state.coordinator.run_photo_shuffle(&mut listings).await;
            Json(json!({
                "shuffled": shuffled.len(),
                "skipped": skipped.len(),
            }))
            .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct HandlingTimePayload {
    target_days: i64,
}

async fn store_pulse_extend(
    State(state): State<AppState>,
    Json(payload): Json<HandlingTimePayload>,
) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(listings) => {
            let result = state.coordinator.run_store_pulse(&listings, Some(payload.target_days)).await;
            Json(json!({ "updated": result.updated, "errors": result.errors, "message": result.message }))
                .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn store_pulse_revert(State(state): State<AppState>) -> impl IntoResponse {
    match active_listings(&state).await {
        Ok(listings) => {
            let result = state.coordinator.run_store_pulse(&listings, None).await;
            Json(json!({ "updated": result.updated, "errors": result.errors, "message": result.message }))
                .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn queue_status(State(state): State<AppState>) -> impl IntoResponse {
    let result = state
        .coordinator
        .store()
        .with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM queue_entries")?;
            let rows = stmt
                .query_map([], QueueEntry::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await;

    match result {
        Ok(entries) => {
            let summary = state
                .coordinator
                .smart_queue
                .get_queue_status(&entries, chrono::Utc::now());
            Json(summary).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct EnqueuePayload {
    #[serde(default)]
    priority: i64,
}

async fn queue_enqueue(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EnqueuePayload>,
) -> impl IntoResponse {
    let mut listing = match listing_by_id(&state, id).await {
        Ok(Some(l)) => l,
        Ok(None) => return not_found("listing", id),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };
    match state
        .coordinator
        .run_smart_queue_enqueue(&mut listing, payload.priority, chrono::Utc::now())
        .await
    {
        Ok(entry) => Json(json!({
            "listing_id": entry.listing_id,
            "priority": entry.priority,
            "status": entry.status.as_str(),
        }))
        .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[derive(Deserialize, Default)]
struct ReleasePayload {
    #[serde(default)]
    dry_run: bool,
}

async fn queue_release(
    State(state): State<AppState>,
    Json(payload): Json<ReleasePayload>,
) -> impl IntoResponse {
    let entries = state
        .coordinator
        .store()
        .with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM queue_entries WHERE status = 'pending'")?;
            let rows = stmt
                .query_map([], QueueEntry::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await;
    let mut entries = match entries {
        Ok(e) => e,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let listing_ids: Vec<i64> = entries.iter().map(|e| e.listing_id).collect();
    let listings = state
        .coordinator
        .store()
        .with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM listings WHERE status = ?1 AND deleted = 0")?;
            let rows = stmt
                .query_map([ListingStatus::Queued.as_str()], Listing::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().filter(|l| listing_ids.contains(&l.id)).collect::<Vec<_>>())
        })
        .await;
    let mut listings = match listings {
        Ok(l) => l,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let released = state
        .coordinator
        .run_smart_queue_release(&mut entries, &mut listings, payload.dry_run)
        .await;
    Json(json!({ "released": released })).into_response()
}
