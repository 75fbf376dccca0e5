use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::core::shared_modules;
use crate::error::MatchError;
use crate::models::{
    FindMatchRequest, FindMatchResponse, HealthResponse, MatchStatusResponse, MatchSummary,
    NewPairing, SendMessageRequest,
};
use crate::routes::{conversation_view, error_response, relay_message, store_failure, validation_failed, AppState};

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_match))
        .route("/matches/status", web::get().to(match_status))
        .route("/matches/message", web::post().to(send_message));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.profiles.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find match endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "userId": "string"
/// }
/// ```
///
/// Scores every opted-in user against the requester, and when the best score
/// clears the acceptance threshold records a new pairing for the two.
async fn find_match(
    state: web::Data<AppState>,
    req: web::Json<FindMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_match request: {:?}", errors);
        return validation_failed(errors);
    }

    let user_id = &req.user_id;

    tracing::info!("Finding match for user: {}", user_id);

    let me = match state.profiles.get(user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "Profile not found",
                format!("No profile for user {}, set one up first", user_id),
            );
        }
        Err(e) => return store_failure("Failed to fetch user profile", e),
    };

    if let Err(MatchError::InvalidProfile { missing }) = state.matcher.require_complete(&me) {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Incomplete profile",
            format!("Please complete these required fields first: {}", missing.join(", ")),
        );
    }

    let candidates = match state.profiles.list_opted_in().await {
        Ok(candidates) => candidates,
        Err(e) => return store_failure("Failed to query candidates", e),
    };

    tracing::debug!("Scoring {} candidates for {}", candidates.len(), user_id);

    let best = state
        .matcher
        .find_best_match(user_id, &me, &candidates)
        .filter(|best| state.matcher.is_strong_match(best.score));

    let Some(best) = best else {
        tracing::info!("No strong match for user {} ({} candidates)", user_id, candidates.len());
        return HttpResponse::Ok().json(FindMatchResponse {
            best_match: None,
            candidates_considered: candidates.len(),
        });
    };

    let Some((_, partner)) = candidates.iter().find(|(id, _)| *id == best.user_id) else {
        return store_failure("Failed to resolve matched profile", &best.user_id);
    };

    let pairing_id = match state
        .matches
        .create(NewPairing {
            requester_id: user_id.clone(),
            partner_id: best.user_id.clone(),
            score: best.score,
        })
        .await
    {
        Ok(id) => id,
        Err(e) => return store_failure("Failed to record match", e),
    };

    tracing::info!(
        "Matched {} with {} (score {:.2}, pairing {})",
        user_id,
        best.user_id,
        best.score,
        pairing_id
    );

    HttpResponse::Ok().json(FindMatchResponse {
        best_match: Some(MatchSummary {
            pairing_id,
            breakdown: state.matcher.breakdown(&me, partner),
            shared_modules: shared_modules(&me.modules, &partner.modules),
            user_id: best.user_id,
            score: best.score,
            profile: partner.clone(),
        }),
        candidates_considered: candidates.len(),
    })
}

/// Match status endpoint
///
/// GET /api/v1/matches/status?userId={userId}
async fn match_status(
    state: web::Data<AppState>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> impl Responder {
    let Some(user_id) = query.get("userId") else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing userId parameter",
            "userId query parameter is required",
        );
    };

    match state.matches.find_active_for(user_id).await {
        Ok(Some(pairing)) => HttpResponse::Ok().json(MatchStatusResponse {
            pairing_id: pairing.id,
            score: pairing.score,
            conversation: conversation_view(&state.gate, &pairing.conversation, user_id),
        }),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "No active match",
            format!("User {} has no active match, use find to look for one", user_id),
        ),
        Err(e) => store_failure("Failed to fetch match", e),
    }
}

/// Relay a message within the sender's persisted pairing
///
/// POST /api/v1/matches/message
async fn send_message(
    state: web::Data<AppState>,
    req: web::Json<SendMessageRequest>,
) -> impl Responder {
    relay_message(&state, state.conversations.as_ref(), &req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }
}
