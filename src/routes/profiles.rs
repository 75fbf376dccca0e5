use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;
use crate::error::ValidationError;
use crate::models::{
    BlockUserRequest, Profile, ProfileField, ProfileResponse, PromptRequest, PromptResponse,
    TextInputRequest, UpdateProfileRequest,
};
use crate::routes::{error_response, store_failure, validation_failed, AppState};
use crate::services::Moderator;

/// Configure all profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/profiles/{user_id}", web::get().to(get_profile))
        .route("/profiles/{user_id}", web::put().to(update_profile))
        .route("/profiles/{user_id}", web::delete().to(delete_profile))
        .route("/profiles/{user_id}/pause", web::post().to(pause_matching))
        .route("/profiles/{user_id}/resume", web::post().to(resume_matching))
        .route("/profiles/{user_id}/block", web::post().to(block_user))
        .route("/profiles/{user_id}/prompt", web::post().to(prompt_field))
        .route("/profiles/{user_id}/input", web::post().to(submit_input));
}

fn profile_response(user_id: &str, profile: Profile) -> HttpResponse {
    HttpResponse::Ok().json(ProfileResponse {
        user_id: user_id.to_string(),
        missing_fields: profile
            .missing_required_fields()
            .into_iter()
            .map(str::to_string)
            .collect(),
        profile,
    })
}

fn invalid_field(err: ValidationError) -> HttpResponse {
    error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid profile field", err.to_string())
}

fn profile_not_found(user_id: &str) -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        "Profile not found",
        format!("No profile for user {}", user_id),
    )
}

/// Merge a partial update onto `profile`, validating every field it sets
fn apply_update(
    moderator: &Moderator,
    profile: &mut Profile,
    update: UpdateProfileRequest,
) -> Result<(), ValidationError> {
    if let Some(gender) = update.gender {
        profile.gender = Some(gender);
    }
    if let Some(year) = update.year_of_study {
        profile.year_of_study = Some(moderator.validate_year(year)?);
    }
    if let Some(major) = update.major {
        profile.major = Some(moderator.validate_major(&major)?);
    }
    if let Some(modules) = update.modules {
        profile.modules = moderator.validate_modules(&modules)?;
    }
    if let Some(mediums) = update.mediums {
        profile.mediums.clear();
        for medium in mediums {
            if !profile.mediums.contains(&medium) {
                profile.mediums.push(medium);
            }
        }
    }
    if let Some(description) = update.description {
        profile.description = Some(moderator.validate_description(&description)?);
    }
    if let Some(name) = update.name {
        profile.name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
    }
    if let Some(handle) = update.handle {
        profile.handle = Some(handle.trim().trim_start_matches('@').to_string()).filter(|h| !h.is_empty());
    }
    Ok(())
}

/// Load, modify and save a profile, answering 404 when it does not exist
async fn modify_existing<F>(state: &AppState, user_id: &str, modify: F) -> HttpResponse
where
    F: FnOnce(&mut Profile),
{
    let mut profile = match state.profiles.get(user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return profile_not_found(user_id),
        Err(e) => return store_failure("Failed to fetch profile", e),
    };

    modify(&mut profile);

    match state.profiles.upsert(user_id, &profile).await {
        Ok(()) => profile_response(user_id, profile),
        Err(e) => store_failure("Failed to save profile", e),
    }
}

/// GET /api/v1/profiles/{user_id}
async fn get_profile(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match state.profiles.get(&user_id).await {
        Ok(Some(profile)) => profile_response(&user_id, profile),
        Ok(None) => profile_not_found(&user_id),
        Err(e) => store_failure("Failed to fetch profile", e),
    }
}

/// Create or partially update a profile
///
/// PUT /api/v1/profiles/{user_id}
async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for profile update of {}: {:?}", user_id, errors);
        return validation_failed(errors);
    }

    let mut profile = match state.profiles.get(&user_id).await {
        Ok(profile) => profile.unwrap_or_default(),
        Err(e) => return store_failure("Failed to fetch profile", e),
    };

    if let Err(e) = apply_update(&state.moderator, &mut profile, req.into_inner()) {
        tracing::info!("Rejected profile update for {}: {}", user_id, e);
        return invalid_field(e);
    }

    match state.profiles.upsert(&user_id, &profile).await {
        Ok(()) => {
            tracing::info!("Saved profile for {}", user_id);
            profile_response(&user_id, profile)
        }
        Err(e) => store_failure("Failed to save profile", e),
    }
}

/// DELETE /api/v1/profiles/{user_id}
async fn delete_profile(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match state.profiles.delete(&user_id).await {
        Ok(true) => {
            state.pending_inputs.remove(&user_id).await;
            state.chats.end(&user_id).await;
            let removed = match state.matches.delete_for(&user_id).await {
                Ok(removed) => removed,
                Err(e) => return store_failure("Failed to delete matches", e),
            };
            tracing::info!("Deleted profile and {} matches for {}", removed, user_id);
            HttpResponse::NoContent().finish()
        }
        Ok(false) => profile_not_found(&user_id),
        Err(e) => store_failure("Failed to delete profile", e),
    }
}

/// POST /api/v1/profiles/{user_id}/pause
async fn pause_matching(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    tracing::info!("Pausing matching for {}", user_id);
    modify_existing(&state, &user_id, |profile| profile.match_opt_in = false).await
}

/// POST /api/v1/profiles/{user_id}/resume
async fn resume_matching(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();
    tracing::info!("Resuming matching for {}", user_id);
    modify_existing(&state, &user_id, |profile| profile.match_opt_in = true).await
}

/// Block another user, excluding them from future matches in both directions
///
/// POST /api/v1/profiles/{user_id}/block
async fn block_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<BlockUserRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }
    let target = req.into_inner().target_user_id;

    if target == user_id {
        return error_response(StatusCode::BAD_REQUEST, "Invalid block", "You cannot block yourself");
    }

    // An ongoing chat with the blocked user ends immediately
    if let Some(chat) = state.chats.get(&user_id).await {
        if chat.partner_of(&user_id) == Some(target.as_str()) {
            state.chats.end(&user_id).await;
        }
    }

    tracing::info!("User {} blocked {}", user_id, target);

    modify_existing(&state, &user_id, |profile| {
        if !profile.has_blocked(&target) {
            profile.blocked.push(target.clone());
        }
    })
    .await
}

/// Ask the user for a single profile field; the next `input` call fills it
///
/// POST /api/v1/profiles/{user_id}/prompt
async fn prompt_field(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<PromptRequest>,
) -> impl Responder {
    let user_id = path.into_inner();
    let field = req.field;

    state.pending_inputs.insert(&user_id, field).await;
    tracing::debug!("Awaiting {:?} input from {}", field, user_id);

    HttpResponse::Ok().json(PromptResponse {
        user_id,
        awaiting: field,
    })
}

/// Free-text answer to the pending prompt
///
/// POST /api/v1/profiles/{user_id}/input
///
/// An invalid answer keeps the prompt pending so the user can try again.
async fn submit_input(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<TextInputRequest>,
) -> impl Responder {
    let user_id = path.into_inner();

    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    let Some(field) = state.pending_inputs.get(&user_id).await else {
        return error_response(
            StatusCode::CONFLICT,
            "No pending prompt",
            format!("User {} is not being asked for any profile field", user_id),
        );
    };

    let mut profile = match state.profiles.get(&user_id).await {
        Ok(profile) => profile.unwrap_or_default(),
        Err(e) => return store_failure("Failed to fetch profile", e),
    };

    let applied = match field {
        ProfileField::Major => state
            .moderator
            .validate_major(&req.text)
            .map(|major| profile.major = Some(major)),
        ProfileField::Modules => state
            .moderator
            .parse_modules(&req.text)
            .map(|modules| profile.modules = modules),
        ProfileField::Description => state
            .moderator
            .validate_description(&req.text)
            .map(|description| profile.description = Some(description)),
    };

    if let Err(e) = applied {
        tracing::info!("Rejected {:?} input from {}: {}", field, user_id, e);
        return invalid_field(e);
    }

    if let Err(e) = state.profiles.upsert(&user_id, &profile).await {
        return store_failure("Failed to save profile", e);
    }
    state.pending_inputs.remove(&user_id).await;

    tracing::info!("Updated {:?} for {}", field, user_id);
    profile_response(&user_id, profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, Medium};

    #[test]
    fn test_apply_update_merges_fields() {
        let moderator = Moderator::default();
        let mut profile = Profile {
            major: Some("Physics".to_string()),
            ..Default::default()
        };

        let update = UpdateProfileRequest {
            gender: Some(Gender::Female),
            year_of_study: Some(2),
            modules: Some(vec!["cs2030s".to_string(), " ST2334".to_string()]),
            mediums: Some(vec![Medium::Online]),
            handle: Some("@alice".to_string()),
            ..Default::default()
        };

        apply_update(&moderator, &mut profile, update).unwrap();

        assert_eq!(profile.major.as_deref(), Some("Physics"));
        assert_eq!(profile.modules, vec!["CS2030S", "ST2334"]);
        assert_eq!(profile.handle.as_deref(), Some("alice"));
        assert!(profile.is_complete());
    }

    #[test]
    fn test_apply_update_rejects_bad_module() {
        let moderator = Moderator::default();
        let mut profile = Profile::default();

        let update = UpdateProfileRequest {
            modules: Some(vec!["not a module".to_string()]),
            ..Default::default()
        };

        assert!(matches!(
            apply_update(&moderator, &mut profile, update),
            Err(ValidationError::InvalidModuleCode(_))
        ));
        assert!(profile.modules.is_empty());
    }
}
