use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::domain::snapshot::SessionSnapshot;
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::extractors::current_user::CurrentUser;
use crate::state::app_state::AppState;

/// Late lookup of a session snapshot, for UI that missed the websocket
/// broadcasts. Works for active sessions and for finished ones still
/// inside the retention window; once purged, the id is gone for good and
/// 404 is terminal, not retryable.
async fn get_session(
    path: web::Path<Uuid>,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let entry = app_state.sessions.get(session_id).ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Session, "unknown or purged session")
    })?;
    if entry.member_side(&current_user.sub).is_none() {
        return Err(AppError::forbidden("not a participant in this session"));
    }

    let snapshot = {
        let session = entry.lock().await;
        SessionSnapshot::of(&session)
    };
    Ok(HttpResponse::Ok().json(snapshot))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/{session_id}").route(web::get().to(get_session)));
}
