use actix_web::{web, HttpResponse};
use validator::Validate;
use crate::models::{
    ConnectionRequestsResponse, ConnectionStatus, CreateConnectionRequest, NewConnectionRequest,
    UpdateConnectionRequest,
};
use crate::routes::{bad_request, is_uuid, repository_error_response, AppState};

/// Configure hospital-to-donor connection routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/connection-requests", web::post().to(create_connection_request))
        .route("/connection-requests/{id}", web::patch().to(update_connection_request))
        .route("/donors/{donor_id}/connection-requests", web::get().to(list_for_donor))
        .route("/hospitals/{hospital_id}/connection-requests", web::get().to(list_for_hospital));
}

/// Open a connection request from a hospital to a donor
///
/// POST /api/v1/connection-requests
///
/// Request body:
/// ```json
/// {
///   "hospital_id": "uuid",
///   "donor_id": "uuid",
///   "blood_request_id": "uuid",
///   "message": "string"
/// }
/// ```
async fn create_connection_request(
    state: web::Data<AppState>,
    req: web::Json<CreateConnectionRequest>,
) -> HttpResponse {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let ids = [Some(&req.hospital_id), Some(&req.donor_id), req.blood_request_id.as_ref()];
    if ids.into_iter().flatten().any(|id| !is_uuid(id)) {
        return bad_request("Validation failed", "hospital_id, donor_id and blood_request_id must be UUIDs");
    }

    let req = req.into_inner();
    let new_request = NewConnectionRequest {
        hospital_id: req.hospital_id,
        donor_id: req.donor_id,
        blood_request_id: req.blood_request_id,
        message: req.message.filter(|m| !m.trim().is_empty()),
        status: ConnectionStatus::Pending,
    };

    match state.repository.create_connection_request(&new_request).await {
        Ok(created) => {
            tracing::info!(
                "Connection request {} sent: hospital {} -> donor {}",
                created.id,
                created.hospital_id,
                created.donor_id
            );
            HttpResponse::Created().json(created)
        }
        Err(e) => repository_error_response("Failed to create connection request", &e),
    }
}

/// Connection requests addressed to a donor, newest first
///
/// GET /api/v1/donors/{donor_id}/connection-requests
async fn list_for_donor(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let donor_id = path.into_inner();
    if !is_uuid(&donor_id) {
        return bad_request("Validation failed", "donor_id must be a UUID");
    }

    match state.repository.connection_requests_for_donor(&donor_id).await {
        Ok(requests) => HttpResponse::Ok().json(ConnectionRequestsResponse {
            total: requests.len(),
            requests,
        }),
        Err(e) => repository_error_response("Failed to fetch connection requests", &e),
    }
}

/// Connection requests a hospital has sent, newest first
///
/// GET /api/v1/hospitals/{hospital_id}/connection-requests
async fn list_for_hospital(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let hospital_id = path.into_inner();
    if !is_uuid(&hospital_id) {
        return bad_request("Validation failed", "hospital_id must be a UUID");
    }

    match state.repository.connection_requests_for_hospital(&hospital_id).await {
        Ok(requests) => HttpResponse::Ok().json(ConnectionRequestsResponse {
            total: requests.len(),
            requests,
        }),
        Err(e) => repository_error_response("Failed to fetch connection requests", &e),
    }
}

/// Accept, reject or complete a connection request
///
/// PATCH /api/v1/connection-requests/{id}
async fn update_connection_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateConnectionRequest>,
) -> HttpResponse {
    let request_id = path.into_inner();
    if !is_uuid(&request_id) {
        return bad_request("Validation failed", "id must be a UUID");
    }

    let status = match ConnectionStatus::parse(&req.status) {
        Some(status @ (ConnectionStatus::Accepted | ConnectionStatus::Rejected | ConnectionStatus::Completed)) => status,
        _ => {
            return bad_request("Invalid status", "Status must be one of: accepted, rejected, completed");
        }
    };

    match state.repository.update_connection_status(&request_id, status).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => repository_error_response("Failed to update connection request", &e),
    }
}
