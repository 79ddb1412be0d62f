// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{BloodGroup, Urgency, DonorRecord, DonorFilter, ConnectionRequest, ConnectionStatus, NewConnectionRequest, UnknownBloodGroup};
pub use requests::{MatchQuery, SearchDonorsQuery, CreateConnectionRequest, UpdateConnectionRequest};
pub use responses::{MatchDonorsResponse, SearchDonorsResponse, ConnectionRequestsResponse, HealthResponse, ErrorResponse};
