// Service exports
pub mod ai_gateway;
pub mod postgres;
pub mod repository;
pub mod supabase;

pub use ai_gateway::{AiGatewayClient, Prompt, RankingService, RankingServiceError};
pub use postgres::PostgresRepository;
pub use repository::{DonorRepository, RepositoryError};
pub use supabase::SupabaseClient;
