use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::auth::identity::IdentityClient;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum
/// extractors. Everything here is internally synchronized and cheap to
/// clone, so requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub identity: IdentityClient,
    pub config: Config,
}
