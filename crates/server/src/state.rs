use std::sync::Arc;

use service::Services;

/// Shared handler state: the service bundle plus the admin shared secret.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub admin_secret: Arc<str>,
}

impl AppState {
    pub fn new(services: Services, admin_secret: &str) -> Self {
        Self { services, admin_secret: Arc::from(admin_secret) }
    }
}
