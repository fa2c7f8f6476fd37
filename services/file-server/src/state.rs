use std::sync::Arc;

use crate::integrity::IntegrityService;
use crate::persistence::Persistence;

pub type Service = IntegrityService<Box<dyn Persistence>>;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub service: Service,
}

impl AppState {
    pub fn new(service: Service) -> Self {
        Self { service }
    }
}
