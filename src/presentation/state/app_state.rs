use std::sync::Arc;

use crate::application::services::ScannerService;

#[derive(Clone)]
pub struct AppState {
    pub scanner_service: Arc<ScannerService>,
}

impl AppState {
    pub fn new(scanner_service: Arc<ScannerService>) -> Self {
        Self { scanner_service }
    }
}
