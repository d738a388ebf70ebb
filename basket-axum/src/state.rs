use basket_files::FileService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: FileService,
    /// Upload bodies are buffered up to this many bytes plus one
    pub max_file_size: u64,
}

impl AppState {
    pub fn new(service: FileService) -> Self {
        let max_file_size = service.config().max_file_size;
        Self { service, max_file_size }
    }
}
