use std::time::Duration;

/// Configuration for the gRPC blob backend client
#[derive(Debug, Clone)]
pub struct GrpcBackendConfig {
    /// Backend endpoint, e.g. `http://blobs:50051` (scheme optional)
    pub addr: String,

    /// Dial timeout for the underlying channel
    pub connect_timeout: Duration,

    /// Upload chunks buffered between the reader and the RPC stream
    pub upload_buffer: usize,
}

impl Default for GrpcBackendConfig {
    fn default() -> Self {
        Self {
            addr: "http://127.0.0.1:50051".to_string(),
            connect_timeout: Duration::from_secs(5),
            upload_buffer: 4,
        }
    }
}

impl GrpcBackendConfig {
    /// Create a new config with defaults
    pub fn new<S: Into<String>>(addr: S) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    /// Set dial timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set upload buffer depth
    pub fn with_upload_buffer(mut self, chunks: usize) -> Self {
        self.upload_buffer = chunks.max(1);
        self
    }

    /// Endpoint URI with an `http://` scheme added when none is given
    pub fn endpoint_uri(&self) -> String {
        if self.addr.starts_with("http://") || self.addr.starts_with("https://") {
            self.addr.clone()
        } else {
            format!("http://{}", self.addr)
        }
    }
}
