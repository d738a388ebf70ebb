use basket_blob::DEFAULT_CHUNK_SIZE;

/// Default upload limit: 100 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Limits applied by [`crate::FileService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileServiceConfig {
    /// Largest declared size accepted by upload, in bytes
    pub max_file_size: u64,
    /// Read size when feeding an upload to the blob backend
    pub chunk_size: usize,
}

impl FileServiceConfig {
    pub fn new(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}
