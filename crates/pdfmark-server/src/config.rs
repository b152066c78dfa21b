//! Server configuration from `PDFMARK_*` environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default upload ceiling: 100 000 KiB.
pub const DEFAULT_MAX_UPLOAD_KIB: u64 = 100_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind: SocketAddr,
    /// Directory that holds `pdfs/` and `annotated/`.
    pub storage_root: PathBuf,
    /// Base of the public URLs handed back to clients, without trailing `/`.
    pub public_base_url: String,
    /// Largest accepted PDF, in KiB.
    pub max_upload_kib: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3030)),
            storage_root: PathBuf::from("storage"),
            public_base_url: "http://localhost:3030".to_string(),
            max_upload_kib: DEFAULT_MAX_UPLOAD_KIB,
        }
    }
}

impl ServerConfig {
    /// Read the configuration, falling back to defaults for anything unset
    /// or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind: env::var("PDFMARK_BIND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bind),
            storage_root: env::var("PDFMARK_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_root),
            public_base_url: env::var("PDFMARK_PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            max_upload_kib: env::var("PDFMARK_MAX_UPLOAD_KIB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_kib),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_kib.saturating_mul(1024)).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.max_upload_kib, 100_000);
        assert_eq!(config.max_upload_bytes(), 102_400_000);
        assert_eq!(config.bind.port(), 3030);
    }
}
