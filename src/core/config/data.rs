use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which backend layout a submission is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EndpointMode {
    /// One POST to the ask endpoint; free-text questions, image optional.
    Single,
    /// Concurrent POSTs to the ask and image-data endpoints; image required.
    #[default]
    Dual,
}

impl EndpointMode {
    pub fn requires_attachment(self) -> bool {
        matches!(self, EndpointMode::Dual)
    }

    pub fn accepts_question(self) -> bool {
        matches!(self, EndpointMode::Single)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndpointMode::Single => "single",
            EndpointMode::Dual => "dual",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// `single` or `dual`
    pub mode: Option<EndpointMode>,
    /// Endpoint answering free-text questions about an image
    pub ask_url: Option<String>,
    /// Endpoint returning classifier predictions (dual mode only)
    pub image_data_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// File receiving diagnostic tracing output
    pub debug_log: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
