use std::time::Duration;

use crate::core::config::data::{Config, EndpointMode};

pub const DEFAULT_ASK_URL: &str = "http://81.94.159.202:5000/ask";
pub const DEFAULT_IMAGE_DATA_URL: &str = "http://81.94.159.202/get_image_data/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

impl Config {
    pub fn mode(&self) -> EndpointMode {
        self.mode.unwrap_or_default()
    }

    pub fn ask_url(&self) -> &str {
        self.ask_url.as_deref().unwrap_or(DEFAULT_ASK_URL)
    }

    pub fn image_data_url(&self) -> &str {
        self.image_data_url
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_DATA_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
