pub mod generate;
pub mod onboard;
pub mod play;
pub mod serve;
pub mod status;

use agentquest_config::AppConfig;

pub fn load_config() -> Result<AppConfig, String> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))
}
