/// Collaborator API endpoint configuration from environment variables
pub mod api;

/// Staff operator identity from environment variables
pub mod operator;

/// Terminal settings loading from config.toml
pub mod settings;

pub use api::ApiConfig;
pub use operator::operator_user_id;
pub use settings::{AppSettings, OnlineSettings, PrintSettings, load_settings};
