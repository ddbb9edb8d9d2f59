mod loader;

pub use loader::{AndroidConfig, Config, ReportConfig};
