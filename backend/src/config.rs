use clap::Parser;
use std::path::PathBuf;

/// Runtime configuration of the templating server.
#[derive(Parser, Debug, Clone)]
#[command(name = "templify")]
#[command(about = "Serves the docx templating app and stores templates, sessions and rows")]
pub struct AppConfig {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "TEMPLIFY_HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value = "8080", env = "TEMPLIFY_PORT")]
    pub port: u16,

    /// SQLite database file
    #[arg(long, default_value = "templify.sqlite", env = "TEMPLIFY_DATABASE")]
    pub database: PathBuf,

    /// Directory receiving the zip bundles produced by merge jobs
    #[arg(long, default_value = "./generated", env = "TEMPLIFY_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Largest accepted .docx upload, in bytes
    #[arg(long, default_value_t = 5 * 1024 * 1024, env = "TEMPLIFY_MAX_DOCUMENT_BYTES")]
    pub max_document_bytes: usize,

    /// Largest accepted JSON body, in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "TEMPLIFY_JSON_LIMIT_BYTES")]
    pub json_limit_bytes: usize,

    /// Do not open a browser window on start
    #[arg(long, env = "TEMPLIFY_NO_BROWSER")]
    pub no_browser: bool,
}

impl AppConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
impl AppConfig {
    /// Configuration pointing at a scratch directory.
    pub fn for_tests(dir: &std::path::Path) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database: dir.join("test.sqlite"),
            output_dir: dir.join("generated"),
            max_document_bytes: 5 * 1024 * 1024,
            json_limit_bytes: 10 * 1024 * 1024,
            no_browser: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_arguments() {
        let config = AppConfig::try_parse_from(["templify"]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_document_bytes, 5 * 1024 * 1024);
        assert_eq!(config.url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn flags_override_defaults() {
        let config =
            AppConfig::try_parse_from(["templify", "--port", "9000", "--no-browser", "--database", "x.db"]).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.no_browser);
        assert_eq!(config.database, PathBuf::from("x.db"));
    }
}
