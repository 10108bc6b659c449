use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
pub mod models;
pub use models::*;

/// Loads the application configuration.
///
/// Sources, later ones winning: `config/default.*`, `config/{RUN_ENV}.*`,
/// then `{PREFIX}_SECTION__KEY` environment variables. Values written as
/// `"secret_from_env"` are then resolved from the environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "BOOKING".to_string());
    let config_dir = config_dir();

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(&prefix)
                .separator("__")
                .try_parsing(true),
        );

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// `CONFIG_DIR` if set, else `./config`, else the workspace `config/` directory.
fn config_dir() -> PathBuf {
    if let Ok(dir) = env::var("CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let local = PathBuf::from("config");
    if local.is_dir() {
        return local;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2) // crates/booking_config -> workspace root
        .map(|root| root.join("config"))
        .unwrap_or(local)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
    fn walk(path: &mut Vec<String>, obj: &mut Value, lookup: &dyn Fn(&str) -> Option<String>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v, lookup);
                    path.pop();
                }
            }
            Value::String(s) if s == "secret_from_env" => {
                let env_key = path.join("_").to_uppercase();
                match lookup(&env_key) {
                    Some(env_val) => *obj = Value::String(env_val),
                    None => eprintln!("Warning: env var {} not found for secret_from_env", env_key),
                }
            }
            _ => {}
        }
    }

    walk(&mut Vec::new(), value, lookup);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    resolve_secrets_with(config, &|key| env::var(key).ok())
}

fn resolve_secrets_with(
    config: AppConfig,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config).map_err(|e| ConfigError::Message(e.to_string()))?;
    inject_env_secrets(&mut json, lookup);
    serde_json::from_value(json).map_err(|e| ConfigError::Message(e.to_string()))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file once per process and returns the path that was used.
///
/// The path comes from `DOTENV_OVERRIDE`, else from a first CLI argument
/// starting with `.env`, else `.env`.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = std::env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_yaml(yaml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = from_yaml("server:\n  host: 0.0.0.0\n  port: 9000\n");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.email.provider, EmailProviderKind::Log);
        assert_eq!(config.booking.slots.morning, vec!["09:00", "10:00", "11:00"]);
        assert_eq!(config.booking.default_duration_minutes, 60);
        assert!(config.database.is_none());
        assert!(!config.use_calendar);
    }

    #[test]
    fn test_missing_server_section_is_an_error() {
        let result = Config::builder()
            .add_source(File::from_str("use_calendar: true\n", FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_marker_is_resolved_from_lookup() {
        let config = from_yaml(
            "server:\n  host: 0.0.0.0\n  port: 9000\nemail:\n  provider: brevo\nbrevo:\n  api_key: secret_from_env\n",
        );
        let resolved = resolve_secrets_with(config, &|key| {
            (key == "BREVO_API_KEY").then(|| "xkeysib-test".to_string())
        })
        .unwrap();
        assert_eq!(resolved.email.provider, EmailProviderKind::Brevo);
        assert_eq!(resolved.brevo.unwrap().api_key, "xkeysib-test");
    }

    #[test]
    fn test_unresolved_secret_marker_is_left_in_place() {
        let config = from_yaml(
            "server:\n  host: 0.0.0.0\n  port: 9000\nbrevo:\n  api_key: secret_from_env\n",
        );
        let resolved = resolve_secrets_with(config, &|_| None).unwrap();
        assert_eq!(resolved.brevo.unwrap().api_key, "secret_from_env");
    }
}
