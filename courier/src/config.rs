//! Backend transport configuration.
//!
//! Sources, highest precedence first: command-line flags, environment
//! variables (`COURIER_BACKEND`, `COURIER_URL`, `COURIER_TOKEN`, also read from
//! a `.env` file), the JSON file given with `--config`.
//!
//! ```json
//! { "transport": { "kind": "stdio", "program": "./backend", "args": ["--ipc"], "timeout_ms": 10000 } }
//! { "transport": { "kind": "http", "url": "http://127.0.0.1:7000", "token": "..." } }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use courier_core::transport::Transport;
use courier_transports::{HttpOptions, HttpTransport, StdioTransport};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    Stdio {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Http {
        url: String,
        #[serde(default)]
        token: Option<SecretString>,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

/// Values taken from flags or the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub backend: Option<PathBuf>,
    pub backend_args: Vec<String>,
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Picks the transport to use. A stdio backend wins over a URL.
pub fn resolve(overrides: Overrides, file: Config) -> Result<TransportConfig> {
    if let Some(program) = overrides.backend {
        // The file's program and args are replaced; its env and timeout still apply.
        let (env, file_timeout) = match file.transport {
            Some(TransportConfig::Stdio { env, timeout_ms, .. }) => (env, timeout_ms),
            _ => (HashMap::new(), None),
        };
        return Ok(TransportConfig::Stdio {
            program,
            args: overrides.backend_args,
            env,
            timeout_ms: overrides.timeout_ms.or(file_timeout),
        });
    }
    if let Some(url) = overrides.url {
        return Ok(TransportConfig::Http {
            url,
            token: overrides.token.map(SecretString::from),
            timeout_ms: overrides.timeout_ms,
        });
    }

    match file.transport {
        Some(TransportConfig::Stdio { program, mut args, env, timeout_ms }) => {
            args.extend(overrides.backend_args);
            Ok(TransportConfig::Stdio {
                program,
                args,
                env,
                timeout_ms: overrides.timeout_ms.or(timeout_ms),
            })
        }
        Some(TransportConfig::Http { url, token, timeout_ms }) => Ok(TransportConfig::Http {
            url,
            token: overrides.token.map(SecretString::from).or(token),
            timeout_ms: overrides.timeout_ms.or(timeout_ms),
        }),
        None => anyhow::bail!(
            "No backend configured. Pass --backend or --url, set COURIER_BACKEND or COURIER_URL, or use --config."
        ),
    }
}

pub fn build_transport(config: TransportConfig) -> Result<Arc<dyn Transport>> {
    match config {
        TransportConfig::Stdio { program, args, env, timeout_ms } => {
            tracing::info!("Using stdio backend {}", program.display());
            let mut transport = StdioTransport::new(program).args(args).envs(env);
            if let Some(ms) = timeout_ms {
                transport = transport.timeout(Duration::from_millis(ms));
            }
            Ok(Arc::new(transport))
        }
        TransportConfig::Http { url, token, timeout_ms } => {
            tracing::info!("Using HTTP backend {}", url);
            let mut options = HttpOptions {
                token,
                ..Default::default()
            };
            if let Some(ms) = timeout_ms {
                options.timeout = Duration::from_millis(ms);
            }
            let transport = HttpTransport::new(&url, options)
                .with_context(|| format!("Cannot use backend URL '{}'", url))?;
            Ok(Arc::new(transport))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn file(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn flags_beat_config_file() {
        let overrides = Overrides {
            backend: Some("/usr/local/bin/backend".into()),
            ..Default::default()
        };
        let config = file(r#"{"transport":{"kind":"http","url":"http://127.0.0.1:7000"}}"#);

        match resolve(overrides, config).unwrap() {
            TransportConfig::Stdio { program, .. } => {
                assert_eq!(program, PathBuf::from("/usr/local/bin/backend"))
            }
            other => panic!("unexpected transport: {other:?}"),
        }
    }

    #[test]
    fn file_values_are_overridden_field_by_field() {
        let overrides = Overrides {
            backend_args: vec!["--trace".into()],
            timeout_ms: Some(500),
            ..Default::default()
        };
        let config = file(
            r#"{"transport":{"kind":"stdio","program":"./backend","args":["--ipc"],"env":{"MODE":"test"},"timeout_ms":9000}}"#,
        );

        match resolve(overrides, config).unwrap() {
            TransportConfig::Stdio { program, args, env, timeout_ms } => {
                assert_eq!(program, PathBuf::from("./backend"));
                assert_eq!(args, vec!["--ipc", "--trace"]);
                assert_eq!(env.get("MODE").map(String::as_str), Some("test"));
                assert_eq!(timeout_ms, Some(500));
            }
            other => panic!("unexpected transport: {other:?}"),
        }
    }

    #[test]
    fn backend_flag_keeps_file_env_and_timeout() {
        let overrides = Overrides {
            backend: Some("/opt/backend-next".into()),
            backend_args: vec!["--ipc".into()],
            ..Default::default()
        };
        let config = file(
            r#"{"transport":{"kind":"stdio","program":"./backend","args":["--old"],"env":{"MODE":"test"},"timeout_ms":9000}}"#,
        );

        match resolve(overrides, config).unwrap() {
            TransportConfig::Stdio { program, args, env, timeout_ms } => {
                assert_eq!(program, PathBuf::from("/opt/backend-next"));
                assert_eq!(args, vec!["--ipc"]);
                assert_eq!(env.get("MODE").map(String::as_str), Some("test"));
                assert_eq!(timeout_ms, Some(9000));
            }
            other => panic!("unexpected transport: {other:?}"),
        }
    }

    #[test]
    fn token_flag_replaces_file_token() {
        let overrides = Overrides {
            token: Some("from-env".into()),
            ..Default::default()
        };
        let config = file(r#"{"transport":{"kind":"http","url":"http://h","token":"from-file"}}"#);

        match resolve(overrides, config).unwrap() {
            TransportConfig::Http { token, .. } => {
                assert_eq!(token.unwrap().expose_secret(), "from-env");
            }
            other => panic!("unexpected transport: {other:?}"),
        }
    }

    #[test]
    fn nothing_configured_is_an_error() {
        let err = resolve(Overrides::default(), Config::default()).unwrap_err();
        assert!(err.to_string().contains("No backend configured"));
    }

    #[test]
    fn bad_url_fails_to_build() {
        let config = TransportConfig::Http {
            url: "::not a url::".into(),
            token: None,
            timeout_ms: None,
        };
        assert!(build_transport(config).is_err());
    }

    #[tokio::test]
    async fn loads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.json");
        tokio::fs::write(&path, r#"{"transport":{"kind":"http","url":"http://127.0.0.1:7000","timeout_ms":100}}"#)
            .await
            .unwrap();

        let config = Config::load(&path).await.unwrap();

        assert!(matches!(
            config.transport,
            Some(TransportConfig::Http { timeout_ms: Some(100), .. })
        ));
    }
}
