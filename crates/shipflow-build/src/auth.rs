//! レジストリ認証
//!
//! `~/.docker/config.json`（または `$DOCKER_CONFIG/config.json`）の
//! `auths` と credential helper (`credsStore`, `credHelpers`) から
//! プッシュ用の認証情報を解決します。

use crate::error::{BuildError, BuildResult};
use base64::Engine;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

const DOCKER_HUB: &str = "docker.io";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    #[serde(default)]
    auths: HashMap<String, StoredAuth>,
    #[serde(default)]
    creds_store: Option<String>,
    /// レジストリごとの credential helper
    #[serde(default)]
    cred_helpers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StoredAuth {
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HelperCredentials {
    username: String,
    secret: String,
}

/// イメージ参照からレジストリホストを取り出す
///
/// - `ghcr.io/org/app:1.0` -> `ghcr.io`
/// - `localhost:5000/app` -> `localhost:5000`
/// - `zwh188222/densematrix:api-0.5.1` -> `docker.io`
pub fn registry_host(image: &str) -> &str {
    match image.split_once('/') {
        Some((first, _)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            first
        }
        _ => DOCKER_HUB,
    }
}

#[derive(Debug, Clone)]
pub struct RegistryAuth {
    config_path: PathBuf,
}

impl Default for RegistryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryAuth {
    pub fn new() -> Self {
        let docker_dir = std::env::var_os("DOCKER_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".docker")))
            .unwrap_or_else(|| PathBuf::from(".docker"));

        Self {
            config_path: docker_dir.join("config.json"),
        }
    }

    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// プッシュ先イメージの認証情報
    ///
    /// 設定ファイルがない、または該当レジストリのエントリがない場合は `Ok(None)`。
    pub fn credentials_for(&self, image: &str) -> BuildResult<Option<DockerCredentials>> {
        let host = registry_host(image);

        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "Docker client config not found");
            return Ok(None);
        }

        let config = self.read_config()?;

        // Docker Hub は "https://index.docker.io/v1/" で保存されていることが多い
        let keys: Vec<&str> = if host == DOCKER_HUB {
            vec![DOCKER_HUB, "https://index.docker.io/v1/", "index.docker.io"]
        } else {
            vec![host]
        };

        for key in &keys {
            if let Some(encoded) = config.auths.get(*key).and_then(|a| a.auth.as_deref())
                && let Some(creds) = decode_basic_auth(encoded, host)?
            {
                tracing::debug!(registry = host, "Using stored credentials");
                return Ok(Some(creds));
            }
        }

        let helper = keys
            .iter()
            .find_map(|key| config.cred_helpers.get(*key))
            .or(config.creds_store.as_ref());

        if let Some(helper) = helper {
            for key in &keys {
                if let Some(creds) = query_helper(helper, key, host)? {
                    tracing::debug!(registry = host, helper = %helper, "Using credential helper");
                    return Ok(Some(creds));
                }
            }
        }

        tracing::debug!(registry = host, "No credentials configured");
        Ok(None)
    }

    fn read_config(&self) -> BuildResult<ClientConfig> {
        let auth_error = |message: String| BuildError::AuthFailed {
            registry: self.config_path.display().to_string(),
            message,
        };

        let content = std::fs::read_to_string(&self.config_path)
            .map_err(|e| auth_error(format!("cannot read config.json: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| auth_error(format!("cannot parse config.json: {}", e)))
    }
}

fn decode_basic_auth(encoded: &str, host: &str) -> BuildResult<Option<DockerCredentials>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| BuildError::AuthFailed {
            registry: host.to_string(),
            message: format!("invalid base64 auth: {}", e),
        })?;
    let pair = String::from_utf8(bytes).map_err(|e| BuildError::AuthFailed {
        registry: host.to_string(),
        message: format!("auth is not UTF-8: {}", e),
    })?;

    Ok(pair.split_once(':').map(|(user, pass)| DockerCredentials {
        username: Some(user.to_string()),
        password: Some(pass.to_string()),
        serveraddress: Some(host.to_string()),
        ..Default::default()
    }))
}

/// `docker-credential-<helper> get` を実行
///
/// helper が該当エントリを持たない場合（非ゼロ終了）は `Ok(None)`。
fn query_helper(helper: &str, server: &str, host: &str) -> BuildResult<Option<DockerCredentials>> {
    let program = format!("docker-credential-{}", helper);

    let mut child = match Command::new(&program)
        .arg("get")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(helper = %program, error = %e, "Credential helper is not runnable");
            return Ok(None);
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(server.as_bytes())?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Ok(None);
    }

    let response: HelperCredentials =
        serde_json::from_slice(&output.stdout).map_err(|e| BuildError::AuthFailed {
            registry: host.to_string(),
            message: format!("unexpected {} response: {}", program, e),
        })?;

    Ok(Some(DockerCredentials {
        username: Some(response.username),
        password: Some(response.secret),
        serveraddress: Some(host.to_string()),
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_registry_host() {
        assert_eq!(registry_host("ghcr.io/org/app:1.0"), "ghcr.io");
        assert_eq!(registry_host("localhost:5000/app"), "localhost:5000");
        assert_eq!(registry_host("localhost/app"), "localhost");
        assert_eq!(registry_host("zwh188222/densematrix:api-0.5.1"), "docker.io");
        assert_eq!(registry_host("nginx:alpine"), "docker.io");
        assert_eq!(
            registry_host("123456789.dkr.ecr.ap-northeast-1.amazonaws.com/app"),
            "123456789.dkr.ecr.ap-northeast-1.amazonaws.com"
        );
    }

    #[test]
    fn test_credentials_from_auths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        // "ci:s3cret"
        fs::write(
            &path,
            r#"{"auths": {"ghcr.io": {"auth": "Y2k6czNjcmV0"}}}"#,
        )
        .unwrap();

        let auth = RegistryAuth::with_config_path(path);
        let creds = auth.credentials_for("ghcr.io/org/dist:api-1.0").unwrap().unwrap();
        assert_eq!(creds.username.as_deref(), Some("ci"));
        assert_eq!(creds.password.as_deref(), Some("s3cret"));
        assert_eq!(creds.serveraddress.as_deref(), Some("ghcr.io"));
    }

    #[test]
    fn test_credentials_docker_hub_legacy_key() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"auths": {"https://index.docker.io/v1/": {"auth": "Y2k6czNjcmV0"}}}"#,
        )
        .unwrap();

        let auth = RegistryAuth::with_config_path(path);
        let creds = auth.credentials_for("acme/dist:api-1.0").unwrap();
        assert!(creds.is_some());
    }

    #[test]
    fn test_credentials_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let auth = RegistryAuth::with_config_path(temp_dir.path().join("config.json"));
        assert!(auth.credentials_for("ghcr.io/org/app").unwrap().is_none());
    }

    #[test]
    fn test_credentials_invalid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let auth = RegistryAuth::with_config_path(path);
        let result = auth.credentials_for("ghcr.io/org/app");
        assert!(matches!(result, Err(BuildError::AuthFailed { .. })));
    }

    #[test]
    fn test_docker_config_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        temp_env::with_var("DOCKER_CONFIG", Some(temp_dir.path()), || {
            let auth = RegistryAuth::new();
            assert_eq!(auth.config_path, temp_dir.path().join("config.json"));
        });
    }
}
