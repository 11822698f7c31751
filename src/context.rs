//! `cub` CLI context loading.
//!
//! cub-compose authenticates with whatever the `cub` CLI is logged in as.
//! The context lives in `<confighub dir>/config.yaml`:
//!
//! ```yaml
//! currentContext: acme
//! contexts:
//!   - name: acme
//!     coordinate:
//!       serverURL: https://hub.confighub.com
//!       organizationID: org_123
//!       user: dev@acme.io
//!     metadata:
//!       tokenFile: ~/.confighub/tokens/acme.json
//!       organizationName: Acme
//! ```
//!
//! and the token file it names holds `{"accessToken": "..."}`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::defaults::DEFAULT_SERVER_URL;
use crate::error::{Error, Result};

const LOGIN_HINT: &str = "Run 'cub auth login' first";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CubConfig {
    current_context: String,
    contexts: Vec<CubContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CubContext {
    name: String,
    coordinate: Coordinate,
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Coordinate {
    #[serde(rename = "serverURL")]
    server_url: String,
    #[serde(rename = "organizationID")]
    organization_id: String,
    user: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Metadata {
    token_file: String,
    organization_name: String,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// The current `cub` context, as shown by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub context_name: String,
    pub server_url: String,
    pub organization_id: String,
    pub organization_name: String,
    pub user: String,
    pub token_path: PathBuf,
}

/// What the remote client needs to authenticate.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub server_url: String,
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("server_url", &self.server_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Reads the `cub` context from a ConfigHub directory.
#[derive(Debug, Clone)]
pub struct ContextLoader {
    confighub_dir: PathBuf,
    home: PathBuf,
}

impl ContextLoader {
    pub fn new(confighub_dir: impl Into<PathBuf>) -> Self {
        Self {
            confighub_dir: confighub_dir.into(),
            home: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Override the home directory used to expand `~` in token paths.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.confighub_dir.join("config.yaml")
    }

    /// Load the current context without reading the token.
    pub fn load_info(&self) -> Result<ContextInfo> {
        let path = self.config_path();
        let raw = fs::read_to_string(&path).map_err(|e| Error::Auth {
            message: format!("failed to read cub config {}: {}", path.display(), e),
            hint: Some(LOGIN_HINT.to_string()),
        })?;
        let config: CubConfig = serde_yaml::from_str(&raw).map_err(|e| Error::Auth {
            message: format!("failed to parse cub config {}: {}", path.display(), e),
            hint: None,
        })?;

        let current = config
            .contexts
            .into_iter()
            .find(|c| c.name == config.current_context)
            .ok_or_else(|| Error::Auth {
                message: format!(
                    "current context {:?} not found in {}",
                    config.current_context,
                    path.display()
                ),
                hint: Some(LOGIN_HINT.to_string()),
            })?;

        if current.metadata.token_file.is_empty() {
            return Err(Error::Auth {
                message: format!("context {:?} names no token file", current.name),
                hint: Some(LOGIN_HINT.to_string()),
            });
        }

        Ok(ContextInfo {
            server_url: server_url(&current.coordinate.server_url)?,
            token_path: resolve_token_path(
                &self.home,
                &self.confighub_dir,
                &current.metadata.token_file,
            ),
            context_name: current.name,
            organization_id: current.coordinate.organization_id,
            organization_name: current.metadata.organization_name,
            user: current.coordinate.user,
        })
    }

    /// Load the current context and its access token.
    pub fn load_credentials(&self) -> Result<Credentials> {
        let info = self.load_info()?;
        Ok(Credentials {
            access_token: read_token(&info.token_path)?,
            server_url: info.server_url,
        })
    }
}

/// Validate the context's server URL, falling back to the public hub.
fn server_url(declared: &str) -> Result<String> {
    let candidate = if declared.is_empty() {
        DEFAULT_SERVER_URL
    } else {
        declared
    };
    let parsed = Url::parse(candidate).map_err(|e| Error::Auth {
        message: format!("invalid server URL {:?}: {}", candidate, e),
        hint: None,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Auth {
            message: format!("server URL {:?} must use http or https", candidate),
            hint: None,
        });
    }
    Ok(candidate.trim_end_matches('/').to_string())
}

/// Locate a token file named in the context.
///
/// Absolute paths are used as is and `~` expands to `home`. Any other name
/// is looked up by its file name in `<confighub dir>/tokens`.
pub fn resolve_token_path(home: &Path, confighub_dir: &Path, token_file: &str) -> PathBuf {
    let path = Path::new(token_file);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    if let Some(rest) = token_file.strip_prefix('~') {
        return home.join(rest.trim_start_matches(['/', '\\']));
    }
    let tokens = confighub_dir.join("tokens");
    match path.file_name() {
        Some(name) => tokens.join(name),
        None => tokens,
    }
}

fn read_token(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).map_err(|e| Error::Auth {
        message: format!("failed to read token {}: {}", path.display(), e),
        hint: Some(LOGIN_HINT.to_string()),
    })?;
    let token: TokenData = serde_json::from_str(&raw).map_err(|e| Error::Auth {
        message: format!("failed to parse token {}: {}", path.display(), e),
        hint: Some(LOGIN_HINT.to_string()),
    })?;
    if token.access_token.is_empty() {
        return Err(Error::Auth {
            message: format!("token {} is empty", path.display()),
            hint: Some(LOGIN_HINT.to_string()),
        });
    }
    Ok(token.access_token)
}
