//! ConfigHub HTTP client.
//!
//! Blocking `reqwest` implementation of `RemoteStore` against the ConfigHub
//! REST API rooted at `<server>/api`. Requests carry the bearer token from
//! the `cub` context and time out after `defaults::REMOTE_TIMEOUT`.
//!
//! Lookups use the server-side `where` filter (`Slug = '<slug>'`); list
//! responses wrap each entity as `{"Space": {...}}` or `{"Unit": {...}}`.

use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::Labels;
use crate::context::Credentials;
use crate::defaults::REMOTE_TIMEOUT;
use crate::error::{Error, Result};
use crate::remote::{RemoteStore, Space, Unit, UnitSpec};

#[derive(Debug, Deserialize)]
struct ExtendedSpace {
    #[serde(rename = "Space")]
    space: Option<Space>,
}

#[derive(Debug, Deserialize)]
struct ExtendedUnit {
    #[serde(rename = "Unit")]
    unit: Option<Unit>,
}

/// `RemoteStore` backed by the ConfigHub API.
pub struct ConfigHubClient {
    http: Client,
    api: Url,
    token: String,
}

impl ConfigHubClient {
    /// Client for `server_url` (without the `/api` suffix).
    pub fn new(server_url: &str, token: &str) -> Result<Self> {
        let api = Url::parse(&format!("{}/api", server_url.trim_end_matches('/')))?;
        if api.cannot_be_a_base() {
            return Err(Error::Validation {
                message: format!("server URL {} cannot be used as an API base", server_url),
                hint: None,
            });
        }
        let http = Client::builder()
            .timeout(REMOTE_TIMEOUT)
            .user_agent(concat!("cub-compose/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Remote {
                operation: "client setup".to_string(),
                status: None,
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            api,
            token: token.to_string(),
        })
    }

    /// Client for the server and token of a loaded `cub` context.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        Self::new(&credentials.server_url, &credentials.access_token)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(segments))
            .bearer_auth(&self.token)
    }

    /// Send `request`, accepting only the `expected` statuses.
    fn send(&self, operation: &str, request: RequestBuilder, expected: &[StatusCode]) -> Result<Response> {
        let response = request.send().map_err(|e| Error::Remote {
            operation: operation.to_string(),
            status: None,
            message: e.to_string(),
        })?;
        let status = response.status();
        debug!("{} -> {}", operation, status);

        if expected.contains(&status) {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(status_error(operation, status, body.trim()))
    }

    fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        response.json().map_err(|e| Error::Remote {
            operation: operation.to_string(),
            status: None,
            message: format!("unreadable response: {}", e),
        })
    }
}

fn status_error(operation: &str, status: StatusCode, body: &str) -> Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Auth {
            message: format!("{} was rejected (HTTP {})", operation, status.as_u16()),
            hint: Some("Run 'cub auth login' to refresh your credentials".to_string()),
        };
    }
    let message = if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body.to_string()
    };
    Error::Remote {
        operation: operation.to_string(),
        status: Some(status.as_u16()),
        message,
    }
}

/// Server-side filter matching `slug` exactly.
fn slug_filter(slug: &str) -> String {
    format!("Slug = '{}'", slug.replace('\'', "''"))
}

const OK: &[StatusCode] = &[StatusCode::OK];
const CREATED: &[StatusCode] = &[StatusCode::OK, StatusCode::CREATED];
const DELETED: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];

impl RemoteStore for ConfigHubClient {
    fn list_spaces(&self, slug: &str) -> Result<Vec<Space>> {
        let request = self
            .request(Method::GET, &["space"])
            .query(&[("where", slug_filter(slug))]);
        let response = self.send("list spaces", request, OK)?;
        let spaces: Vec<ExtendedSpace> = Self::decode("list spaces", response)?;
        Ok(spaces.into_iter().filter_map(|s| s.space).collect())
    }

    fn create_space(&self, slug: &str, display_name: &str, labels: &Labels) -> Result<Space> {
        let body = Space {
            slug: slug.to_string(),
            display_name: display_name.to_string(),
            labels: labels.clone(),
            ..Default::default()
        };
        let request = self.request(Method::POST, &["space"]).json(&body);
        let response = self.send("create space", request, CREATED)?;
        Self::decode("create space", response)
    }

    fn list_units(&self, space_id: &str, slug: &str) -> Result<Vec<Unit>> {
        let request = self
            .request(Method::GET, &["space", space_id, "unit"])
            .query(&[("where", slug_filter(slug))]);
        let response = self.send("list units", request, OK)?;
        let units: Vec<ExtendedUnit> = Self::decode("list units", response)?;
        Ok(units.into_iter().filter_map(|u| u.unit).collect())
    }

    fn create_unit(&self, space_id: &str, spec: &UnitSpec) -> Result<Unit> {
        let body = unit_body(space_id, "", spec);
        let request = self
            .request(Method::POST, &["space", space_id, "unit"])
            .json(&body);
        let response = self.send("create unit", request, CREATED)?;
        Self::decode("create unit", response)
    }

    fn update_unit(&self, space_id: &str, unit_id: &str, spec: &UnitSpec) -> Result<Unit> {
        let body = unit_body(space_id, unit_id, spec);
        let request = self
            .request(Method::PUT, &["space", space_id, "unit", unit_id])
            .json(&body);
        let response = self.send("update unit", request, OK)?;
        Self::decode("update unit", response)
    }

    fn delete_unit(&self, space_id: &str, unit_id: &str) -> Result<()> {
        let request = self.request(Method::DELETE, &["space", space_id, "unit", unit_id]);
        self.send("delete unit", request, DELETED)?;
        Ok(())
    }

    fn probe(&self) -> Result<()> {
        let request = self.request(Method::GET, &["space"]);
        self.send("probe", request, OK)?;
        Ok(())
    }
}

fn unit_body(space_id: &str, unit_id: &str, spec: &UnitSpec) -> Unit {
    Unit {
        unit_id: unit_id.to_string(),
        space_id: space_id.to_string(),
        slug: spec.slug.clone(),
        display_name: spec.display_name.clone(),
        data: spec.data.clone(),
        labels: spec.labels.clone(),
        toolchain_type: spec.toolchain_type.clone(),
    }
}
