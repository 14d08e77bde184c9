use crate::redact::redact_secrets;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, USER_AGENT};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

pub const PATH_LOGIN: &str = "/auth/login";
pub const PATH_REGISTER: &str = "/auth/register";
pub const PATH_VALIDATE: &str = "/auth/validate";
pub const PATH_LOGOUT: &str = "/auth/logout";
pub const PATH_REFRESH: &str = "/auth/refresh";
pub const PATH_HEALTH: &str = "/auth/health";

const MAX_TEXT_ERROR_LEN: usize = 300;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(40);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("network error: {0}")]
  Network(String),
  #[error("HTTP {status}")]
  Status { status: u16, message: Option<String> },
  #[error("invalid json: {0}")]
  Json(String),
  #[error("invalid base url: {0}")]
  InvalidBaseUrl(String),
}

impl ApiError {
  fn network(err: reqwest::Error) -> Self {
    Self::Network(redact_secrets(&err.to_string()).into_owned())
  }
}

pub enum RequestBody {
  Json(Value),
  Multipart(reqwest::multipart::Form),
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
  status: u16,
  body: String,
}

impl ApiResponse {
  pub fn status(&self) -> u16 {
    self.status
  }

  pub fn text(&self) -> &str {
    &self.body
  }

  pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
    serde_json::from_str(&self.body).map_err(|e| ApiError::Json(e.to_string()))
  }
}

#[derive(Debug, Clone)]
pub struct PublicDownload {
  pub bytes: Vec<u8>,
  pub file_name: Option<String>,
}

fn build_headers(bearer: Option<&str>) -> HeaderMap {
  let mut headers = HeaderMap::new();
  headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
  headers.insert(
    USER_AGENT,
    HeaderValue::from_static(concat!("minicloud/", env!("CARGO_PKG_VERSION"))),
  );
  if let Some(token) = bearer.map(str::trim).filter(|t| !t.is_empty()) {
    if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {token}")) {
      value.set_sensitive(true);
      headers.insert(AUTHORIZATION, value);
    }
  }
  headers
}

fn read_string(value: Option<&Value>) -> Option<String> {
  let s = value?.as_str()?.trim();
  if s.is_empty() {
    None
  } else {
    Some(s.to_string())
  }
}

/// Pulls a user-facing message out of a failure body: the `error` field of
/// a JSON object, a bare JSON string, or a short plain-text body.
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
  let trimmed = body.trim();
  if trimmed.is_empty() {
    return None;
  }

  match serde_json::from_str::<Value>(trimmed) {
    Ok(Value::Object(obj)) => read_string(obj.get("error")),
    Ok(value @ Value::String(_)) => read_string(Some(&value)),
    Ok(_) => None,
    Err(_) => {
      let is_markup = trimmed.starts_with('<');
      (!is_markup && trimmed.len() <= MAX_TEXT_ERROR_LEN).then(|| trimmed.to_string())
    }
  }
}

fn content_disposition_file_name(headers: &HeaderMap) -> Option<String> {
  let raw = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
  raw.split(';').map(str::trim).find_map(|part| {
    let value = part.strip_prefix("filename=")?;
    let value = value.trim_matches('"').trim();
    (!value.is_empty()).then(|| value.to_string())
  })
}

pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(base_url: &str) -> Result<Self, ApiError> {
    Self::with_timeouts(base_url, REQUEST_TIMEOUT, CONNECT_TIMEOUT)
  }

  /// Every request, including the body read, gives up after `request`.
  pub fn with_timeouts(base_url: &str, request: Duration, connect: Duration) -> Result<Self, ApiError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let base_url = Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
      return Err(ApiError::InvalidBaseUrl(format!(
        "{trimmed}: unsupported scheme"
      )));
    }
    let http = reqwest::Client::builder()
      .timeout(request)
      .connect_timeout(connect)
      .build()
      .map_err(ApiError::network)?;
    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  pub fn endpoint(&self, path: &str) -> String {
    format!(
      "{}/{}",
      self.base_url.as_str().trim_end_matches('/'),
      path.trim_start_matches('/')
    )
  }

  /// Public, unauthenticated download URL for a share token.
  pub fn public_url(&self, share_token: &str) -> String {
    self.endpoint(&format!("/public/{}", urlencoding::encode(share_token.trim())))
  }

  /// Joins a server-relative path (e.g. `/api/v1/public/ab12cd34`) with the
  /// origin of the base URL. Absolute URLs pass through unchanged.
  pub fn resolve_path(&self, path: &str) -> String {
    let path = path.trim();
    if path.starts_with("http://") || path.starts_with("https://") {
      return path.to_string();
    }
    format!(
      "{}/{}",
      self.base_url.origin().ascii_serialization(),
      path.trim_start_matches('/')
    )
  }

  pub async fn send(
    &self,
    method: Method,
    path: &str,
    bearer: Option<&str>,
    body: Option<RequestBody>,
  ) -> Result<ApiResponse, ApiError> {
    let url = self.endpoint(path);
    let mut req = self
      .http
      .request(method.clone(), &url)
      .headers(build_headers(bearer));
    req = match body {
      Some(RequestBody::Json(value)) => req.json(&value),
      Some(RequestBody::Multipart(form)) => req.multipart(form),
      None => req,
    };

    let res = req.send().await.map_err(|e| {
      tracing::debug!(%method, path, "request failed before a response arrived");
      ApiError::network(e)
    })?;

    let status = res.status();
    let body = res.text().await.map_err(ApiError::network)?;
    tracing::debug!(%method, path, status = status.as_u16(), "api response");

    if !status.is_success() {
      return Err(ApiError::Status {
        status: status.as_u16(),
        message: extract_error_message(&body),
      });
    }

    Ok(ApiResponse {
      status: status.as_u16(),
      body,
    })
  }

  pub async fn download_public(&self, share_token: &str) -> Result<PublicDownload, ApiError> {
    let res = self
      .http
      .get(self.public_url(share_token))
      .send()
      .await
      .map_err(ApiError::network)?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(ApiError::Status {
        status: status.as_u16(),
        message: extract_error_message(&body),
      });
    }

    let file_name = content_disposition_file_name(res.headers());
    let bytes = res.bytes().await.map_err(ApiError::network)?;
    Ok(PublicDownload {
      bytes: bytes.to_vec(),
      file_name,
    })
  }
}
