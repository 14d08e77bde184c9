use crate::api::{RequestBody, PATH_HEALTH};
use crate::error::ClientError;
use crate::state::SessionManager;
use crate::types::{FileRecord, HealthStatus};
use crate::validation::require_upload_fields;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

const PATH_UPLOAD: &str = "/files/upload";
const PATH_MY_FILES: &str = "/files/my-files";

/// File and share operations for the signed-in user.
#[derive(Clone)]
pub struct FileService {
    session: SessionManager,
}

impl FileService {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn upload(
        &self,
        file_path: Option<&Path>,
        title: &str,
        description: &str,
    ) -> Result<FileRecord, ClientError> {
        let file_path = require_upload_fields(file_path, title)?;
        let bytes = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name))
            .text("title", title.trim().to_string())
            .text("desc", description.trim().to_string());

        let res = self
            .session
            .authorized_request(Method::POST, PATH_UPLOAD, Some(RequestBody::Multipart(form)))
            .await
            .map_err(|e| e.with_default("Upload failed"))?;
        let record: FileRecord = res
            .json()
            .map_err(|e| ClientError::from_api(e, "Upload failed"))?;
        info!(file_id = record.id, "file uploaded");
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<FileRecord>, ClientError> {
        let res = self
            .session
            .authorized_request(Method::GET, PATH_MY_FILES, None)
            .await
            .map_err(|e| e.with_default("Failed to load files"))?;
        res.json()
            .map_err(|e| ClientError::from_api(e, "Failed to load files"))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.session
            .authorized_request(Method::DELETE, &format!("/files/{id}"), None)
            .await
            .map_err(|e| e.with_default("Delete failed"))?;
        info!(file_id = id, "file deleted");
        Ok(())
    }

    /// Shares the file and returns its public URL.
    pub async fn share(&self, id: i64) -> Result<String, ClientError> {
        let res = self
            .session
            .authorized_request(Method::POST, &format!("/files/{id}/share"), None)
            .await
            .map_err(|e| e.with_default("Share failed"))?;
        let url = self.share_url_from_body(res.text()).ok_or_else(|| {
            ClientError::InvalidResponse("share response carried no public URL".to_string())
        })?;
        info!(file_id = id, "file shared");
        Ok(url)
    }

    pub async fn revoke_share(&self, id: i64) -> Result<(), ClientError> {
        self.session
            .authorized_request(Method::DELETE, &format!("/files/{id}/share"), None)
            .await
            .map_err(|e| e.with_default("Revoke failed"))?;
        info!(file_id = id, "file sharing revoked");
        Ok(())
    }

    /// `None` when the file is not currently shared.
    pub async fn share_status(&self, id: i64) -> Result<Option<String>, ClientError> {
        let res = self
            .session
            .authorized_request(Method::GET, &format!("/files/{id}/public-url"), None)
            .await
            .map_err(|e| e.with_default("Failed to get public URL"))?;
        let record = serde_json::from_str::<FileRecord>(res.text()).ok();
        Ok(record.and_then(|r| self.public_url_for(&r)))
    }

    /// Fetches a shared file without credentials and writes it to `dest`,
    /// or to the served file name in the current directory.
    pub async fn download_public(
        &self,
        share_token: &str,
        dest: Option<&Path>,
    ) -> Result<PathBuf, ClientError> {
        let share_token = share_token.trim();
        if share_token.is_empty() {
            return Err(ClientError::Validation(
                "Please provide a share token".to_string(),
            ));
        }

        let download = self
            .session
            .api()
            .download_public(share_token)
            .await
            .map_err(|e| ClientError::from_api(e, "Download failed"))?;

        let target = match dest {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(local_file_name(download.file_name.as_deref(), share_token)),
        };
        tokio::fs::write(&target, &download.bytes).await?;
        info!(bytes = download.bytes.len(), path = %target.display(), "public file downloaded");
        Ok(target)
    }

    pub async fn health(&self) -> Result<String, ClientError> {
        let res = self
            .session
            .api()
            .send(Method::GET, PATH_HEALTH, None, None)
            .await
            .map_err(|e| ClientError::from_api(e, "Health check failed"))?;
        let health: HealthStatus = res
            .json()
            .map_err(|e| ClientError::from_api(e, "Health check failed"))?;
        Ok(health.status)
    }

    pub fn public_url_for(&self, record: &FileRecord) -> Option<String> {
        record
            .share_token()
            .map(|token| self.session.api().public_url(token))
    }

    fn share_url_from_body(&self, body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(path)) if !path.trim().is_empty() => {
                Some(self.session.api().resolve_path(&path))
            }
            Ok(value @ Value::Object(_)) => serde_json::from_value::<FileRecord>(value)
                .ok()
                .and_then(|r| self.public_url_for(&r)),
            Ok(_) => None,
            Err(_) => Some(self.session.api().resolve_path(body)),
        }
    }
}

/// Keeps only the final path component of a served name so a download never
/// escapes the working directory.
fn local_file_name(served: Option<&str>, share_token: &str) -> String {
    served
        .and_then(|name| Path::new(name).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "..")
        .unwrap_or_else(|| share_token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::state::MemorySessionStore;
    use crate::types::Session;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer, signed_in: bool) -> FileService {
        let api = Arc::new(ApiClient::new(&format!("{}/api/v1", server.uri())).unwrap());
        let store = if signed_in {
            MemorySessionStore::with_session(&Session::new("T1", "a@b.com"))
        } else {
            MemorySessionStore::new()
        };
        FileService::new(SessionManager::restore(api, Arc::new(store)))
    }

    fn record_json(id: i64, tiny_url: Option<&str>) -> Value {
        json!({
            "id": id,
            "title": "Holiday",
            "description": "Beach",
            "fileSize": 2048,
            "uploadedAt": "2025-03-01T10:15:30",
            "tinyUrl": tiny_url,
        })
    }

    #[tokio::test]
    async fn upload_sends_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/upload"))
            .and(header("authorization", "Bearer T1"))
            .and(body_string_contains("name=\"title\""))
            .and(body_string_contains("Holiday"))
            .and(body_string_contains("filename=\"photo.jpg\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_json(7, None)))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"jpeg bytes").unwrap();

        let record = service(&server, true)
            .upload(Some(file.as_path()), "Holiday", "Beach")
            .await
            .unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.file_size, 2048);
    }

    #[tokio::test]
    async fn upload_without_title_never_reaches_the_network() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        std::fs::write(&file, b"x").unwrap();

        let err = service(&server, true)
            .upload(Some(file.as_path()), "  ", "")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please select a file and provide a title");
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_uses_server_message_or_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/upload"))
            .respond_with(ResponseTemplate::new(413).set_body_json(json!({"error": "File too large"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/upload"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.bin");
        std::fs::write(&file, b"x").unwrap();
        let files = service(&server, true);

        let first = files.upload(Some(file.as_path()), "Big", "").await.unwrap_err();
        assert_eq!(first.to_string(), "File too large");
        let second = files.upload(Some(file.as_path()), "Big", "").await.unwrap_err();
        assert_eq!(second.to_string(), "Upload failed");
        assert_eq!(second.status_code(), Some(500));
    }

    #[tokio::test]
    async fn list_returns_records_and_maps_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/files/my-files"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([record_json(1, None), record_json(2, Some("ab12cd34"))])),
            )
            .mount(&server)
            .await;

        let files = service(&server, true);
        let records = files.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(files.public_url_for(&records[0]), None);
        assert_eq!(
            files.public_url_for(&records[1]),
            Some(format!("{}/api/v1/public/ab12cd34", server.uri()))
        );
    }

    #[tokio::test]
    async fn list_without_session_fails_locally() {
        let server = MockServer::start().await;
        let err = service(&server, false).list().await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn delete_reports_default_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/files/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = service(&server, true).delete(9).await.unwrap_err();
        assert_eq!(err.to_string(), "Delete failed");
    }

    #[tokio::test]
    async fn share_accepts_path_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/3/share"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("/api/v1/public/ab12cd34")))
            .mount(&server)
            .await;

        let url = service(&server, true).share(3).await.unwrap();
        assert_eq!(url, format!("{}/api/v1/public/ab12cd34", server.uri()));
    }

    #[tokio::test]
    async fn share_accepts_plain_text_and_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/3/share"))
            .respond_with(ResponseTemplate::new(200).set_body_string("/api/v1/public/zz99"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/4/share"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_json(4, Some("ab12cd34"))))
            .mount(&server)
            .await;

        let files = service(&server, true);
        assert_eq!(
            files.share(3).await.unwrap(),
            format!("{}/api/v1/public/zz99", server.uri())
        );
        assert_eq!(
            files.share(4).await.unwrap(),
            format!("{}/api/v1/public/ab12cd34", server.uri())
        );
    }

    #[tokio::test]
    async fn share_failure_surfaces_string_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/files/3/share"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!("Share failed: Access denied")))
            .mount(&server)
            .await;

        let err = service(&server, true).share(3).await.unwrap_err();
        assert_eq!(err.to_string(), "Share failed: Access denied");
    }

    #[tokio::test]
    async fn revoke_share_maps_default() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/files/3/share"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service(&server, true).revoke_share(3).await.unwrap_err();
        assert_eq!(err.to_string(), "Revoke failed");
    }

    #[tokio::test]
    async fn share_status_distinguishes_shared_and_private() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/files/1/public-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_json(1, Some("ab12cd34"))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/files/2/public-url"))
            .respond_with(ResponseTemplate::new(200).set_body_string("File is not shared"))
            .mount(&server)
            .await;

        let files = service(&server, true);
        assert_eq!(
            files.share_status(1).await.unwrap(),
            Some(format!("{}/api/v1/public/ab12cd34", server.uri()))
        );
        assert_eq!(files.share_status(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn download_public_writes_file_without_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/public/ab12cd34"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.txt");
        let written = service(&server, false)
            .download_public("ab12cd34", Some(dest.as_path()))
            .await
            .unwrap();
        assert_eq!(written, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");

        let requests = server.received_requests().await.unwrap_or_default();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn download_of_unknown_token_reports_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/public/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = service(&server, false)
            .download_public("missing", Some(dir.path().join("x").as_path()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Download failed");
        assert!(!dir.path().join("x").exists());
    }

    #[tokio::test]
    async fn health_reads_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "UP"})))
            .mount(&server)
            .await;

        assert_eq!(service(&server, false).health().await.unwrap(), "UP");
    }

    #[test]
    fn served_names_are_reduced_to_a_file_name() {
        assert_eq!(local_file_name(Some("../../etc/passwd"), "tok"), "passwd");
        assert_eq!(local_file_name(Some("report.pdf"), "tok"), "report.pdf");
        assert_eq!(local_file_name(None, "tok"), "tok");
        assert_eq!(local_file_name(Some(".."), "tok"), "tok");
    }
}
