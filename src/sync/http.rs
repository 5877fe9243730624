use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::DigestApi;
use crate::core::digest::{self, DigestDraft, DigestId, DigestRecord, DigestUpdate};
use crate::error::MutationError;

/// Client for the `digests.*` procedures served over HTTP.
#[derive(Clone)]
pub struct HttpDigestApi {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl HttpDigestApi {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, MutationError> {
        let http = Client::builder()
            .build()
            .map_err(|e| MutationError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn procedure(&self, name: &str) -> String {
        format!("{}/digests.{}", self.base_url, name)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => req,
        }
    }

    async fn call(&self, req: RequestBuilder) -> Result<String, MutationError> {
        let resp = self.authorize(req).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        check_status(status, &text, &self.base_url)?;
        Ok(text)
    }

    async fn query<T: DeserializeOwned>(&self, name: &str) -> Result<T, MutationError> {
        let text = self.call(self.http.get(self.procedure(name))).await?;
        decode(&text)
    }

    async fn mutate<B, T>(&self, name: &str, body: &B) -> Result<T, MutationError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let text = self
            .call(self.http.post(self.procedure(name)).json(body))
            .await?;
        decode(&text)
    }
}

fn check_status(status: StatusCode, body: &str, base_url: &str) -> Result<(), MutationError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::NOT_FOUND => Err(MutationError::NotFound),
        StatusCode::UNAUTHORIZED => Err(MutationError::Unauthenticated(base_url.to_string())),
        _ => Err(MutationError::Rejected {
            status: status.as_u16(),
            message: error_message(body),
        }),
    }
}

/// The server's own message when the body carries one, else the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.pointer("/error/json/message"))
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Accept a bare payload or the `{"result":{"data":…}}` envelope, with or
/// without a nested `{"json":…}` wrapper.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, MutationError> {
    let mut value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).map_err(|e| MutationError::Decode(e.to_string()))?
    };
    if let Some(data) = value.pointer_mut("/result/data") {
        value = data.take();
    }
    if let Value::Object(map) = &mut value {
        if map.len() == 1 {
            if let Some(inner) = map.remove("json") {
                value = inner;
            }
        }
    }
    serde_json::from_value(value).map_err(|e| MutationError::Decode(e.to_string()))
}

#[async_trait]
impl DigestApi for HttpDigestApi {
    async fn all(&self) -> Result<Vec<DigestRecord>, MutationError> {
        let mut records: Vec<DigestRecord> = self.query("all").await?;
        digest::sort_newest_first(&mut records);
        Ok(records)
    }

    async fn create(&self, draft: &DigestDraft) -> Result<DigestRecord, MutationError> {
        self.mutate("create", draft).await
    }

    async fn update(&self, update: &DigestUpdate) -> Result<DigestRecord, MutationError> {
        self.mutate("update", update).await
    }

    async fn remove(&self, id: DigestId) -> Result<(), MutationError> {
        let text = self
            .call(self.http.post(self.procedure("remove")).json(&id))
            .await?;
        log::debug!("digests.remove {} -> {} bytes", id, text.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::digest::fixtures::record;
    use chrono::NaiveTime;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn draft() -> DigestDraft {
        DigestDraft {
            full_name: "Jane Doe".to_string(),
            phone: "+1 123.456.7890".to_string(),
            timezone: "America/New_York".to_string(),
            notify_on: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            enabled: true,
        }
    }

    #[tokio::test]
    async fn all_accepts_envelope_and_sorts() {
        let server = MockServer::start().await;
        let older = record("older", 1);
        let newer = record("newer", 5);
        Mock::given(method("GET"))
            .and(path("/digests.all"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": { "data": [older, newer] }
            })))
            .mount(&server)
            .await;

        let api = HttpDigestApi::new(&server.uri(), Some("secret".into())).unwrap();
        let all = api.all().await.unwrap();
        assert_eq!(all[0].full_name, "newer");
        assert_eq!(all[1].full_name, "older");
    }

    #[tokio::test]
    async fn create_posts_draft_and_reads_bare_record() {
        let server = MockServer::start().await;
        let mut created = record("Jane Doe", 3);
        created.phone = "+1 123.456.7890".to_string();
        Mock::given(method("POST"))
            .and(path("/digests.create"))
            .and(body_json(draft()))
            .respond_with(ResponseTemplate::new(200).set_body_json(&created))
            .mount(&server)
            .await;

        let api = HttpDigestApi::new(&format!("{}/", server.uri()), None).unwrap();
        assert_eq!(api.create(&draft()).await.unwrap(), created);
    }

    #[tokio::test]
    async fn remove_sends_bare_id() {
        let server = MockServer::start().await;
        let id = DigestId::new();
        Mock::given(method("POST"))
            .and(path("/digests.remove"))
            .and(body_json(id.0.to_string()))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpDigestApi::new(&server.uri(), None).unwrap();
        api.remove(id).await.unwrap();
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/digests.remove"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/digests.create"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": { "message": "phone is invalid" }
            })))
            .mount(&server)
            .await;

        let api = HttpDigestApi::new(&server.uri(), None).unwrap();
        assert_eq!(api.remove(DigestId::new()).await, Err(MutationError::NotFound));
        assert_eq!(
            api.create(&draft()).await,
            Err(MutationError::Rejected {
                status: 400,
                message: "phone is invalid".to_string()
            })
        );
    }

    #[tokio::test]
    async fn unauthorized_maps_to_unauthenticated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/digests.all"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "UNAUTHORIZED" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpDigestApi::new(&server.uri(), Some("stale".into())).unwrap();
        assert_eq!(
            api.all().await,
            Err(MutationError::Unauthenticated(server.uri()))
        );
    }

    #[test]
    fn decode_unwraps_nested_json() {
        let body = r#"{"result":{"data":{"json":[1,2]}}}"#;
        assert_eq!(decode::<Vec<i32>>(body).unwrap(), vec![1, 2]);
        assert_eq!(decode::<Vec<i32>>("[3]").unwrap(), vec![3]);
        assert!(matches!(
            decode::<Vec<i32>>("{oops"),
            Err(MutationError::Decode(_))
        ));
    }
}
