use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::RequestBuilder;
use std::time::{Duration, Instant};
use tracing::{debug, field, instrument, warn, Span};
use url::Url;

use super::{TaskStore, TransportError};
use crate::model::{CorrelationId, NewTask, Task, TaskId, Title};

/// Error bodies longer than this are cut before they end up in an error.
const MAX_ERROR_BODY: usize = 500;

/// json-server style REST collection living under `<base>/todos`.
pub struct HttpTaskStore {
    client: reqwest::Client,
    collection: Url,
}

impl HttpTaskStore {
    pub const COLLECTION: &'static str = "todos";

    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut collection = base.clone();
        collection
            .path_segments_mut()
            .map_err(|_| TransportError::BadUrl(base.to_string()))?
            .pop_if_empty()
            .push(Self::COLLECTION);

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            collection,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection
    }

    fn item_url(&self, id: &TaskId) -> Result<Url, TransportError> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::BadUrl(self.collection.to_string()))?
            .push(&id.to_string());
        Ok(url)
    }

    /// Sends `request` tagged with a fresh correlation-id and returns the body
    /// of a 2xx answer. The id is recorded on the caller's span, which must
    /// declare an empty `correlation_id` field.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<String, TransportError> {
        let cid = CorrelationId::new();
        let mut headers = HeaderMap::new();
        cid.insert_into_header_map(&mut headers)?;
        Span::current().record("correlation_id", &field::display(cid));

        let started = Instant::now();
        let response = request.headers(headers).send().await.map_err(|err| {
            warn!(operation, reason = %err, "task store unreachable");
            err
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(
            operation,
            status = status.as_u16(),
            latency = ?started.elapsed(),
            "task store responded"
        );

        if !status.is_success() {
            warn!(operation, status = status.as_u16(), "task store refused request");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate(body),
            });
        }
        Ok(body)
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("... (truncated)");
    }
    body
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    #[instrument(skip(self), fields(url = %self.collection, correlation_id = tracing::field::Empty))]
    async fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        let body = self
            .execute("list", self.client.get(self.collection.clone()))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self), fields(url = %self.collection, correlation_id = tracing::field::Empty))]
    async fn create_task(&self, title: Title) -> Result<Task, TransportError> {
        let new_task = NewTask::new(title);
        let body = self
            .execute(
                "create",
                self.client.post(self.collection.clone()).json(&new_task),
            )
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self, task), fields(id = %task.id, correlation_id = tracing::field::Empty))]
    async fn update_task(&self, mut task: Task) -> Result<Task, TransportError> {
        task.touch();
        let url = self.item_url(&task.id)?;
        let body = self
            .execute("update", self.client.put(url).json(&task))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self), fields(correlation_id = tracing::field::Empty))]
    async fn delete_task(&self, id: &TaskId) -> Result<(), TransportError> {
        let url = self.item_url(id)?;
        self.execute("delete", self.client.delete(url)).await?;
        Ok(())
    }
}
