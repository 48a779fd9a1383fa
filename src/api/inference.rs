use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::try_join;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{AskResponse, ImageDataResponse};
use crate::core::config::{Config, EndpointMode};
use crate::core::format::{compose_dual_reply, extract_and_pretty_print};
use crate::core::submission::{Attachment, SubmissionPayload};

#[derive(Debug)]
pub enum InferenceError {
    /// The multipart body could not be assembled.
    Form(reqwest::Error),
    /// Connection failure or timeout.
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-2xx status.
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    /// The body was not the JSON shape we expect.
    Decode {
        endpoint: String,
        source: reqwest::Error,
    },
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Transport { source, .. } if source.is_timeout())
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Form(source) => write!(f, "Failed to build request body: {source}"),
            InferenceError::Transport { endpoint, source } => {
                if source.is_timeout() {
                    write!(f, "Request to {endpoint} timed out")
                } else {
                    write!(f, "Request to {endpoint} failed: {source}")
                }
            }
            InferenceError::Status {
                endpoint,
                status,
                body,
            } => write!(f, "{endpoint} answered {status}: {body}"),
            InferenceError::Decode { endpoint, source } => {
                write!(f, "Unexpected response from {endpoint}: {source}")
            }
        }
    }
}

impl StdError for InferenceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            InferenceError::Form(source)
            | InferenceError::Transport { source, .. }
            | InferenceError::Decode { source, .. } => Some(source),
            InferenceError::Status { .. } => None,
        }
    }
}

/// Turns a submission into the text of one assistant entry.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn infer(&self, payload: &SubmissionPayload) -> Result<String, InferenceError>;
}

/// Sends submissions to the configured endpoints as multipart POSTs.
#[derive(Clone)]
pub struct HttpInference {
    client: reqwest::Client,
    mode: EndpointMode,
    ask_url: String,
    image_data_url: String,
    timeout: Duration,
}

impl HttpInference {
    pub fn new(
        client: reqwest::Client,
        mode: EndpointMode,
        ask_url: impl Into<String>,
        image_data_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            mode,
            ask_url: ask_url.into(),
            image_data_url: image_data_url.into(),
            timeout,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            config.mode(),
            config.ask_url(),
            config.image_data_url(),
            config.timeout(),
        )
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<T, InferenceError> {
        let response = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|source| InferenceError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(InferenceError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| InferenceError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

#[async_trait]
impl InferenceBackend for HttpInference {
    async fn infer(&self, payload: &SubmissionPayload) -> Result<String, InferenceError> {
        debug!(
            request_id = payload.request_id,
            mode = self.mode.as_str(),
            has_question = payload.question.is_some(),
            has_attachment = payload.attachment.is_some(),
            "Sending submission"
        );

        match self.mode {
            EndpointMode::Single => {
                let ask: AskResponse = self
                    .post_json(&self.ask_url, build_form(payload, self.mode)?)
                    .await?;
                Ok(extract_and_pretty_print(&ask.response))
            }
            EndpointMode::Dual => {
                let ask =
                    self.post_json::<AskResponse>(&self.ask_url, build_form(payload, self.mode)?);
                let image_data = self.post_json::<ImageDataResponse>(
                    &self.image_data_url,
                    build_form(payload, self.mode)?,
                );
                let (ask, image_data) = try_join(ask, image_data).await?;
                Ok(compose_dual_reply(
                    &ask.response,
                    image_data.first_prediction(),
                    &image_data.results,
                ))
            }
        }
    }
}

fn file_part(attachment: &Attachment) -> Result<Part, InferenceError> {
    Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(attachment.mime_type)
        .map_err(InferenceError::Form)
}

/// Builds the multipart body for one endpoint. In dual mode the file also
/// goes out as `document` with its name repeated under `filename`, which the
/// image-data service expects.
pub(crate) fn build_form(
    payload: &SubmissionPayload,
    mode: EndpointMode,
) -> Result<Form, InferenceError> {
    let mut form = Form::new();
    if let Some(question) = &payload.question {
        form = form.text("question", question.clone());
    }
    if let Some(attachment) = &payload.attachment {
        form = form.part("image", file_part(attachment)?);
        if mode == EndpointMode::Dual {
            form = form
                .part("document", file_part(attachment)?)
                .text("filename", attachment.file_name.clone())
                .text("filename", attachment.file_name.clone());
        }
    }
    Ok(form)
}
