use crate::config::AppConfig;
use crate::core::converter::DocumentConverter;
use crate::core::gateway::ConversionGateway;
use crate::core::worker_pool::Dispatcher;
use crate::utils::constants::BATCH_SEPARATOR_WIDTH;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything a request needs, built once at start-up.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gateway: Arc<ConversionGateway>,
    pub dispatcher: Dispatcher,
    pub http_client: Client,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self, anyhow::Error> {
        let mut builder = Client::builder().timeout(config.request_timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http_client = builder.build()?;

        Ok(Self {
            gateway: Arc::new(ConversionGateway::new(&config, converter)),
            dispatcher: Dispatcher::with_workers(config.converter_workers),
            config: Arc::new(config),
            http_client,
        })
    }
}

// Response structure
#[derive(Serialize, Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConvertResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_image: Option<bool>,
}

impl ConvertResponse {
    pub fn converted(markdown: String) -> Self {
        Self {
            success: true,
            markdown: Some(markdown),
            error: None,
            filename: None,
            source_url: None,
            is_image: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            markdown: None,
            error: Some(error),
            filename: None,
            source_url: None,
            is_image: None,
        }
    }

    pub fn with_filename(mut self, filename: String) -> Self {
        self.filename = Some(filename);
        self
    }

    pub fn with_source_url(mut self, url: String) -> Self {
        self.source_url = Some(url);
        self
    }

    pub fn with_is_image(mut self, is_image: bool) -> Self {
        self.is_image = Some(is_image);
        self
    }
}

/// One multipart file entry, buffered. `filename` is the client's original name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Bytes,
}

/// The single input kind honoured for a request.
#[derive(Debug)]
pub enum RequestInput {
    Batch(Vec<UploadedFile>),
    Single(UploadedFile),
    Remote(String),
}

#[derive(Debug)]
pub struct ConversionRequest {
    pub input: RequestInput,
    pub api_key: Option<String>,
}

/// Combined Markdown for batch mode: one section per entry, in request order.
#[derive(Debug, Default)]
pub struct BatchDocument {
    sections: Vec<String>,
}

impl BatchDocument {
    pub fn push_converted(&mut self, filename: &str, markdown: &str) {
        self.push_section(filename, markdown);
    }

    pub fn push_error(&mut self, filename: &str, error: &str) {
        self.push_section(filename, &format!("Error: {error}"));
    }

    fn push_section(&mut self, filename: &str, body: &str) {
        let separator = "-".repeat(BATCH_SEPARATOR_WIDTH);
        self.sections
            .push(format!("## File: {filename}\n\n{body}\n\n{separator}\n"));
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn finish(self) -> String {
        self.sections.join("\n")
    }
}
