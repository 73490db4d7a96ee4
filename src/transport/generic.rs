use crate::error::{Error, Result};
use crate::link::LinkDocument;
use crate::transport::{SubmitOutcome, Transport, TransportOptions};

use log::{debug, info};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

/// Content type sent with every submission. The body is the raw JSON document,
/// not an encoded form; stores accepting these links expect this marker.
pub const SUBMISSION_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Posts the link document, signatures included, to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct GenericHttp {
    endpoint: Url,
    client: Client,
}

impl GenericHttp {
    pub fn new(uri: &str, options: &TransportOptions) -> Result<Self> {
        let endpoint = Url::parse(uri).map_err(|e| {
            Error::UnsupportedTransport(format!("Malformed transport URI '{uri}': {e}"))
        })?;

        Ok(Self {
            endpoint,
            client: build_client(options)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for GenericHttp {
    fn describe(&self) -> String {
        format!("http:{}", self.endpoint)
    }

    fn submit(&self, document: &LinkDocument) -> Result<SubmitOutcome> {
        let body = document.to_json()?;
        post_body(&self.client, &self.endpoint, body)
    }
}

pub(crate) fn build_client(options: &TransportOptions) -> Result<Client> {
    Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))
}

/// Send one POST and treat anything but a 2xx answer as a failure.
pub(crate) fn post_body(client: &Client, endpoint: &Url, body: String) -> Result<SubmitOutcome> {
    debug!("POST {} ({} bytes)", endpoint, body.len());

    let response = client
        .post(endpoint.clone())
        .header(CONTENT_TYPE, SUBMISSION_CONTENT_TYPE)
        .body(body)
        .send()
        .map_err(|e| Error::Transport(format!("Failed to submit to {endpoint}: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .map_err(|e| Error::Transport(format!("Failed to read response from {endpoint}: {e}")))?;

    if !status.is_success() {
        return Err(Error::Transport(format!(
            "{endpoint} rejected submission. Status: {status}, body: {text}"
        )));
    }

    info!("[in-toto] {endpoint} answered {status}: {text}");

    Ok(SubmitOutcome::Posted {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body: text,
    })
}
