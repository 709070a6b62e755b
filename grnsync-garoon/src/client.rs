//! Garoon SOAP API client.
//!
//! Every call is an HTTP POST of a SOAP 1.2 envelope carrying the account's
//! credentials in a WS-Security UsernameToken.

use anyhow::{Context, Result};
use async_trait::async_trait;

use grnsync_core::{DateRange, SourceEvent, SourceStore, SyncError, SyncResult};

use crate::decode;

pub const SCHEDULE_SERVICE_PATH: &str = "/cbpapi/schedule/api?";
pub const UTIL_SERVICE_PATH: &str = "/util_api/util/api?";

const SERVICE_NAME: &str = "Garoon";

#[derive(Debug, Clone)]
pub struct GaroonClient {
    http: reqwest::Client,
    base_url: String,
    account: String,
    password: String,
}

impl GaroonClient {
    /// `base_url` is the Garoon root, e.g. `https://example.cybozu.com/g`.
    pub fn new(base_url: &str, account: &str, password: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(GaroonClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            account: account.to_string(),
            password: password.to_string(),
        })
    }

    pub async fn get_login_user_id(&self) -> Result<String> {
        let body = self.call(UTIL_SERVICE_PATH, "UtilGetLoginUserId", "").await?;
        decode::decode_login_user_id(&body)
    }

    pub async fn get_events(&self, range: &DateRange) -> Result<Vec<SourceEvent>> {
        let parameters = format!(
            r#"<parameters start="{}" end="{}" all_repeat_events="true" />"#,
            range.from_rfc3339(),
            range.to_rfc3339()
        );
        let body = self
            .call(SCHEDULE_SERVICE_PATH, "ScheduleGetEvents", &parameters)
            .await?;
        decode::decode_events(&body)
    }

    pub async fn get_event_by_id(&self, id: &str) -> Result<Option<SourceEvent>> {
        let parameters = format!(
            r#"<parameters><event_id xmlns="">{}</event_id></parameters>"#,
            escape(id)
        );
        let body = self
            .call(SCHEDULE_SERVICE_PATH, "ScheduleGetEventsById", &parameters)
            .await?;
        decode::decode_event_by_id(&body)
    }

    async fn call(&self, path: &str, action: &str, parameters: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let envelope = envelope(action, &self.account, &self.password, parameters);

        tracing::debug!(%url, action, "Calling Garoon");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(envelope)
            .send()
            .await
            .with_context(|| format!("Failed to call {}", action))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read {} response", action))?;

        // Faults arrive with a 500 status; let the decoder report them.
        if !status.is_success() && !body.contains("Fault>") {
            anyhow::bail!("{} failed (status {})", action, status);
        }

        Ok(body)
    }
}

fn envelope(action: &str, account: &str, password: &str, parameters: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/"
    xmlns:base_services="http://wsdl.cybozu.co.jp/base/2008">
  <SOAP-ENV:Header>
    <Action SOAP-ENV:mustUnderstand="1" xmlns="http://schemas.xmlsoap.org/ws/2003/03/addressing">{action}</Action>
    <Security xmlns:wsu="http://schemas.xmlsoap.org/ws/2002/07/utility" SOAP-ENV:mustUnderstand="1" xmlns="http://schemas.xmlsoap.org/ws/2002/12/secext">
      <UsernameToken wsu:ID="ID">
        <Username>{account}</Username>
        <Password>{password}</Password>
      </UsernameToken>
    </Security>
    <Timestamp SOAP-ENV:mustUnderstand="1" ID="ID" xmlns="http://schemas.xmlsoap.org/ws/2002/07/utility">
      <Created>2037-08-12T14:45:00Z</Created>
      <Expires>2037-08-12T14:45:00Z</Expires>
    </Timestamp>
    <Locale>jp</Locale>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <{action}>{parameters}</{action}>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#,
        action = action,
        account = escape(account),
        password = escape(password),
        parameters = parameters,
    )
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn remote_error(err: anyhow::Error) -> SyncError {
    SyncError::remote(SERVICE_NAME, format!("{:#}", err))
}

#[async_trait]
impl SourceStore for GaroonClient {
    async fn login_user_id(&self) -> SyncResult<String> {
        self.get_login_user_id().await.map_err(remote_error)
    }

    async fn events(&self, range: &DateRange) -> SyncResult<Vec<SourceEvent>> {
        self.get_events(range).await.map_err(remote_error)
    }

    async fn event_by_id(&self, id: &str) -> SyncResult<Option<SourceEvent>> {
        self.get_event_by_id(id).await.map_err(remote_error)
    }
}
