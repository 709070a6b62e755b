//! Google Calendar v3 REST calls.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Response, StatusCode};
use url::Url;

use grnsync_core::{EventQuery, SyncError, SyncResult, TargetEvent, TargetStore};

use crate::convert::{FromGoogle, ToGoogle};
use crate::types::{CalendarList, EventList, GoogleEvent};

pub const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

/// Fields requested on event listings.
const EVENT_FIELDS: &str =
    "items(id,summary,description,start,end,recurrence,extendedProperties),nextPageToken";

const SERVICE_NAME: &str = "Google Calendar";

#[derive(Debug, Clone)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    base: Url,
    access_token: String,
}

impl GoogleCalendar {
    pub fn new(access_token: &str) -> Result<Self> {
        Self::with_base(API_BASE, access_token)
    }

    pub fn with_base(base: &str, access_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;
        let base = Url::parse(base).with_context(|| format!("Invalid API base URL: {}", base))?;

        Ok(GoogleCalendar {
            http,
            base,
            access_token: access_token.to_string(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Ids of the calendars in the user's calendar list, in listing order.
    pub async fn list_calendars(&self) -> Result<Vec<String>> {
        let mut url = self.url(&["users", "me", "calendarList"])?;
        url.query_pairs_mut().append_pair("fields", "items(id)");

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("Failed to fetch calendar list")?;

        let list: CalendarList = check(response, "list calendars")
            .await?
            .json()
            .await
            .context("Failed to parse calendar list")?;

        Ok(list.items.into_iter().map(|c| c.id).collect())
    }

    pub async fn fetch_events(
        &self,
        calendar_id: &str,
        query: &EventQuery,
    ) -> Result<Vec<GoogleEvent>> {
        let mut url = self.url(&["calendars", calendar_id, "events"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(filter) = &query.private_property {
                pairs.append_pair("privateExtendedProperty", filter);
            }
            if let Some(min) = query.time_min {
                pairs.append_pair("timeMin", &min.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            if let Some(max) = query.time_max {
                pairs.append_pair("timeMax", &max.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            pairs.append_pair("fields", EVENT_FIELDS);
        }

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch events of {}", calendar_id))?;

        let list: EventList = check(response, "list events")
            .await?
            .json()
            .await
            .context("Failed to parse event list")?;

        if list.next_page_token.is_some() {
            tracing::debug!(calendar_id, "Event listing has more pages; only the first is used");
        }

        Ok(list.items)
    }

    pub async fn create_event(
        &self,
        calendar_id: &str,
        event: &GoogleEvent,
    ) -> Result<GoogleEvent> {
        let url = self.url(&["calendars", calendar_id, "events"])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await
            .with_context(|| format!("Failed to create event: {}", event.summary))?;

        check(response, "create event")
            .await?
            .json()
            .await
            .context("Failed to parse created event")
    }

    /// Replace every field of an existing event.
    pub async fn replace_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &GoogleEvent,
    ) -> Result<GoogleEvent> {
        let url = self.url(&["calendars", calendar_id, "events", event_id])?;

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .json(event)
            .send()
            .await
            .with_context(|| format!("Failed to update event: {}", event.summary))?;

        check(response, "update event")
            .await?
            .json()
            .await
            .context("Failed to parse updated event")
    }

    /// Deleting an event that is already gone succeeds.
    pub async fn remove_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let url = self.url(&["calendars", calendar_id, "events", event_id])?;

        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Failed to delete event: {}", event_id))?;

        if response.status() == StatusCode::GONE {
            return Ok(());
        }
        check(response, "delete event").await?;
        Ok(())
    }
}

async fn check(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    bail!("Failed to {} (status {}): {}", action, status, body.trim());
}

fn remote_error(err: anyhow::Error) -> SyncError {
    SyncError::remote(SERVICE_NAME, format!("{:#}", err))
}

#[async_trait]
impl TargetStore for GoogleCalendar {
    async fn calendars(&self) -> SyncResult<Vec<String>> {
        self.list_calendars().await.map_err(remote_error)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        query: &EventQuery,
    ) -> SyncResult<Vec<TargetEvent>> {
        let events = self
            .fetch_events(calendar_id, query)
            .await
            .map_err(remote_error)?;
        Ok(events.into_iter().map(TargetEvent::from_google).collect())
    }

    async fn insert_event(
        &self,
        calendar_id: &str,
        event: &TargetEvent,
    ) -> SyncResult<TargetEvent> {
        let mut body = event.to_google();
        body.id = None;
        self.create_event(calendar_id, &body)
            .await
            .map(TargetEvent::from_google)
            .map_err(remote_error)
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &TargetEvent,
    ) -> SyncResult<TargetEvent> {
        self.replace_event(calendar_id, event_id, &event.to_google())
            .await
            .map(TargetEvent::from_google)
            .map_err(remote_error)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SyncResult<()> {
        self.remove_event(calendar_id, event_id)
            .await
            .map_err(remote_error)
    }
}
