//! Google Calendar REST client.
//!
//! Blocking: every call is one (or, for paged listings, several) sequential
//! HTTP round-trips. The bearer token is supplied by the caller; obtaining and
//! refreshing it is outside this crate.

use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use url::Url;

use super::{CalendarClient, EventUpdate, NewEvent, RemoteEvent};
use crate::error::CalendarError;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

#[derive(Debug, Deserialize)]
struct EventsPageResponse {
    items: Option<Vec<RemoteEvent>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Google Calendar API client bound to one calendar.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
    calendar_id: String,
    access_token: String,
    time_zone: Tz,
}

impl GoogleCalendarClient {
    /// Create a client for `calendar_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::MissingToken`] if the token is blank.
    pub fn new(calendar_id: &str, access_token: &str, time_zone: Tz) -> Result<Self, CalendarError> {
        if access_token.trim().is_empty() {
            return Err(CalendarError::MissingToken);
        }
        let base_url = Url::parse(CALENDAR_API_BASE)
            .map_err(|e| CalendarError::Payload(format!("invalid calendar api base url: {e}")))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            calendar_id: calendar_id.trim().to_string(),
            access_token: access_token.trim().to_string(),
            time_zone,
        })
    }

    /// Point the client at another API root (used against mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, CalendarError> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| CalendarError::Payload(format!("invalid calendar api base url: {e}")))?;
        Ok(self)
    }

    fn events_endpoint(&self) -> Result<Url, CalendarError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CalendarError::Payload("calendar api base URL cannot be a base".into()))?
            .pop_if_empty()
            .push("calendars")
            .push(&self.calendar_id)
            .push("events");
        Ok(url)
    }

    fn event_endpoint(&self, event_id: &str) -> Result<Url, CalendarError> {
        let mut url = self.events_endpoint()?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::Payload("calendar events URL cannot be a base".into()))?
            .push(event_id);
        Ok(url)
    }

    fn rfc3339(&self, instant: NaiveDateTime) -> Result<String, CalendarError> {
        self.time_zone
            .from_local_datetime(&instant)
            .earliest()
            .map(|at| at.to_rfc3339())
            .ok_or_else(|| CalendarError::InvalidInstant(instant.to_string()))
    }

    fn send(&self, request: RequestBuilder) -> Result<String, CalendarError> {
        let response = request.bearer_auth(&self.access_token).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(CalendarError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn parse_event(body: &str) -> Result<RemoteEvent, CalendarError> {
        serde_json::from_str(body)
            .map_err(|e| CalendarError::Payload(format!("{e}; body={body}")))
    }
}

impl CalendarClient for GoogleCalendarClient {
    fn list_events(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RemoteEvent>, CalendarError> {
        let endpoint = self.events_endpoint()?;
        let time_min = self.rfc3339(start)?;
        let time_max = self.rfc3339(end)?;

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.client.get(endpoint.clone()).query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("timeZone", self.time_zone.name()),
            ]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let body = self.send(request)?;
            let page: EventsPageResponse = serde_json::from_str(&body)
                .map_err(|e| CalendarError::Payload(format!("{e}; body={body}")))?;
            events.extend(page.items.unwrap_or_default());

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = events.len(), %start, %end, "listed calendar events");
        Ok(events)
    }

    fn create_event(&self, event: &NewEvent) -> Result<RemoteEvent, CalendarError> {
        let body = self.send(self.client.post(self.events_endpoint()?).json(event))?;
        Self::parse_event(&body)
    }

    fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<RemoteEvent, CalendarError> {
        let body = self.send(self.client.put(self.event_endpoint(event_id)?).json(update))?;
        Self::parse_event(&body)
    }

    fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        self.send(self.client.delete(self.event_endpoint(event_id)?))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventDateTime;
    use chrono::NaiveDate;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> GoogleCalendarClient {
        GoogleCalendarClient::new("primary", "token-123", chrono_tz::Europe::Warsaw)
            .unwrap()
            .with_base_url(&format!("{}/", server.url()))
            .unwrap()
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn blank_token_is_rejected() {
        let err = GoogleCalendarClient::new("primary", "  ", chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, CalendarError::MissingToken));
    }

    #[test]
    fn list_events_sends_window_in_zone_and_follows_pages() {
        let mut server = mockito::Server::new();
        let first = server
            .mock("GET", "/calendars/primary/events")
            .match_header("authorization", "Bearer token-123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("timeMin".into(), "2024-01-04T00:00:00+01:00".into()),
                Matcher::UrlEncoded("timeMax".into(), "2024-01-05T00:00:00+01:00".into()),
                Matcher::UrlEncoded("singleEvents".into(), "true".into()),
                Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
            ]))
            .expect(1)
            .with_body(r##"{"items":[{"id":"a","summary":"#tasks","description":"- x"}],"nextPageToken":"p2"}"##)
            .create();
        let second = server
            .mock("GET", "/calendars/primary/events")
            .match_query(Matcher::UrlEncoded("pageToken".into(), "p2".into()))
            .expect(1)
            .with_body(r##"{"items":[{"id":"b","summary":"dentist"}]}"##)
            .create();

        let events = client(&server).list_events(day(4), day(5)).unwrap();
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        first.assert();
        second.assert();
    }

    #[test]
    fn api_errors_carry_status_and_body() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/calendars/primary/events")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("unauthorized")
            .create();

        let err = client(&server).list_events(day(4), day(5)).unwrap_err();
        assert!(matches!(err, CalendarError::Api { status: 401, ref body } if body == "unauthorized"));
    }

    #[test]
    fn create_posts_event_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/calendars/primary/events")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "summary": "#tasks",
                "description": "- Water plants",
                "colorId": "8",
                "start": {"dateTime": "2024-01-04T06:00:00", "timeZone": "Europe/Warsaw"}
            })))
            .with_body(r##"{"id":"new-1","summary":"#tasks","description":"- Water plants","colorId":"8"}"##)
            .create();

        let at = day(4) + chrono::Duration::hours(6);
        let created = client(&server)
            .create_event(&NewEvent {
                summary: "#tasks".into(),
                description: "- Water plants".into(),
                start: EventDateTime::at(at, "Europe/Warsaw"),
                end: EventDateTime::at(at, "Europe/Warsaw"),
                color_id: "8".into(),
            })
            .unwrap();
        assert_eq!(created.id, "new-1");
        mock.assert();
    }

    #[test]
    fn update_puts_and_delete_removes_by_id() {
        let mut server = mockito::Server::new();
        let put = server
            .mock("PUT", "/calendars/primary/events/evt-1")
            .match_body(Matcher::PartialJson(serde_json::json!({"description": "- a\n- b"})))
            .with_body(r##"{"id":"evt-1","description":"- a\n- b"}"##)
            .create();
        let delete = server
            .mock("DELETE", "/calendars/primary/events/evt-1")
            .with_status(204)
            .create();

        let c = client(&server);
        let existing = RemoteEvent {
            id: "evt-1".into(),
            summary: Some("#tasks".into()),
            description: Some("- a".into()),
            start: EventDateTime::default(),
            end: EventDateTime::default(),
            color_id: None,
        };
        let updated = c
            .update_event("evt-1", &EventUpdate::with_description(&existing, "- a\n- b".into()))
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("- a\n- b"));
        c.delete_event("evt-1").unwrap();

        put.assert();
        delete.assert();
    }
}
