//! Conversions between Google wire events and the engine's target events.

use grnsync_core::{TargetEvent, TargetTime};

use crate::types::{ExtendedProperties, GoogleEvent, GoogleEventTime};

pub trait FromGoogle {
    fn from_google(event: GoogleEvent) -> Self;
}

pub trait ToGoogle {
    fn to_google(&self) -> GoogleEvent;
}

impl FromGoogle for TargetEvent {
    fn from_google(event: GoogleEvent) -> Self {
        TargetEvent {
            id: event.id,
            summary: event.summary,
            description: event.description,
            start: event.start.map(time_from_google).unwrap_or_default(),
            end: event.end.map(time_from_google).unwrap_or_default(),
            recurrence: event.recurrence,
            private_properties: event.extended_properties.and_then(|p| p.private),
        }
    }
}

impl ToGoogle for TargetEvent {
    fn to_google(&self) -> GoogleEvent {
        GoogleEvent {
            id: self.id.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            start: Some(time_to_google(&self.start)),
            end: Some(time_to_google(&self.end)),
            recurrence: self.recurrence.clone(),
            extended_properties: self
                .private_properties
                .as_ref()
                .map(|private| ExtendedProperties {
                    private: Some(private.clone()),
                }),
        }
    }
}

fn time_from_google(time: GoogleEventTime) -> TargetTime {
    TargetTime {
        date: time.date,
        date_time: time.date_time,
        time_zone: time.time_zone,
    }
}

fn time_to_google(time: &TargetTime) -> GoogleEventTime {
    GoogleEventTime {
        date: time.date.clone(),
        date_time: time.date_time.clone(),
        time_zone: time.time_zone.clone(),
    }
}
