//! Google Calendar target for grnsync: OAuth session handling plus the thin
//! REST client that implements `TargetStore`.

mod api;
mod convert;
pub mod session;
pub mod types;

pub use api::GoogleCalendar;
pub use convert::{FromGoogle, ToGoogle};
pub use session::{OAuthClient, Session};

use grnsync_core::{SyncError, SyncResult};

/// Load (or refresh, or interactively obtain) a session and build a client from it.
pub async fn connect(app: &OAuthClient) -> SyncResult<GoogleCalendar> {
    let session = Session::load_or_authorize(app)
        .await
        .map_err(|e| SyncError::Auth(format!("{:#}", e)))?;

    GoogleCalendar::new(session.access_token())
        .map_err(|e| SyncError::remote("Google Calendar", format!("{:#}", e)))
}
