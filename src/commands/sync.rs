use anyhow::{Context, Result, bail};
use chrono::Utc;

use grnsync_core::{DateRange, Reconciler, SourceStore, SyncContext, TargetStore};
use grnsync_garoon::GaroonClient;
use grnsync_google::GoogleCalendar;

use crate::config::Config;

pub async fn run(dry_run: bool) -> Result<()> {
    let Some(config) = super::load_config()? else {
        return Ok(());
    };

    let zone = config.timezone()?;

    let garoon = GaroonClient::new(
        &config.garoon.url,
        &config.garoon.account,
        &config.garoon.password,
    )?;
    let user_id = garoon
        .login_user_id()
        .await
        .context("Failed to look up the Garoon login user")?;

    let google = grnsync_google::connect(&super::oauth_client(&config)).await?;
    let calendar_id = target_calendar(&config, &google).await?;

    let window = DateRange::sync_window(Utc::now(), config.sync.months_ahead, zone)?;

    tracing::info!(
        user_id = %user_id,
        calendar_id = %calendar_id,
        from = %window.from_rfc3339(),
        to = %window.to_rfc3339(),
        dry_run,
        "Starting sync"
    );

    let ctx = SyncContext::new(user_id, calendar_id, window, zone)
        .with_concurrency(config.sync.concurrency)
        .with_dry_run(dry_run);

    let report = Reconciler::new(&garoon, &google, &ctx).run().await?;

    if dry_run {
        println!("Dry run: {}", report);
    } else {
        println!("Sync complete: {}", report);
    }

    Ok(())
}

/// The configured calendar, or the first one in the user's calendar list.
async fn target_calendar(config: &Config, google: &GoogleCalendar) -> Result<String> {
    if let Some(id) = config.calendar_id() {
        return Ok(id.to_string());
    }

    let calendars = google
        .calendars()
        .await
        .context("Failed to list Google calendars")?;

    match calendars.into_iter().next() {
        Some(id) => Ok(id),
        None => bail!("No Google calendars found; set google.calendar_id in the config"),
    }
}
