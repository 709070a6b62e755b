use anyhow::Result;

use grnsync_google::Session;

pub async fn run() -> Result<()> {
    let Some(config) = super::load_config()? else {
        return Ok(());
    };

    let app = super::oauth_client(&config);

    println!("Authenticating with Google Calendar...");

    // Always run the browser flow so a broken cached token can be replaced
    let path = app.token_cache_path()?;
    Session::authorize(&app, path.clone()).await?;

    println!("\nToken cached at {}", path.display());
    println!("Run `grnsync sync` to sync your schedule.");

    Ok(())
}
