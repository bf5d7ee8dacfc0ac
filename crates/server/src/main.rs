use anyhow::Context;
use clap::Parser;
use resume_server::{router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let state = AppState::from_config(&config);

    // resolve once up front so a missing font shows in the startup log
    match state.fonts.resolve() {
        Ok(font) => log::info!("using font {}", font.family),
        Err(e) if config.allow_font_fallback => {
            log::warn!("{e}; CJK text will be rejected, Latin text uses Helvetica")
        }
        Err(e) => log::warn!("{e}; renders will fail with FONT_NOT_FOUND"),
    }
    if state.converter.is_none() {
        log::info!("no --chromium given, HTML templates are disabled");
    }

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    log::info!("listening on {}", config.bind);

    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}
