use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rollcall_core::PhotoStore;
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod dbus_interface;
mod engine;
mod gate;
mod store;
mod visage;

use config::Config;
use controller::Controller;
use dbus_interface::{GalleryService, BUS_NAME, OBJECT_PATH};
use gate::Gate;
use store::PeopleStore;
use visage::VisageAuthenticator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("rollcalld starting");

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(
        photo_dir = %config.photo_dir.display(),
        db = %config.db_path.display(),
        camera = %config.camera_device,
        user = %config.auth_user,
        "configuration loaded"
    );

    let photos = PhotoStore::open(&config.photo_dir).context("failed to open photo directory")?;
    let store = PeopleStore::open(&config.db_path)
        .await
        .context("failed to open people database")?;
    let controller = Controller::load(photos, store, config.jpeg_quality).await?;

    let engine = engine::spawn_engine(
        config.camera_device.clone(),
        config.warmup_frames,
        config.capture_attempts,
    )
    .context("failed to spawn camera thread")?;

    let authenticator = VisageAuthenticator::new(
        config.auth_user.clone(),
        Duration::from_secs(config.auth_timeout_secs),
    );
    let gate = Gate::new(Arc::new(authenticator), config.auth_reason.clone());

    let service = GalleryService::new(controller, gate, engine, config.camera_device.clone());

    let _conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("failed to register on the session bus")?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "rollcalld ready (locked)");

    tokio::signal::ctrl_c().await?;
    tracing::info!("rollcalld shutting down");

    Ok(())
}
