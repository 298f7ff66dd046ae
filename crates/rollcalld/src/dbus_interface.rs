use std::path::Path;

use image::DynamicImage;
use rollcall_core::GalleryError;
use tokio::sync::Mutex;
use zbus::{fdo, interface};

use crate::controller::{Controller, ControllerError};
use crate::engine::{EngineError, EngineHandle};
use crate::gate::Gate;

pub const BUS_NAME: &str = "org.rollcall.Gallery1";
pub const OBJECT_PATH: &str = "/org/rollcall/Gallery1";

/// D-Bus interface for the Rollcall daemon.
///
/// Bus name: org.rollcall.Gallery1 (session bus)
/// Object path: /org/rollcall/Gallery1
///
/// Failures carry `"<title>: <message>"` so clients can show them as alerts.
pub struct GalleryService {
    controller: Mutex<Controller>,
    gate: Gate,
    engine: EngineHandle,
    camera_device: String,
}

impl GalleryService {
    pub fn new(controller: Controller, gate: Gate, engine: EngineHandle, camera_device: String) -> Self {
        Self {
            controller: Mutex::new(controller),
            gate,
            engine,
            camera_device,
        }
    }
}

/// Map a user-facing failure onto the closest standard D-Bus error.
fn gallery_error(err: &GalleryError) -> fdo::Error {
    let alert = err.alert();
    match err {
        GalleryError::Locked | GalleryError::AuthenticationFailed(_) => fdo::Error::AccessDenied(alert),
        GalleryError::NoSuchPerson(_) | GalleryError::Image(_) => fdo::Error::InvalidArgs(alert),
        GalleryError::CameraUnavailable(_) | GalleryError::BiometryUnavailable(_) => {
            fdo::Error::NotSupported(alert)
        }
        GalleryError::UnlockInProgress => fdo::Error::LimitsExceeded(alert),
        GalleryError::Io(_) => fdo::Error::Failed(alert),
    }
}

fn controller_error(err: ControllerError) -> fdo::Error {
    tracing::warn!(error = %err, "request failed");
    match &err {
        ControllerError::Gallery(e) => gallery_error(e),
        ControllerError::Store(e) => fdo::Error::Failed(format!("Storage: {e}")),
    }
}

fn camera_error(err: EngineError) -> fdo::Error {
    tracing::warn!(error = %err, "camera capture failed");
    if err.is_unavailable() {
        gallery_error(&GalleryError::CameraUnavailable(err.to_string()))
    } else {
        fdo::Error::Failed(format!("Camera: {err}"))
    }
}

#[interface(name = "org.rollcall.Gallery1")]
impl GalleryService {
    /// Add a person from an existing image file. Returns its grid position.
    async fn add_from_library(&self, path: &str) -> fdo::Result<u32> {
        tracing::info!(path, "add from library requested");
        let mut controller = self.controller.lock().await;
        let index = controller
            .add_from_library(Path::new(path))
            .await
            .map_err(controller_error)?;
        Ok(index as u32)
    }

    /// Add a person from a fresh camera capture. Returns its grid position.
    async fn add_from_camera(&self) -> fdo::Result<u32> {
        tracing::info!("add from camera requested");
        // Refuse before opening the camera.
        self.controller
            .lock()
            .await
            .ensure_unlocked()
            .map_err(|e| controller_error(e.into()))?;

        let image = self.engine.capture().await.map_err(camera_error)?;

        let mut controller = self.controller.lock().await;
        let index = controller
            .add_image(&DynamicImage::ImageRgb8(image))
            .await
            .map_err(controller_error)?;
        Ok(index as u32)
    }

    async fn rename(&self, index: u32, name: &str) -> fdo::Result<bool> {
        tracing::info!(index, name, "rename requested");
        let mut controller = self.controller.lock().await;
        controller
            .rename(index as usize, name)
            .await
            .map_err(controller_error)?;
        Ok(true)
    }

    async fn delete(&self, index: u32) -> fdo::Result<bool> {
        tracing::info!(index, "delete requested");
        let mut controller = self.controller.lock().await;
        controller
            .delete(index as usize)
            .await
            .map_err(controller_error)?;
        Ok(true)
    }

    /// Run the biometric check and reveal the grid on success.
    async fn unlock(&self) -> fdo::Result<bool> {
        tracing::info!("unlock requested");
        // The controller stays available while the prompt is open.
        self.gate.authenticate().await.map_err(|e| gallery_error(&e))?;
        self.controller.lock().await.unlock();
        Ok(true)
    }

    async fn lock(&self) -> fdo::Result<bool> {
        tracing::info!("lock requested");
        self.controller.lock().await.lock();
        Ok(true)
    }

    /// JSON array of visible rows; empty while locked.
    async fn list(&self) -> fdo::Result<String> {
        let rows = self.controller.lock().await.visible();
        serde_json::to_string(&rows).map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    /// Return daemon status information.
    async fn status(&self) -> fdo::Result<String> {
        let controller = self.controller.lock().await;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "unlocked": controller.is_unlocked(),
            "unlock_in_flight": self.gate.is_in_flight(),
            // The collection size is gated like its contents.
            "people": controller.is_unlocked().then(|| controller.len()),
            "photo_dir": controller.photo_dir().display().to_string(),
            "camera": self.camera_device,
        })
        .to_string())
    }
}
