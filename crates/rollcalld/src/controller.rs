//! The single controller: gallery state, photo files and the people table,
//! kept in step by every mutation.

use std::path::Path;

use image::DynamicImage;
use rollcall_core::{Gallery, GalleryError, PhotoStore, Person};
use serde::Serialize;
use thiserror::Error;

use crate::store::{PeopleStore, StoreError};

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One cell of the grid.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    pub index: usize,
    pub name: String,
    pub image: String,
    pub path: String,
}

pub struct Controller {
    gallery: Gallery,
    photos: PhotoStore,
    store: PeopleStore,
    jpeg_quality: u8,
}

impl Controller {
    /// Load stored people into a locked gallery.
    pub async fn load(
        photos: PhotoStore,
        store: PeopleStore,
        jpeg_quality: u8,
    ) -> Result<Self, ControllerError> {
        let people = store.load_all().await?;
        tracing::info!(people = people.len(), "people loaded");
        Ok(Self {
            gallery: Gallery::with_people(people),
            photos,
            store,
            jpeg_quality,
        })
    }

    pub fn is_unlocked(&self) -> bool {
        self.gallery.is_unlocked()
    }

    pub fn len(&self) -> usize {
        self.gallery.len()
    }

    pub fn photo_dir(&self) -> &Path {
        self.photos.dir()
    }

    pub fn unlock(&mut self) {
        self.gallery.unlock();
    }

    pub fn lock(&mut self) {
        self.gallery.lock();
    }

    /// Refuse early when locked, before any image source is touched.
    pub fn ensure_unlocked(&self) -> Result<(), GalleryError> {
        self.gallery.ensure_unlocked()
    }

    /// Store `image` and append a new person for it.
    pub async fn add_image(&mut self, image: &DynamicImage) -> Result<usize, ControllerError> {
        self.gallery.ensure_unlocked()?;
        let file = self.photos.save(image, self.jpeg_quality)?;
        self.append(file).await
    }

    /// Copy an existing image file into the store and append a person.
    pub async fn add_from_library(&mut self, source: &Path) -> Result<usize, ControllerError> {
        self.gallery.ensure_unlocked()?;
        let file = self.photos.import(source, self.jpeg_quality)?;
        self.append(file).await
    }

    async fn append(&mut self, file: String) -> Result<usize, ControllerError> {
        let person = Person::new(file);
        if let Err(e) = self.store.insert(&person).await {
            self.discard_photo(&person.image);
            return Err(e.into());
        }
        let index = self.gallery.add(person)?;
        tracing::info!(index, "person added");
        Ok(index)
    }

    pub async fn rename(&mut self, index: usize, name: &str) -> Result<(), ControllerError> {
        let id = self.gallery.ensure_visible(index)?.id.clone();
        self.store.rename(&id, name).await?;
        self.gallery.rename(index, name)?;
        tracing::info!(index, name, "person renamed");
        Ok(())
    }

    /// Remove the person at `index` together with its photo file.
    pub async fn delete(&mut self, index: usize) -> Result<(), ControllerError> {
        let id = self.gallery.ensure_visible(index)?.id.clone();
        self.store.delete(&id).await?;
        let person = self.gallery.remove(index)?;
        self.discard_photo(&person.image);
        tracing::info!(index, "person deleted");
        Ok(())
    }

    fn discard_photo(&self, file: &str) {
        if let Err(e) = self.photos.remove(file) {
            tracing::warn!(file, error = %e, "failed to remove photo file");
        }
    }

    /// Grid contents; empty while locked.
    pub fn visible(&self) -> Vec<Row> {
        self.gallery
            .visible()
            .iter()
            .enumerate()
            .map(|(index, p)| Row {
                index,
                name: p.name.clone(),
                image: p.image.clone(),
                path: self.photos.path(&p.image).to_string_lossy().into_owned(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn photo() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([200, 10, 10])))
    }

    async fn controller(dir: &Path) -> Controller {
        let photos = PhotoStore::open(dir.join("photos")).unwrap();
        let store = PeopleStore::open(&dir.join("people.db")).await.unwrap();
        Controller::load(photos, store, 80).await.unwrap()
    }

    fn photo_count(dir: &Path) -> usize {
        std::fs::read_dir(dir.join("photos")).unwrap().count()
    }

    #[tokio::test]
    async fn test_add_when_locked_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut c = controller(tmp.path()).await;

        let err = c.add_image(&photo()).await.unwrap_err();
        assert!(matches!(err, ControllerError::Gallery(GalleryError::Locked)));
        assert_eq!(c.len(), 0);
        assert_eq!(photo_count(tmp.path()), 0);
    }

    #[tokio::test]
    async fn test_add_rename_delete_write_through() {
        let tmp = tempfile::tempdir().unwrap();
        let mut c = controller(tmp.path()).await;
        c.unlock();

        assert_eq!(c.add_image(&photo()).await.unwrap(), 0);
        assert_eq!(c.add_image(&photo()).await.unwrap(), 1);
        c.rename(1, "Grace").await.unwrap();

        let rows = c.visible();
        assert_eq!(rows[0].name, "Unknown");
        assert_eq!(rows[1].name, "Grace");
        assert!(Path::new(&rows[1].path).exists());

        c.delete(0).await.unwrap();
        assert!(!Path::new(&rows[0].path).exists());
        assert_eq!(photo_count(tmp.path()), 1);

        // A fresh controller sees the same list, locked.
        drop(c);
        let mut reloaded = controller(tmp.path()).await;
        assert!(reloaded.visible().is_empty());
        reloaded.unlock();
        let rows = reloaded.visible();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].name, "Grace");
    }

    #[tokio::test]
    async fn test_lock_hides_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let mut c = controller(tmp.path()).await;
        c.unlock();
        c.add_image(&photo()).await.unwrap();

        c.lock();
        assert!(c.visible().is_empty());
        assert!(matches!(
            c.rename(0, "x").await,
            Err(ControllerError::Gallery(GalleryError::Locked))
        ));
        assert_eq!(c.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_index() {
        let tmp = tempfile::tempdir().unwrap();
        let mut c = controller(tmp.path()).await;
        c.unlock();
        assert!(matches!(
            c.delete(0).await,
            Err(ControllerError::Gallery(GalleryError::NoSuchPerson(0)))
        ));
    }

    #[tokio::test]
    async fn test_add_from_library() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("pick.png");
        photo().save(&source).unwrap();

        let mut c = controller(tmp.path()).await;
        c.unlock();
        c.add_from_library(&source).await.unwrap();
        assert_eq!(c.visible().len(), 1);
        assert_eq!(photo_count(tmp.path()), 1);
    }
}
