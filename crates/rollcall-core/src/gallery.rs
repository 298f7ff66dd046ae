//! The person list and its locked/unlocked projection.

use crate::error::GalleryError;
use crate::types::Person;

/// People collection gated by a lock flag.
///
/// The visible projection is computed from `people` and `unlocked` on every
/// read: it is the whole list when unlocked and empty when locked.
#[derive(Debug, Default, Clone)]
pub struct Gallery {
    people: Vec<Person>,
    unlocked: bool,
}

impl Gallery {
    /// Empty, locked gallery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locked gallery over previously stored people.
    pub fn with_people(people: Vec<Person>) -> Self {
        Self {
            people,
            unlocked: false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Backing list, regardless of lock state.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// What the grid shows.
    pub fn visible(&self) -> &[Person] {
        if self.unlocked {
            &self.people
        } else {
            &[]
        }
    }

    pub fn get(&self, index: usize) -> Option<&Person> {
        self.people.get(index)
    }

    pub fn unlock(&mut self) {
        self.unlocked = true;
        tracing::info!(people = self.people.len(), "gallery unlocked");
    }

    pub fn lock(&mut self) {
        self.unlocked = false;
        tracing::info!("gallery locked");
    }

    pub fn ensure_unlocked(&self) -> Result<(), GalleryError> {
        if self.unlocked {
            Ok(())
        } else {
            Err(GalleryError::Locked)
        }
    }

    /// Check that `index` names a visible person.
    pub fn ensure_visible(&self, index: usize) -> Result<&Person, GalleryError> {
        self.ensure_unlocked()?;
        self.people
            .get(index)
            .ok_or(GalleryError::NoSuchPerson(index))
    }

    /// Append a person, returning its grid position.
    pub fn add(&mut self, person: Person) -> Result<usize, GalleryError> {
        self.ensure_unlocked()?;
        self.people.push(person);
        Ok(self.people.len() - 1)
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<&Person, GalleryError> {
        self.ensure_visible(index)?;
        let person = &mut self.people[index];
        person.name = name.to_string();
        Ok(person)
    }

    pub fn remove(&mut self, index: usize) -> Result<Person, GalleryError> {
        self.ensure_visible(index)?;
        Ok(self.people.remove(index))
    }
}
