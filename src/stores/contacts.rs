//! Trusted circle

use crate::error::GuardianError;
use crate::models::TrustedContact;
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBook {
    contacts: Vec<TrustedContact>,
}

impl ContactBook {
    pub fn new(contacts: Vec<TrustedContact>) -> Self {
        Self { contacts }
    }

    pub fn seeded() -> Self {
        let contact = |id, name: &str, relationship: &str, enabled| TrustedContact {
            id,
            name: name.to_string(),
            relationship: relationship.to_string(),
            enabled,
        };

        Self::new(vec![
            contact(1, "Javier Astudillo", "Hijo", true),
            contact(2, "María González", "Hija", true),
            contact(3, "Carlos Mendoza", "Hermano", false),
        ])
    }

    pub fn all(&self) -> &[TrustedContact] {
        &self.contacts
    }

    pub fn get(&self, id: u32) -> Option<&TrustedContact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn require(&self, id: u32) -> Result<&TrustedContact> {
        self.get(id)
            .ok_or_else(|| GuardianError::NotFound(format!("trusted contact {}", id)))
    }

    /// Flips `enabled` and returns the new value
    pub fn toggle(&mut self, id: u32) -> Result<bool> {
        let contact = self
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| GuardianError::NotFound(format!("trusted contact {}", id)))?;
        contact.enabled = !contact.enabled;
        Ok(contact.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &TrustedContact> {
        self.contacts.iter().filter(|c| c.enabled)
    }
}

impl Default for ContactBook {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_state() {
        let mut book = ContactBook::seeded();
        for contact in ContactBook::seeded().all() {
            let original = contact.enabled;
            assert_eq!(book.toggle(contact.id).unwrap(), !original);
            assert_eq!(book.toggle(contact.id).unwrap(), original);
        }
        assert_eq!(book, ContactBook::seeded());
    }

    #[test]
    fn toggle_unknown_contact_fails() {
        let mut book = ContactBook::seeded();
        assert!(matches!(book.toggle(99), Err(GuardianError::NotFound(_))));
    }

    #[test]
    fn seed_has_two_enabled_contacts() {
        assert_eq!(ContactBook::seeded().enabled().count(), 2);
    }
}
