//! Credential entry value type

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Field of a credential entry, as named in persisted keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    Username,
    Password,
    Description,
}

impl CredentialField {
    /// All fields in emission order
    pub const ALL: [CredentialField; 3] = [Self::Username, Self::Password, Self::Description];

    /// Name used in `credential_<index>_<name>` keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::Description => "description",
        }
    }

    /// Parse a persisted field name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "username" => Some(Self::Username),
            "password" => Some(Self::Password),
            "description" => Some(Self::Description),
            _ => None,
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One username/password/description record.
///
/// Values are stored exactly as given: no trimming, no case-folding.
/// Unset fields are empty strings. The password is wiped from memory when
/// the entry is dropped or the field is overwritten.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialEntry {
    username: String,
    password: String,
    description: String,
}

impl CredentialEntry {
    /// Create a new entry
    pub fn new(username: &str, password: &str, description: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            description: description.to_string(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the password (use carefully)
    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Read a field by name
    pub fn field(&self, field: CredentialField) -> &str {
        match field {
            CredentialField::Username => &self.username,
            CredentialField::Password => &self.password,
            CredentialField::Description => &self.description,
        }
    }

    /// Overwrite a single field
    pub fn set_field(&mut self, field: CredentialField, value: &str) {
        let slot = match field {
            CredentialField::Username => &mut self.username,
            CredentialField::Password => &mut self.password,
            CredentialField::Description => &mut self.description,
        };
        slot.zeroize();
        slot.push_str(value);
    }

    /// Overwrite all three fields (full replace, not merge)
    pub fn replace(&mut self, username: &str, password: &str, description: &str) {
        self.set_field(CredentialField::Username, username);
        self.set_field(CredentialField::Password, password);
        self.set_field(CredentialField::Description, description);
    }

    /// True when no field has been set
    pub fn is_blank(&self) -> bool {
        self.username.is_empty() && self.password.is_empty() && self.description.is_empty()
    }
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_blank() {
        let entry = CredentialEntry::default();
        assert_eq!(entry.username(), "");
        assert_eq!(entry.password(), "");
        assert_eq!(entry.description(), "");
        assert!(entry.is_blank());
    }

    #[test]
    fn test_values_kept_verbatim() {
        let entry = CredentialEntry::new("  Admin ", "p w", "Lobby Cam");
        assert_eq!(entry.username(), "  Admin ");
        assert_eq!(entry.password(), "p w");
        assert_eq!(entry.description(), "Lobby Cam");
    }

    #[test]
    fn test_replace_overwrites_every_field() {
        let mut entry = CredentialEntry::new("admin", "secret", "cam1");
        entry.replace("root", "", "");
        assert_eq!(entry, CredentialEntry::new("root", "", ""));
    }

    #[test]
    fn test_set_field() {
        let mut entry = CredentialEntry::default();
        entry.set_field(CredentialField::Password, "hunter2");
        assert_eq!(entry.field(CredentialField::Password), "hunter2");
        assert!(!entry.is_blank());
    }

    #[test]
    fn test_debug_redacts_password() {
        let entry = CredentialEntry::new("admin", "hunter2", "");
        let debug = format!("{:?}", entry);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_field_names() {
        for field in CredentialField::ALL {
            assert_eq!(CredentialField::parse(field.as_str()), Some(field));
        }
        assert_eq!(CredentialField::parse("token"), None);
    }
}
