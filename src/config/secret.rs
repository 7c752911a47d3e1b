//! Credential handling for the storage connection string
//!
//! The PostgreSQL connection string usually embeds a password, so it is held
//! in a `secrecy::Secret` whose inner value is zeroized on drop and whose
//! `Debug` output is redacted. Call `expose_secret()` only where the raw value
//! is handed to the driver.
//!
//! # Example
//!
//! ```rust
//! use txn_export::config::{secret_string, redact_connection_string};
//! use secrecy::ExposeSecret;
//!
//! let conn = secret_string("postgresql://wallet:pw@db:5432/e_wallet".to_string());
//! assert_eq!(conn.expose_secret().as_ref(), "postgresql://wallet:pw@db:5432/e_wallet");
//! assert_eq!(redact_connection_string(&conn), "postgresql://***@db:5432/e_wallet");
//! ```

use secrecy::{CloneableSecret, DebugSecret, ExposeSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String wrapper implementing the marker traits `Secret` requires
#[derive(Clone, Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Check if the secret value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if the secret value starts with a prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret string: zeroized on drop, redacted in `Debug`
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string into a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}

/// Connection string with the credentials part replaced by `***`
pub fn redact_connection_string(connection_string: &SecretString) -> String {
    let raw: &str = connection_string.expose_secret().as_ref();
    let scheme_end = raw.find("://").map(|i| i + 3).unwrap_or(0);
    match raw.rfind('@') {
        Some(at) if at >= scheme_end => format!("{}***{}", &raw[..scheme_end], &raw[at..]),
        _ => raw.to_string(),
    }
}
