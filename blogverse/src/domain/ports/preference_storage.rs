//! Port for durable client-side key/value preferences.

use super::define_port_error;

define_port_error! {
    /// Errors raised by preference storage adapters.
    pub enum PreferenceStorageError {
        /// Reading or writing the backing medium failed.
        Io {
            /// Underlying io error text.
            message: String,
        } => "preference storage io failed: {message}",
        /// Stored data could not be decoded.
        Corrupt {
            /// Decoder error text.
            message: String,
        } => "preference storage corrupt: {message}",
    }
}

/// Durable string key/value storage, read at start-up and written on change.
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceStorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceStorageError>;
}
