use crate::error::Result;

/// Abstract interface for raw key/value storage I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory), while
/// `DocumentStore` handles the "what" (collection rules, migration).
/// Values are opaque serialized strings.
pub trait StorageBackend {
    /// Read the value stored under `key`.
    /// Returns Ok(None) if the key has never been written or was removed.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether `key` currently holds a value.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }
}
