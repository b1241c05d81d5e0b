//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent or blank; `Err` carries the value
    /// that is not a recognised boolean.
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;

    /// Keys of `section` in the order they appear in the source. Empty when
    /// the section is absent.
    fn get_keys(&self, section: &str) -> Vec<String>;
}
