//! Configuration access port trait.
//!
//! Values come back as raw strings; the domain decides how to parse them so
//! that a malformed value can be reported against its section and key.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Keys present in `section`, sorted. Empty when the section is absent.
    fn keys(&self, section: &str) -> Vec<String>;

    fn has_section(&self, section: &str) -> bool {
        !self.keys(section).is_empty()
    }
}
