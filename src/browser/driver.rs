// Sat Oct 17 2026 - Alex

use std::time::Duration;

use super::BrowserError;

/// Browser automation capability. Elements are addressed by their `name` attribute,
/// which is how the registration form identifies its fields.
pub trait BrowserDriver: Send {
    fn start(&mut self) -> Result<(), BrowserError>;

    fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    fn current_url(&mut self) -> Result<String, BrowserError>;

    fn wait_for_named(&mut self, name: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Clears the input then types `value`.
    fn fill_input(&mut self, name: &str, value: &str) -> Result<(), BrowserError>;

    /// Picks the `<option>` whose value attribute equals `value`.
    fn select_option(&mut self, name: &str, value: &str) -> Result<(), BrowserError>;

    fn click(&mut self, name: &str) -> Result<(), BrowserError>;

    fn page_source(&mut self) -> Result<String, BrowserError>;

    /// Ends the session. Must be safe to call more than once.
    fn quit(&mut self);
}
