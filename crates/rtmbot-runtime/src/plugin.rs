//! Plugins bundle handler registrations.
//!
//! ```rust,ignore
//! struct Greeter;
//!
//! impl Plugin for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn load(&self, bot: &mut Bot) -> anyhow::Result<()> {
//!         bot.respond("^hello$", respond_with("hi!"))?;
//!         Ok(())
//!     }
//! }
//!
//! bot.use_plugin(Greeter)?;
//! ```

use crate::bot::Bot;

/// A reusable set of handlers.
pub trait Plugin {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Whether the plugin can be loaded in the current environment.
    ///
    /// A plugin returning `false` is skipped without error.
    fn can_load(&self) -> bool {
        true
    }

    /// Registers the plugin's handlers on `bot`.
    fn load(&self, bot: &mut Bot) -> anyhow::Result<()>;
}
