//! Bridges from background delivery into the foreground view.

pub mod foreground;

pub use self::foreground::ForegroundBridge;
