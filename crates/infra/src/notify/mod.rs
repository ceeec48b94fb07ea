pub mod log;
pub mod smtp;

pub use log::TracingNotifier;
pub use smtp::{SmtpConfig, SmtpNotifier};
