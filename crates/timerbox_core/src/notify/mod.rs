use crate::error::AppError;
use crate::runtime::CompletionEvent;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsNotifier;

pub const NOTIFICATION_TITLE: &str = "Timer Complete";
const DISABLE_ENV_VAR: &str = "TIMERBOX_DISABLE_NOTIFICATIONS";

pub trait Notifier {
    fn notify(&self, event: &CompletionEvent) -> Result<(), AppError>;
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &CompletionEvent) -> Result<(), AppError> {
        Ok(())
    }
}

/// Desktop notifier unless disabled by `enabled == false`, by the
/// environment, or by the platform.
pub fn notifier_for(enabled: bool) -> Box<dyn Notifier> {
    if !enabled || std::env::var(DISABLE_ENV_VAR).is_ok() {
        return Box::new(NoopNotifier);
    }

    match platform_notifier() {
        Ok(notifier) => notifier,
        Err(err) => {
            tracing::debug!(error = %err, "desktop notifications unavailable");
            Box::new(NoopNotifier)
        }
    }
}

#[cfg(target_os = "linux")]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(LinuxNotifier))
}

#[cfg(windows)]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Ok(Box::new(WindowsNotifier))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_notifier() -> Result<Box<dyn Notifier>, AppError> {
    Err(AppError::invalid_data(
        "notifications are not supported on this platform",
    ))
}
