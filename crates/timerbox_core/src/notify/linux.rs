use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier};
use crate::runtime::CompletionEvent;
use notify_rust::Notification;

pub struct LinuxNotifier;

impl Notifier for LinuxNotifier {
    fn notify(&self, event: &CompletionEvent) -> Result<(), AppError> {
        Notification::new()
            .summary(NOTIFICATION_TITLE)
            .body(&event.message())
            .appname("timerbox")
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
