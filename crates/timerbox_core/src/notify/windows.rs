use crate::error::AppError;
use crate::notify::{NOTIFICATION_TITLE, Notifier};
use crate::runtime::CompletionEvent;
use tauri_winrt_notification::Toast;

pub struct WindowsNotifier;

impl Notifier for WindowsNotifier {
    fn notify(&self, event: &CompletionEvent) -> Result<(), AppError> {
        Toast::new(Toast::POWERSHELL_APP_ID)
            .title(NOTIFICATION_TITLE)
            .text1(&event.message())
            .text2(&event.category)
            .show()
            .map_err(|err| AppError::io(err.to_string()))?;
        Ok(())
    }
}
