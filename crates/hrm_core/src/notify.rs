//! User notification sink.
//!
//! Notifications are fire-and-forget: callers never wait on them and a
//! sink must not fail. Notification text never reaches the log.

use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

pub trait Notifier {
    fn notify(&self, message: &str, kind: NoticeKind);
}

/// Routes notifications to the log.
///
/// Only the kind and length are logged: notification text can quote
/// record values.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        let chars = message.chars().count();
        match kind {
            NoticeKind::Success | NoticeKind::Info => {
                info!("event=notify module=notify kind={} chars={chars}", kind.as_str())
            }
            NoticeKind::Warning => {
                warn!("event=notify module=notify kind={} chars={chars}", kind.as_str())
            }
            NoticeKind::Error => {
                error!("event=notify module=notify kind={} chars={chars}", kind.as_str())
            }
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str, kind: NoticeKind) {
        (**self).notify(message, kind);
    }
}
