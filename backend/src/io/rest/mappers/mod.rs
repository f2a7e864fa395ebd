pub mod appointment_mapper;
pub mod directory_mapper;
pub mod notification_mapper;

pub use appointment_mapper::AppointmentMapper;
pub use directory_mapper::DirectoryMapper;
pub use notification_mapper::NotificationMapper;

use chrono::{DateTime, SecondsFormat, Utc};

/// Wire format for every timestamp: RFC 3339, UTC, whole seconds
pub(crate) fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
