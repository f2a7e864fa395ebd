use crate::domain::models::Notification as DomainNotification;
use crate::io::rest::mappers::format_timestamp;
use shared::Notification as SharedNotification;

/// Mapper to convert domain notifications to shared DTOs.
pub struct NotificationMapper;

impl NotificationMapper {
    pub fn to_dto(domain: DomainNotification) -> SharedNotification {
        SharedNotification {
            id: domain.id,
            patient_id: domain.patient_id,
            message: domain.message,
            is_read: domain.is_read,
            created_at: format_timestamp(domain.created_at),
        }
    }

    pub fn to_dto_list(domain: Vec<DomainNotification>) -> Vec<SharedNotification> {
        domain.into_iter().map(Self::to_dto).collect()
    }
}
