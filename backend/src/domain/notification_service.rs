//! Notification relay: patient-facing messages created by lifecycle
//! transitions, read and dismissed by patients.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Notification, Principal};
use crate::storage::{DbConnection, NotificationRepository};

#[derive(Clone)]
pub struct NotificationService {
    db: DbConnection,
    notification_repository: NotificationRepository,
}

impl NotificationService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            db,
            notification_repository: NotificationRepository::new(),
        }
    }

    /// Create an unread notification on the caller's connection, so it
    /// commits or rolls back with the transition that produced it
    pub async fn notify(
        &self,
        conn: &mut SqliteConnection,
        patient_id: i64,
        message: &str,
    ) -> DomainResult<Notification> {
        let notification = self
            .notification_repository
            .insert(conn, patient_id, message, Utc::now())
            .await?;

        info!("Queued notification {} for patient {}", notification.id, patient_id);
        Ok(notification)
    }

    /// Unread notifications of a patient, oldest first. An unknown patient
    /// simply has none.
    pub async fn list_unread(&self, principal: &Principal, patient_id: i64) -> DomainResult<Vec<Notification>> {
        info!("Listing unread notifications for patient {} as {}", patient_id, principal);

        if !principal.acts_for_patient(patient_id) {
            warn!("{} may not read notifications of patient {}", principal, patient_id);
            return Err(DomainError::forbidden("You may only read your own notifications"));
        }

        let mut conn = self.db.acquire().await?;
        let notifications = self.notification_repository.list_unread(&mut conn, patient_id).await?;

        info!("Found {} unread notifications", notifications.len());
        Ok(notifications)
    }

    /// Set the read flag of a notification
    pub async fn mark_read(&self, principal: &Principal, notification_id: i64) -> DomainResult<Notification> {
        info!("Marking notification {} as read", notification_id);

        let mut conn = self.db.acquire().await?;
        let mut notification = self.load_owned(&mut conn, principal, notification_id).await?;

        self.notification_repository.mark_read(&mut conn, notification_id).await?;
        notification.is_read = true;

        Ok(notification)
    }

    /// Delete a notification unconditionally
    pub async fn delete(&self, principal: &Principal, notification_id: i64) -> DomainResult<()> {
        info!("Deleting notification {}", notification_id);

        let mut conn = self.db.acquire().await?;
        self.load_owned(&mut conn, principal, notification_id).await?;

        if !self.notification_repository.delete(&mut conn, notification_id).await? {
            // Removed concurrently between the lookup and the delete
            return Err(not_found(notification_id));
        }

        info!("Deleted notification {}", notification_id);
        Ok(())
    }

    async fn load_owned(
        &self,
        conn: &mut SqliteConnection,
        principal: &Principal,
        notification_id: i64,
    ) -> DomainResult<Notification> {
        let notification = self
            .notification_repository
            .get(conn, notification_id)
            .await?
            .ok_or_else(|| not_found(notification_id))?;

        if !principal.acts_for_patient(notification.patient_id) {
            warn!("{} may not modify notification {}", principal, notification_id);
            return Err(DomainError::forbidden("You may only manage your own notifications"));
        }

        Ok(notification)
    }
}

fn not_found(notification_id: i64) -> DomainError {
    DomainError::not_found(format!("Notification {} not found", notification_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::seed_patient;

    async fn setup_test() -> (NotificationService, DbConnection, i64) {
        let db = DbConnection::init_in_memory().await.expect("Failed to create test database");
        let patient_id = seed_patient(&db, "carol").await;
        (NotificationService::new(db.clone()), db, patient_id)
    }

    async fn send(service: &NotificationService, db: &DbConnection, patient_id: i64, message: &str) -> Notification {
        let mut conn = db.acquire().await.unwrap();
        service.notify(&mut conn, patient_id, message).await.expect("Failed to notify")
    }

    #[tokio::test]
    async fn test_list_unread_in_creation_order() {
        let (service, db, patient_id) = setup_test().await;
        let other_patient = seed_patient(&db, "dave").await;

        send(&service, &db, patient_id, "first").await;
        send(&service, &db, other_patient, "not yours").await;
        send(&service, &db, patient_id, "second").await;

        let principal = Principal::Patient { patient_id };
        let unread = service.list_unread(&principal, patient_id).await.unwrap();
        let messages: Vec<&str> = unread.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert!(unread.iter().all(|n| !n.is_read));
    }

    #[tokio::test]
    async fn test_list_unread_empty_for_unknown_patient() {
        let (service, _db, _patient_id) = setup_test().await;

        let unread = service.list_unread(&Principal::Staff, 999).await.unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_list_unread_forbidden_for_other_patient() {
        let (service, _db, patient_id) = setup_test().await;

        let intruder = Principal::Patient { patient_id: patient_id + 1 };
        let result = service.list_unread(&intruder, patient_id).await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        let doctor = Principal::Doctor { doctor_id: 1 };
        assert!(matches!(service.list_unread(&doctor, patient_id).await, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_mark_read_hides_notification() {
        let (service, db, patient_id) = setup_test().await;
        let notification = send(&service, &db, patient_id, "hello").await;
        let principal = Principal::Patient { patient_id };

        let updated = service.mark_read(&principal, notification.id).await.unwrap();
        assert!(updated.is_read);
        assert_eq!(updated.created_at, notification.created_at);

        let unread = service.list_unread(&principal, patient_id).await.unwrap();
        assert!(unread.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (service, db, patient_id) = setup_test().await;
        let notification = send(&service, &db, patient_id, "bye").await;
        let principal = Principal::Patient { patient_id };

        service.delete(&principal, notification.id).await.expect("Failed to delete");

        let result = service.delete(&principal, notification.id).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found_even_for_strangers() {
        let (service, _db, _patient_id) = setup_test().await;

        let result = service.delete(&Principal::Patient { patient_id: 42 }, 999).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_forbidden_for_other_patient() {
        let (service, db, patient_id) = setup_test().await;
        let notification = send(&service, &db, patient_id, "private").await;

        let result = service
            .delete(&Principal::Patient { patient_id: patient_id + 1 }, notification.id)
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));

        // Staff may remove it
        service.delete(&Principal::Staff, notification.id).await.expect("Staff delete failed");
    }
}
