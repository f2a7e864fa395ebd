pub mod appointment;
pub mod doctor;
pub mod notification;
pub mod patient;
pub mod principal;
pub mod user;

pub use appointment::{Appointment, AppointmentDetails, AppointmentStatus};
pub use doctor::Doctor;
pub use notification::Notification;
pub use patient::Patient;
pub use principal::Principal;
pub use user::UserAccount;
