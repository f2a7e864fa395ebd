use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub phone_number: String,
}
