pub mod calendar;
pub mod call;
pub mod course;
pub mod health;
pub mod notification;
pub mod session;
