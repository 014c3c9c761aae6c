pub mod auth;
pub mod calendar;
pub mod course;
pub mod enrollment;
pub mod notification;
pub mod session;
pub mod user;
