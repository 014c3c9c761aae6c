pub mod email;
pub mod factory;
pub mod realtime;
pub mod repositories;
pub mod video;
