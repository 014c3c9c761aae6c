pub mod calendar;
pub mod conflict;
pub mod notifier;
pub mod scheduler;
pub mod time_normalizer;
