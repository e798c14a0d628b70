//! Storage, rate limiting and notification adapters for application ports.

#![forbid(unsafe_code)]

mod console_notification_sender;
mod in_memory_academy_repository;
mod in_memory_activity_log_repository;
mod in_memory_rate_limit_repository;
mod postgres_academy_repository;
mod postgres_activity_log_repository;
mod postgres_rate_limit_repository;
mod redis_rate_limit_repository;

#[cfg(test)]
mod postgres_test_support;

pub use console_notification_sender::ConsoleNotificationSender;
pub use in_memory_academy_repository::InMemoryAcademyRepository;
pub use in_memory_activity_log_repository::InMemoryActivityLogRepository;
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use postgres_academy_repository::PostgresAcademyRepository;
pub use postgres_activity_log_repository::PostgresActivityLogRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
