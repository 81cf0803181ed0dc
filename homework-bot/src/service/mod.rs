//! Service layer
//!
//! Services wrap the raw clients with the bot's delivery policy.
//!
//! All services are trait-based to enable testing and dependency injection.

mod notifier;

// Re-export traits
pub use notifier::Notifier;

// Re-export implementations
pub use notifier::ChatNotifier;
