//! EagleEye event bus and alarm notification.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the event envelope published on the bus.
//! - [`AlarmNotificationService`]: background consumer that turns
//!   `alarm.triggered` events into outbound notifications.
//! - [`delivery`]: external delivery channels (SMTP email).

pub mod bus;
pub mod delivery;
pub mod notifier;

pub use bus::{DomainEvent, EventBus, ALARM_TRIGGERED};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use notifier::AlarmNotificationService;
