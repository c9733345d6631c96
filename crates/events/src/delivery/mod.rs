//! External delivery channels for alarm notifications.

pub mod email;
