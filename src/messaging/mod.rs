// Messaging - Channels between the controller, the clock thread and the UI

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{
    NotificationConsumer, NotificationProducer, create_command_channel,
    create_notification_channel,
};
pub use command::LoopCommand;
pub use notification::{ConcurrencyMisuse, Notification, NotificationKind, NotificationLevel};
