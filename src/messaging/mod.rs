// Messaging - lock-free communication between UI, core, and audio callback

pub mod channels;
pub mod command;
pub mod notification;

pub use channels::{
    CommandConsumer, CommandProducer, NotificationConsumer, NotificationProducer,
    SharedNotificationProducer, create_command_channel, create_notification_channel, notify,
};
pub use command::Command;
pub use notification::{Notification, NotificationCategory, NotificationLevel};
