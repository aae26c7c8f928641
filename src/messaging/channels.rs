// Communication channels lock-free

use std::sync::{Arc, Mutex};

use ringbuf::{HeapRb, traits::Split};

use crate::messaging::command::Command;
use crate::messaging::notification::Notification;

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Producer end shared between every component that raises notifications
/// (scheduler, tempo controller, stats plumbing, audio error callback)
pub type SharedNotificationProducer = Arc<Mutex<NotificationProducer>>;

/// Push a notification, dropping it silently if the channel is full.
/// Notifications are fire-and-forget; losing one under backpressure is
/// preferable to blocking the caller.
pub fn notify(tx: &SharedNotificationProducer, notification: Notification) {
    use ringbuf::traits::Producer;

    if let Ok(mut producer) = tx.lock() {
        let _ = producer.try_push(notification);
    }
}
