// Communication channels
// Lock-free notification ring buffer (engine → UI) and the loop command channel

use crate::messaging::command::LoopCommand;
use crate::messaging::notification::{Notification, NotificationKind};
use crossbeam_channel::{Receiver, Sender};
use ringbuf::{
    HeapRb,
    traits::{Producer, Split},
};
use std::sync::{Arc, Mutex};

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Notification producer shared by the controller and its clock thread
pub type SharedNotificationProducer = Arc<Mutex<NotificationProducer>>;

/// Pushes a notification without ever blocking on a full buffer
pub fn notify(producer: &SharedNotificationProducer, kind: NotificationKind) {
    let Ok(mut producer) = producer.lock() else {
        log::warn!("Notification channel poisoned, dropping {:?}", kind);
        return;
    };
    if let Err(dropped) = producer.try_push(Notification::new(kind)) {
        log::warn!("Notification buffer full, dropping {:?}", dropped.kind);
    }
}

pub type CommandSender = Sender<LoopCommand>;
pub type CommandReceiver = Receiver<LoopCommand>;

/// Command channel to one clock thread
pub fn create_command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    crossbeam_channel::bounded(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_notify_drops_when_full() {
        let (producer, mut consumer) = create_notification_channel(1);
        let producer = Arc::new(Mutex::new(producer));

        notify(&producer, NotificationKind::SetlistComplete);
        notify(&producer, NotificationKind::CountInComplete);

        let first = consumer.try_pop().unwrap();
        assert_eq!(first.kind, NotificationKind::SetlistComplete);
        assert!(consumer.try_pop().is_none());
    }
}
