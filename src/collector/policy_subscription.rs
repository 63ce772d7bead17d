use crate::collector::PolicyChange;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::debug;

/// Unique (per collector) identifier of a policy subscription.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of the policy change notifications. Notifications are buffered without a
/// limit, so a slow subscriber never holds the collector back.
#[derive(Debug)]
pub struct PolicySubscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<PolicyChange>,
}

impl PolicySubscription {
    /// Returns the id to pass to `RuleCollector::unsubscribe`.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next notification. Returns `None` once the subscription is cancelled and
    /// all buffered notifications are consumed.
    pub async fn recv(&mut self) -> Option<PolicyChange> {
        self.receiver.recv().await
    }

    /// Returns the next buffered notification, if any.
    pub fn try_recv(&mut self) -> Option<PolicyChange> {
        match self.receiver.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// List of active subscriptions owned by the collector.
#[derive(Debug, Default)]
pub(super) struct PolicySubscribers {
    next_id: u64,
    senders: Vec<(SubscriptionId, UnboundedSender<PolicyChange>)>,
}

impl PolicySubscribers {
    pub fn subscribe(&mut self) -> PolicySubscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.push((id, sender));

        PolicySubscription { id, receiver }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let subscribers_count = self.senders.len();
        self.senders.retain(|(subscription_id, _)| *subscription_id != id);
        self.senders.len() != subscribers_count
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Sends notification to every subscriber, dropping the ones that are gone.
    pub fn notify(&mut self, change: &PolicyChange) {
        self.senders.retain(|(id, sender)| {
            if sender.send(change.clone()).is_ok() {
                true
            } else {
                debug!("Policy subscription ({id:?}) is closed, removing.");
                false
            }
        });
    }
}
