//! Health-event messages and the per-actor message bus.
//!
//! A [`MessageBus`] is a list of listeners that receive [`Message`]s
//! synchronously, in registration order. Registration and removal are
//! explicit; nothing is tracked automatically. Broadcasts iterate over a
//! snapshot taken when the broadcast starts, so listeners may add or remove
//! entries (including themselves) from inside a delivery.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::warn;
use warden_common::{EntityId, ListenerId};

/// Immutable description of one damage application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageMessage {
    /// Entity that dealt the damage
    pub damager: EntityId,
    /// Damage amount (never negative)
    pub amount: f32,
    /// Direction the hit travels in
    pub direction: Vec3,
    /// World position the hit originates from
    pub damage_source: Vec3,
    /// Damage came from a thrown object
    pub throwing: bool,
    /// Requests camera/feedback emphasis
    pub stop_camera: bool,
}

impl DamageMessage {
    /// Creates a damage message with no positional information.
    #[must_use]
    pub fn new(damager: EntityId, amount: f32) -> Self {
        Self {
            damager,
            amount: amount.max(0.0),
            direction: Vec3::ZERO,
            damage_source: Vec3::ZERO,
            throwing: false,
            stop_camera: false,
        }
    }

    /// Sets the position the damage originates from.
    #[must_use]
    pub fn with_source(mut self, source: Vec3) -> Self {
        self.damage_source = source;
        self
    }

    /// Sets the travel direction of the hit.
    #[must_use]
    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = direction;
        self
    }

    /// Marks the damage as coming from a thrown object.
    #[must_use]
    pub fn thrown(mut self) -> Self {
        self.throwing = true;
        self
    }

    /// Requests camera emphasis for this hit.
    #[must_use]
    pub fn with_camera_stop(mut self) -> Self {
        self.stop_camera = true;
        self
    }
}

/// Discriminant of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Non-lethal damage was applied
    Damaged,
    /// Damage brought health to zero or below
    Died,
    /// The actor was re-activated
    Respawn,
}

/// A health event, carrying the payload that belongs to its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Non-lethal damage was applied
    Damaged(DamageMessage),
    /// Lethal damage was applied
    Died(DamageMessage),
    /// The actor was re-activated with full health
    Respawn,
}

impl Message {
    /// Returns the kind of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Damaged(_) => MessageKind::Damaged,
            Self::Died(_) => MessageKind::Died,
            Self::Respawn => MessageKind::Respawn,
        }
    }

    /// Returns the damage payload, if this kind carries one.
    #[must_use]
    pub const fn damage(&self) -> Option<&DamageMessage> {
        match self {
            Self::Damaged(data) | Self::Died(data) => Some(data),
            Self::Respawn => None,
        }
    }
}

/// Capability of receiving bus messages.
///
/// Receivers are shared handles, so delivery takes `&self`; implementors
/// keep any mutable state behind interior mutability.
pub trait MessageReceiver {
    /// Handles one message sent by `sender`.
    fn on_receive_message(&self, sender: EntityId, message: &Message);
}

/// How the bus holds on to a listener.
#[derive(Clone)]
pub enum ListenerHandle {
    /// The bus keeps the listener alive
    Owned(Rc<dyn MessageReceiver>),
    /// The listener's lifetime is managed elsewhere; dropped listeners are skipped
    Weak(Weak<dyn MessageReceiver>),
}

impl ListenerHandle {
    fn upgrade(&self) -> Option<Rc<dyn MessageReceiver>> {
        match self {
            Self::Owned(rc) => Some(Rc::clone(rc)),
            Self::Weak(weak) => weak.upgrade(),
        }
    }

    /// Address of the listener, for identity checks.
    fn address(&self) -> *const () {
        match self {
            Self::Owned(rc) => Rc::as_ptr(rc).cast(),
            Self::Weak(weak) => weak.as_ptr().cast(),
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owned(_) => f.write_str("Owned"),
            Self::Weak(weak) => write!(f, "Weak(alive: {})", weak.strong_count() > 0),
        }
    }
}

#[derive(Debug)]
struct Entry {
    id: ListenerId,
    handle: ListenerHandle,
}

#[derive(Debug, Default)]
struct Registry {
    entries: Vec<Entry>,
    next_id: u32,
}

/// Per-actor list of message listeners.
///
/// Cloning a bus yields another handle to the same listener list, which is
/// how a listener gets to deregister itself during a delivery.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    registry: Rc<RefCell<Registry>>,
}

impl MessageBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener that the bus keeps alive.
    pub fn add(&self, listener: Rc<dyn MessageReceiver>) -> ListenerId {
        self.insert(ListenerHandle::Owned(listener))
    }

    /// Registers a listener without extending its lifetime.
    pub fn add_weak<R: MessageReceiver + 'static>(&self, listener: &Rc<R>) -> ListenerId {
        let shared: Rc<dyn MessageReceiver> = Rc::clone(listener) as Rc<dyn MessageReceiver>;
        self.insert(ListenerHandle::Weak(Rc::downgrade(&shared)))
    }

    /// Registering a listener that is already on the bus returns its
    /// existing id.
    fn insert(&self, handle: ListenerHandle) -> ListenerId {
        let mut registry = self.registry.borrow_mut();
        let address = handle.address();
        if let Some(entry) = registry
            .entries
            .iter()
            .find(|entry| std::ptr::eq(entry.handle.address(), address))
        {
            warn!(listener = ?entry.id, "listener already registered");
            return entry.id;
        }
        let id = ListenerId::new(registry.next_id);
        registry.next_id = registry.next_id.wrapping_add(1);
        registry.entries.push(Entry { id, handle });
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let before = registry.entries.len();
        registry.entries.retain(|entry| entry.id != id);
        registry.entries.len() != before
    }

    /// Checks if a listener is currently registered.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.registry
            .borrow()
            .entries
            .iter()
            .any(|entry| entry.id == id)
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.borrow().entries.is_empty()
    }

    /// Delivers `message` to every listener, in registration order.
    ///
    /// The listener list is snapshotted first. A listener removed by an
    /// earlier delivery in the same broadcast is skipped; a listener added
    /// during the broadcast first hears the next one. Weak listeners whose
    /// target was dropped are pruned. Returns the number of deliveries.
    pub fn broadcast(&self, sender: EntityId, message: &Message) -> usize {
        let snapshot: Vec<(ListenerId, Rc<dyn MessageReceiver>)> = {
            let mut registry = self.registry.borrow_mut();
            registry
                .entries
                .retain(|entry| !matches!(&entry.handle, ListenerHandle::Weak(w) if w.strong_count() == 0));
            registry
                .entries
                .iter()
                .filter_map(|entry| entry.handle.upgrade().map(|rc| (entry.id, rc)))
                .collect()
        };

        let mut delivered = 0;
        for (id, listener) in snapshot {
            if !self.contains(id) {
                continue;
            }
            listener.on_receive_message(sender, message);
            delivered += 1;
        }
        delivered
    }
}

/// A receiver that queues messages for its owner to handle later.
///
/// Actors register an inbox on their own bus: delivery stays synchronous,
/// while the reaction (such as switching to the death state) runs once the
/// damage call has returned and the actor is free to mutate itself.
#[derive(Debug, Default)]
pub struct Inbox {
    messages: RefCell<Vec<(EntityId, Message)>>,
}

impl Inbox {
    /// Creates an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued message.
    pub fn take(&self) -> Vec<(EntityId, Message)> {
        std::mem::take(&mut *self.messages.borrow_mut())
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl MessageReceiver for Inbox {
    fn on_receive_message(&self, sender: EntityId, message: &Message) {
        self.messages.borrow_mut().push((sender, message.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Records the order in which listeners hear a broadcast.
    struct OrderProbe {
        tag: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl MessageReceiver for OrderProbe {
        fn on_receive_message(&self, _sender: EntityId, _message: &Message) {
            self.log.borrow_mut().push(self.tag);
        }
    }

    /// Removes a listener (possibly itself) while being delivered to.
    struct Remover {
        bus: MessageBus,
        victim: Cell<Option<ListenerId>>,
        hits: Cell<u32>,
    }

    impl MessageReceiver for Remover {
        fn on_receive_message(&self, _sender: EntityId, _message: &Message) {
            self.hits.set(self.hits.get() + 1);
            if let Some(id) = self.victim.take() {
                self.bus.remove(id);
            }
        }
    }

    fn probe(tag: u32, log: &Rc<RefCell<Vec<u32>>>) -> Rc<OrderProbe> {
        Rc::new(OrderProbe {
            tag,
            log: Rc::clone(log),
        })
    }

    fn hit() -> Message {
        Message::Damaged(DamageMessage::new(EntityId::new(), 10.0))
    }

    #[test]
    fn test_message_kind_and_payload() {
        let data = DamageMessage::new(EntityId::new(), 5.0);
        assert_eq!(Message::Damaged(data).kind(), MessageKind::Damaged);
        assert_eq!(Message::Died(data).damage(), Some(&data));
        assert!(Message::Respawn.damage().is_none());
    }

    #[test]
    fn test_damage_message_clamps_negative_amount() {
        let data = DamageMessage::new(EntityId::new(), -3.0);
        assert_eq!(data.amount, 0.0);
    }

    #[test]
    fn test_broadcast_registration_order() {
        let bus = MessageBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.add(probe(1, &log));
        bus.add(probe(2, &log));
        bus.add(probe(3, &log));

        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let bus = MessageBus::new();
        let inbox = Rc::new(Inbox::new());
        let first = bus.add(inbox.clone());
        let second = bus.add(inbox.clone());
        let weak = bus.add_weak(&inbox);

        assert_eq!(first, second);
        assert_eq!(first, weak);
        assert_eq!(bus.len(), 1);
        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 1);
        assert_eq!(inbox.len(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let bus = MessageBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = bus.add(probe(1, &log));

        assert!(bus.remove(id));
        assert!(!bus.remove(id));
        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 0);
    }

    #[test]
    fn test_remove_later_listener_during_broadcast() {
        let bus = MessageBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let remover = Rc::new(Remover {
            bus: bus.clone(),
            victim: Cell::new(None),
            hits: Cell::new(0),
        });
        bus.add(remover.clone());
        let victim = bus.add(probe(2, &log));
        bus.add(probe(3, &log));
        remover.victim.set(Some(victim));

        let delivered = bus.broadcast(EntityId::new(), &hit());

        // the removed listener is not delivered to, the rest hear it exactly once
        assert_eq!(delivered, 2);
        assert_eq!(*log.borrow(), vec![3]);
        assert_eq!(remover.hits.get(), 1);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_listener_removes_itself_during_broadcast() {
        let bus = MessageBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.add(probe(1, &log));
        let remover = Rc::new(Remover {
            bus: bus.clone(),
            victim: Cell::new(None),
            hits: Cell::new(0),
        });
        let own_id = bus.add(remover.clone());
        remover.victim.set(Some(own_id));
        bus.add(probe(3, &log));

        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 3);
        assert_eq!(*log.borrow(), vec![1, 3]);

        bus.broadcast(EntityId::new(), &hit());
        assert_eq!(remover.hits.get(), 1);
        assert_eq!(*log.borrow(), vec![1, 3, 1, 3]);
    }

    #[test]
    fn test_listener_added_during_broadcast_waits() {
        struct Adder {
            bus: MessageBus,
            late: Rc<OrderProbe>,
            done: Cell<bool>,
        }
        impl MessageReceiver for Adder {
            fn on_receive_message(&self, _sender: EntityId, _message: &Message) {
                if !self.done.replace(true) {
                    self.bus.add(self.late.clone());
                }
            }
        }

        let bus = MessageBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.add(Rc::new(Adder {
            bus: bus.clone(),
            late: probe(9, &log),
            done: Cell::new(false),
        }));

        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 1);
        assert!(log.borrow().is_empty());

        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 2);
        assert_eq!(*log.borrow(), vec![9]);
    }

    #[test]
    fn test_weak_listener_pruned_after_drop() {
        let bus = MessageBus::new();
        let inbox = Rc::new(Inbox::new());
        bus.add_weak(&inbox);

        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 1);
        assert_eq!(inbox.len(), 1);

        drop(inbox);
        assert_eq!(bus.broadcast(EntityId::new(), &hit()), 0);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_inbox_take() {
        let inbox = Inbox::new();
        let sender = EntityId::new();
        inbox.on_receive_message(sender, &Message::Respawn);

        let taken = inbox.take();
        assert_eq!(taken, vec![(sender, Message::Respawn)]);
        assert!(inbox.is_empty());
    }
}
