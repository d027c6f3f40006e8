use crate::error::SendError;
use crate::state::{new_shared, Shared};
use axum::extract::ws::Message;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Côté envoi d'une connexion live.
///
/// Les messages passent par une file bornée vidée par la tâche d'écriture de
/// la connexion : un envoi n'attend jamais le réseau. Lâcher le handle ferme
/// la file, et l'écrivain ferme alors le socket.
#[derive(Debug)]
pub struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<Message>,
}

impl Subscriber {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn send(&self, msg: Message) -> Result<(), SendError> {
        self.tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Bilan d'un passage de livraison sur le registre.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub pruned: Vec<SubscriberId>,
}

/// Ensemble des abonnés connectés. Ajout, retrait et itération sous un seul
/// verrou exclusif ; ordre d'itération non garanti.
#[derive(Clone)]
pub struct SubscriberRegistry {
    inner: Shared<HashMap<SubscriberId, Subscriber>>,
    next_id: Arc<AtomicU64>,
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            inner: new_shared(HashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Enregistre le côté envoi d'une nouvelle connexion. Le registre devient
    /// l'unique propriétaire de `tx`.
    pub fn register(&self, tx: mpsc::Sender<Message>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.lock().insert(id, Subscriber { id, tx });
        id
    }

    /// Retire et ferme un abonné. `false` s'il était déjà parti (élagué par une
    /// diffusion en échec, par exemple).
    pub fn remove(&self, id: SubscriberId) -> bool {
        // le handle est lâché ici, ce qui ferme la file
        self.inner.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Propose `msg` à chaque abonné sous le verrou ; tout abonné dont la file
    /// refuse le message est retiré.
    pub fn deliver(&self, msg: &Message) -> Delivery {
        let mut report = Delivery::default();
        self.inner.lock().retain(|id, sub| match sub.send(msg.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(_) => {
                report.pruned.push(*id);
                false
            }
        });
        report
    }
}
