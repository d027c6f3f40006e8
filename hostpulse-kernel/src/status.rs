use crate::models::{Host, HostStatus, Snapshot, Status};
use crate::state::{new_shared, Shared};
use std::collections::HashMap;

/// Statut courant de chaque hôte surveillé.
///
/// Un seul verrou couvre mises à jour et snapshots. Un snapshot lit les hôtes
/// un par un : une mise à jour concurrente peut y apparaître ou non, mais la
/// valeur d'un hôte n'est jamais déchirée.
#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Shared<HashMap<Host, Status>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self { inner: new_shared(HashMap::new()) }
    }

    /// Passe chaque hôte à `Unknown`. Appelé une fois, avant le lancement des tâches.
    pub fn initialize(&self, hosts: &[Host]) {
        let mut map = self.inner.lock();
        for host in hosts {
            map.insert(host.clone(), Status::Unknown);
        }
    }

    pub fn update(&self, host: &str, status: Status) {
        self.inner.lock().insert(host.to_owned(), status);
    }

    /// Applique un cycle de sondes complet sous une seule prise de verrou.
    pub fn apply<I>(&self, results: I)
    where
        I: IntoIterator<Item = (Host, Status)>,
    {
        let mut map = self.inner.lock();
        map.extend(results);
    }

    pub fn get(&self, host: &str) -> Option<Status> {
        self.inner.lock().get(host).copied()
    }

    /// Lit `hosts` dans l'ordre. Un hôte absent de la map vaut `Unknown`.
    pub fn snapshot(&self, hosts: &[Host]) -> Snapshot {
        hosts
            .iter()
            .map(|host| HostStatus {
                host: host.clone(),
                status: self.get(host).unwrap_or(Status::Unknown),
            })
            .collect()
    }
}
