use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifiant opaque d'hôte (nom ou IP), tel qu'écrit dans `PI_HOSTS`.
pub type Host = String;

/// Liste ordonnée et immuable des hôtes surveillés, partagée en lecture seule.
pub type HostRegistry = Arc<[Host]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Unknown,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    pub host: Host,
    pub status: Status,
}

/// Paires (hôte, statut) dans l'ordre du registre. Toujours recalculé, jamais stocké.
pub type Snapshot = Vec<HostStatus>;

/// Messages poussés spontanément vers les clients live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    Update(Snapshot),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_wire_format() {
        let msg = ServerMessage::Update(vec![
            HostStatus { host: "a".into(), status: Status::Up },
            HostStatus { host: "b".into(), status: Status::Down },
            HostStatus { host: "c".into(), status: Status::Unknown },
        ]);
        assert_eq!(
            serde_json::to_string(&msg).unwrap(),
            r#"{"type":"update","data":[{"host":"a","status":"UP"},{"host":"b","status":"DOWN"},{"host":"c","status":"UNKNOWN"}]}"#
        );
    }

    #[test]
    fn test_empty_update() {
        let msg = ServerMessage::Update(Vec::new());
        assert_eq!(serde_json::to_string(&msg).unwrap(), r#"{"type":"update","data":[]}"#);
    }
}
