use thiserror::Error;

/// Erreurs de lecture de la configuration d'environnement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Échec de dépôt d'un message dans la file d'envoi d'un abonné.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("subscriber queue is full")]
    Full,
    #[error("subscriber connection is closed")]
    Closed,
}
