//! Kernel HostPulse : sondes TCP de joignabilité + diffusion live WebSocket.
//!
//! `Prober` → `StatusStore` → `Broadcaster` → tous les abonnés enregistrés.
//! `ws::serve_subscriber` enregistre les connexions et publie immédiatement
//! pour chaque nouvel arrivant.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod models;
pub mod prober;
pub mod state;
pub mod status;
pub mod subscribers;
pub mod ws;
