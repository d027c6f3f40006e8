//! États partagés mutables. Un verrou pris ici ne couvre que l'accès à la
//! map/au set, jamais un `.await`.

use parking_lot::Mutex;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}
