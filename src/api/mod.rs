// HTTP request boundary. Handlers validate input, call into services, and
// wrap results in the {success, data} envelope.
pub mod challenges;
pub mod health;
pub mod leaderboard;
pub mod profile;
pub mod rewards;
pub mod score;
pub mod social;

use std::sync::Arc;

use crate::config::Config;
use crate::store::{KeyLocks, Storage};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub locks: KeyLocks,
    pub config: Config,
}
