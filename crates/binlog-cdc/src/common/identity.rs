//! Session identity
//!
//! Each reader task is known to the engine by a stable, randomly minted name.
//! The name is minted once and then recovered from state on every later run,
//! together with a flag telling whether this is the task's first run.

use crate::common::{Result, StateStore};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

/// State key holding the session name.
pub const SERVER_NAME_KEY: &str = "SERVER_NAME";
/// State key holding the first-run flag.
pub const FIRST_TIME_KEY: &str = "FIRST_TIME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub name: String,
    pub first_time: bool,
}

impl SessionIdentity {
    /// Recover the identity from `store`, or mint and persist a new one.
    ///
    /// Recovery marks the run as not-first in the store; minting persists
    /// both the new name and `FIRST_TIME = true`.
    pub async fn mint_or_recover(store: &dyn StateStore) -> Result<Self> {
        if let Some(name) = store.get_string(SERVER_NAME_KEY).await? {
            store.put(FIRST_TIME_KEY, Value::Bool(false)).await?;
            info!("Recovered session identity {}", name);
            return Ok(Self {
                name,
                first_time: false,
            });
        }

        let name = Uuid::new_v4().to_string().to_lowercase();
        store.put(SERVER_NAME_KEY, Value::String(name.clone())).await?;
        store.put(FIRST_TIME_KEY, Value::Bool(true)).await?;
        info!("Minted session identity {}", name);

        Ok(Self {
            name,
            first_time: true,
        })
    }
}
