use crate::driver::StoreSession;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// One live driver session together with its identity.
///
/// `generation` increases by one with every successful (re)initialization of
/// the owning manager, starting at 1.
pub struct SessionHandle {
    generation: u64,
    session_id: Uuid,
    session: Arc<dyn StoreSession>,
}

impl SessionHandle {
    pub(crate) fn new(generation: u64, session: Arc<dyn StoreSession>) -> Self {
        Self {
            generation,
            session_id: Uuid::new_v4(),
            session,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub(crate) fn session(&self) -> &Arc<dyn StoreSession> {
        &self.session
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("generation", &self.generation)
            .field("session_id", &self.session_id)
            .finish()
    }
}
