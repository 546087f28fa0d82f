use crate::ans::AnsRegister;
use crate::store::SessionStore;

/// Process-wide calculator state shared by every event handler.
///
/// Lives for the whole process, so it outlives gateway reconnects.
pub struct SessionContext {
    pub ans: AnsRegister,
    pub store: SessionStore,
}

impl SessionContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            ans: AnsRegister::new(),
            store: SessionStore::new(capacity),
        }
    }
}
