use crate::domain::value_objects::{Role, ShopId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub shop_id: ShopId,
    pub role: Role,
}

/// Read-only view of the authenticated session. Sync components never mutate
/// auth state.
pub trait SessionProvider: Send + Sync {
    fn current_session(&self) -> Option<Session>;

    fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    fn current_shop_id(&self) -> Option<ShopId> {
        self.current_session().map(|s| s.shop_id)
    }
}

/// Fixed session, used by tests and by the desktop shell once sign-in
/// completes.
pub struct FixedSessionProvider {
    session: Session,
}

impl FixedSessionProvider {
    pub fn new(shop_id: ShopId, role: Role) -> Self {
        Self {
            session: Session { shop_id, role },
        }
    }
}

impl SessionProvider for FixedSessionProvider {
    fn current_session(&self) -> Option<Session> {
        Some(self.session)
    }
}
