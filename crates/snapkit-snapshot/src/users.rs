//! Resolution of numeric owner ids to account names.

/// Resolves a uid to an account name.
pub trait UserResolver: Send + Sync {
    /// Return the account name for `uid`, or `None` if there is no such account.
    fn user_name(&self, uid: u32) -> Option<String>;
}

/// Resolver backed by the system password database.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUsers;

impl UserResolver for SystemUsers {
    #[cfg(unix)]
    fn user_name(&self, uid: u32) -> Option<String> {
        use nix::unistd::{Uid, User};

        match User::from_uid(Uid::from_raw(uid)) {
            Ok(user) => user.map(|user| user.name),
            Err(e) => {
                tracing::debug!(uid, error = %e, "Password database lookup failed");
                None
            }
        }
    }

    #[cfg(not(unix))]
    fn user_name(&self, _uid: u32) -> Option<String> {
        None
    }
}
