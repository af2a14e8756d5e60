/// What the local process is for a given entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Predicts locally; the authority is remote.
    ClientOnly,
    /// Simulates authoritatively for a remote owner.
    AuthorityOnly,
    /// Owner and authority in one process (a listen-server host).
    Both,
}

impl Role {
    pub fn predicts(self) -> bool {
        matches!(self, Role::ClientOnly | Role::Both)
    }
}
