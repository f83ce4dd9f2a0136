/// An authenticated account as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// The slice of the identity service the guild core depends on. Sign-up and
/// sign-in flows live entirely on the other side of this trait.
pub trait IdentityProvider {
    fn current_principal(&self) -> Option<Principal>;
}

/// Fixed principal, for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<Principal>);

impl IdentityProvider for StaticIdentity {
    fn current_principal(&self) -> Option<Principal> {
        self.0.clone()
    }
}
