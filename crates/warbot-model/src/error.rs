//! Error types for the model layer.

/// Errors raised while constructing model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Both sides of a war name the same entity.
    #[error("{0} cannot declare war on itself")]
    SelfWar(String),

    /// A guild and a team with the same name. Sides are told apart by
    /// name in round reports, so the pair would be ambiguous.
    #[error("both sides are named {0:?}; one of them must be renamed before they can war")]
    NameClash(String),
}
