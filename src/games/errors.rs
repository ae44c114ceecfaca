use thiserror::Error;

use crate::storage::StorageError;

/// Coarse classification of [`GameError`] used by hosts that want to react to
/// categories of failure rather than individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    RateLimited,
    InsufficientFunds,
    InvalidInput,
    UnknownEntity,
    PreconditionFailed,
    Internal,
}

/// Errors that can arise while running a minigame command.
///
/// Every variant except the infrastructure ones renders a message suitable for
/// sending straight back to the chat user.
#[derive(Debug, Error)]
pub enum GameError {
    /// The host could not tell us who sent the command.
    #[error("Could not identify the sender.")]
    MissingIdentity,

    #[error("Daily limit reached ({limit} commands). Come back tomorrow!")]
    DailyLimitExceeded { limit: u32 },

    #[error("Slow down! Try again in {seconds_remaining} s.")]
    Cooldown { seconds_remaining: u64 },

    #[error("Not enough points: {needed} needed, you have {available}.")]
    InsufficientPoints { needed: u64, available: u64 },

    #[error("You have no hint tokens left. Buy some in the shop!")]
    NoHintTokens,

    #[error("Please enter a valid number.")]
    InvalidNumber(String),

    #[error("Please pick a number between 1 and {max}.")]
    OutOfRange { value: i64, max: u32 },

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("Unknown action '{action}'. {usage}")]
    UnknownAction { action: String, usage: &'static str },

    #[error("No such item '{0}'. Check the id with 'shop list'.")]
    UnknownItem(String),

    #[error("You don't own '{0}'. Check 'inventory'.")]
    ItemNotOwned(String),

    #[error("You already signed in today. See you tomorrow!")]
    AlreadySignedToday,

    #[error("You haven't started a game. Type 'guess start' to play!")]
    NoActiveGame,

    #[error("Give your cow a name: 'cow adopt <name>'. How about '{suggestion}'?")]
    MissingNickname { suggestion: &'static str },

    #[error("You already adopted {0}.")]
    PetAlreadyAdopted(String),

    #[error("You don't have a cow yet. Try 'cow adopt <name>'.")]
    NoPet,

    #[error("{name} is already at full {stat}.")]
    StatAlreadyFull { name: String, stat: &'static str },

    #[error("You've used all {limit} paid spins for today.")]
    PaidSpinLimitReached { limit: u32 },

    /// Wrapper around failures reported by the key-value store.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Wrapper around record encode/decode errors.
    #[error("serialization error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Static configuration that cannot be used (e.g. wheel odds not summing to 1).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        use GameError::*;
        match self {
            MissingIdentity => ErrorKind::NotFound,
            DailyLimitExceeded { .. } | Cooldown { .. } => ErrorKind::RateLimited,
            InsufficientPoints { .. } | NoHintTokens => ErrorKind::InsufficientFunds,
            InvalidNumber(_)
            | OutOfRange { .. }
            | MissingArgument(_)
            | MissingNickname { .. }
            | UnknownAction { .. } => ErrorKind::InvalidInput,
            UnknownItem(_) | ItemNotOwned(_) => ErrorKind::UnknownEntity,
            AlreadySignedToday
            | NoActiveGame
            | PetAlreadyAdopted(_)
            | NoPet
            | StatAlreadyFull { .. }
            | PaidSpinLimitReached { .. } => ErrorKind::PreconditionFailed,
            Storage(_) | Codec(_) | InvalidConfig(_) => ErrorKind::Internal,
        }
    }

    /// True when the error text is meant for the chat user rather than the operator log.
    pub fn is_user_facing(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
