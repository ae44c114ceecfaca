//! Text command routing.
//!
//! A command line is split on whitespace: the first token picks the command,
//! the rest are its arguments. Missing arguments are empty strings and the
//! handler decides whether that is an error. Command words are matched
//! case-insensitively; arguments are passed through as typed.

use log::{debug, error};

use crate::bot::MessageEvent;
use crate::games::{GameError, GameService};
use crate::logutil::escape_log;

/// Reply used when a command fails for reasons the user cannot fix.
pub const INTERNAL_ERROR_REPLY: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Guess { action: String },
    Sign,
    Lottery,
    Shop { action: String, item: String },
    Use { item: String },
    Inventory,
    Achievements,
    Profile,
    Cow { action: String, arg: String },
    Spin { action: String },
    Help,
}

impl Command {
    /// Parse a command line. Returns `None` for empty input or an unknown
    /// command word so hosts can leave unrelated chat alone.
    pub fn parse(text: &str) -> Option<Command> {
        let mut parts = text.split_whitespace();
        let word = parts.next()?.to_lowercase();
        let args: Vec<&str> = parts.collect();
        let arg = |i: usize| args.get(i).copied().unwrap_or("").to_string();
        // Names and item display names may contain spaces.
        let rest = |from: usize| args.get(from..).map(|a| a.join(" ")).unwrap_or_default();

        let cmd = match word.as_str() {
            "guess" => Command::Guess { action: arg(0) },
            "sign" | "signin" => Command::Sign,
            "lottery" => Command::Lottery,
            "shop" => Command::Shop {
                action: arg(0),
                item: rest(1),
            },
            "use" => Command::Use { item: rest(0) },
            "inventory" | "bag" => Command::Inventory,
            "achievements" => Command::Achievements,
            "profile" | "me" => Command::Profile,
            "cow" => Command::Cow {
                action: arg(0),
                arg: rest(1),
            },
            "spin" => Command::Spin { action: arg(0) },
            "help" => Command::Help,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Run one command for `(user_id, platform)` and return the reply text.
pub async fn execute(
    service: &GameService,
    user_id: &str,
    platform: &str,
    command: &Command,
) -> Result<String, GameError> {
    match command {
        Command::Guess { action } => service.guess(user_id, platform, action).await,
        Command::Sign => service.sign(user_id, platform).await,
        Command::Lottery => service.lottery(user_id, platform).await,
        Command::Shop { action, item } => service.shop(user_id, platform, action, item).await,
        Command::Use { item } => service.use_item(user_id, platform, item).await,
        Command::Inventory => service.inventory(user_id, platform).await,
        Command::Achievements => service.achievements(user_id, platform).await,
        Command::Profile => service.profile(user_id, platform).await,
        Command::Cow { action, arg } => service.cow(user_id, platform, action, arg).await,
        Command::Spin { action } => service.spin(user_id, platform, action).await,
        Command::Help => Ok(service.help()),
    }
}

/// Convert a handler failure into chat text. Infrastructure failures are
/// logged and replaced with a generic apology.
pub fn error_reply(err: &GameError) -> String {
    if err.is_user_facing() {
        err.to_string()
    } else {
        error!("Command failed: {}", err);
        INTERNAL_ERROR_REPLY.to_string()
    }
}

/// Parse `text`, run it, and attach the reply to `event`.
///
/// Returns `false` when `text` is not a minigame command; the event is left
/// untouched in that case.
pub async fn dispatch<E: MessageEvent + ?Sized>(
    service: &GameService,
    event: &mut E,
    text: &str,
) -> bool {
    let Some(command) = Command::parse(text) else {
        return false;
    };
    let (Some(user_id), Some(platform)) = (event.sender_id(), event.platform_id()) else {
        event.set_reply(GameError::MissingIdentity.to_string());
        return true;
    };

    let reply = match execute(service, &user_id, &platform, &command).await {
        Ok(reply) => reply,
        Err(err) => {
            debug!(
                "{} '{}' rejected: {}",
                escape_log(&user_id),
                escape_log(text),
                err
            );
            error_reply(&err)
        }
    };
    event.set_reply(reply);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn parse_splits_arguments() {
        assert_eq!(
            Command::parse("  SHOP  buy   coffee "),
            Some(Command::Shop {
                action: "buy".into(),
                item: "coffee".into()
            })
        );
        assert_eq!(
            Command::parse("guess"),
            Some(Command::Guess {
                action: String::new()
            })
        );
        assert_eq!(
            Command::parse("use Experience Card"),
            Some(Command::Use {
                item: "Experience Card".into()
            })
        );
        assert_eq!(
            Command::parse("cow rename Big Bertha"),
            Some(Command::Cow {
                action: "rename".into(),
                arg: "Big Bertha".into()
            })
        );
    }

    #[test]
    fn parse_ignores_chatter() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("hello there"), None);
    }

    #[test]
    fn internal_errors_are_masked() {
        let err = GameError::Storage(StorageError::Backend("disk on fire".into()));
        assert_eq!(error_reply(&err), INTERNAL_ERROR_REPLY);
        assert!(error_reply(&GameError::NoPet).contains("cow adopt"));
    }
}
