//! Commands accepted by the simulation queue, with a line-oriented parser.

use sim_core::EntityId;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Player actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    WaterPlant(EntityId),
    HarvestPlant(EntityId),
    FeedAnimal(EntityId),
    PlayWithAnimal(EntityId),
    /// Catalog index of the plant offer.
    BuyPlant(usize),
    /// Catalog index of the animal offer.
    BuyAnimal(usize),
}

/// Anything that commits a new state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Tick,
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        Command::Action(action)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{verb}` expects {expected}")]
    MissingArgument {
        verb: &'static str,
        expected: &'static str,
    },
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unexpected trailing input `{0}`")]
    Trailing(String),
}

fn number<T: FromStr>(
    verb: &'static str,
    expected: &'static str,
    arg: Option<&str>,
) -> Result<T, ParseCommandError> {
    let arg = arg.ok_or(ParseCommandError::MissingArgument { verb, expected })?;
    arg.parse()
        .map_err(|_| ParseCommandError::InvalidNumber(arg.to_string()))
}

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parses `water 3`, `harvest 3`, `feed 4`, `play 4`, `buy-plant 0`,
    /// `buy-animal 2` and `tick`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ParseCommandError::Empty)?;
        let arg = words.next();
        let id = |verb: &'static str| number::<u64>(verb, "an entity id", arg).map(EntityId);
        let index = |verb: &'static str| number::<usize>(verb, "a catalog index", arg);
        let command = match verb {
            "water" => Action::WaterPlant(id("water")?).into(),
            "harvest" => Action::HarvestPlant(id("harvest")?).into(),
            "feed" => Action::FeedAnimal(id("feed")?).into(),
            "play" => Action::PlayWithAnimal(id("play")?).into(),
            "buy-plant" => Action::BuyPlant(index("buy-plant")?).into(),
            "buy-animal" => Action::BuyAnimal(index("buy-animal")?).into(),
            "tick" => match arg {
                None => Command::Tick,
                Some(extra) => return Err(ParseCommandError::Trailing(extra.to_string())),
            },
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };
        match words.next() {
            Some(extra) => Err(ParseCommandError::Trailing(extra.to_string())),
            None => Ok(command),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Tick => f.write_str("tick"),
            Command::Action(Action::WaterPlant(id)) => write!(f, "water {}", id.0),
            Command::Action(Action::HarvestPlant(id)) => write!(f, "harvest {}", id.0),
            Command::Action(Action::FeedAnimal(id)) => write!(f, "feed {}", id.0),
            Command::Action(Action::PlayWithAnimal(id)) => write!(f, "play {}", id.0),
            Command::Action(Action::BuyPlant(i)) => write!(f, "buy-plant {i}"),
            Command::Action(Action::BuyAnimal(i)) => write!(f, "buy-animal {i}"),
        }
    }
}
