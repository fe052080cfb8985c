use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::car::{Car, Direction, Floor};
use crate::dispatch::Dispatch;
use crate::queue::Request;
use crate::Error;

/// A text command received from a client, one per message:
/// `call <floor> <up|down>`, `select <floor>`, `status` or `requests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Call { floor: Floor, direction: Direction },
    Select(Floor),
    Status,
    Requests,
}

#[derive(Debug, Clone)]
pub enum Reply {
    Dispatched(Dispatch),
    Car(Car),
    Requests(Vec<Request>),
    Rejected(String),
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().map(str::to_ascii_lowercase);

        let cmd = match verb.as_deref() {
            Some("call") => Command::Call {
                floor: floor(words.next())?,
                direction: words
                    .next()
                    .ok_or_else(|| Error::InvalidCommand("call needs a direction".to_string()))?
                    .parse()?,
            },
            Some("select") => Command::Select(floor(words.next())?),
            Some("status") => Command::Status,
            Some("requests") => Command::Requests,
            Some(unsupported) => {
                return Err(Error::InvalidCommand(format!(
                    "{} is not a command",
                    unsupported
                )))
            }
            None => return Err(Error::InvalidCommand("empty command".to_string())),
        };

        match words.next() {
            Some(extra) => Err(Error::InvalidCommand(format!("unexpected {}", extra))),
            None => Ok(cmd),
        }
    }
}

fn floor(word: Option<&str>) -> Result<Floor, Error> {
    let word = word.ok_or_else(|| Error::InvalidCommand("missing floor".to_string()))?;
    word.parse()
        .map_err(|_| Error::InvalidCommand(format!("{} is not a floor", word)))
}

impl Display for Reply {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Dispatched(dispatch) => write!(f, "{}", dispatch),
            Reply::Car(car) => write!(f, "{}", car),
            Reply::Requests(requests) if requests.is_empty() => f.write_str("requests: none"),
            Reply::Requests(requests) => {
                let listed: Vec<String> = requests.iter().map(ToString::to_string).collect();
                write!(f, "requests: {}", listed.join(", "))
            }
            Reply::Rejected(reason) => write!(f, "error: {}", reason),
        }
    }
}
