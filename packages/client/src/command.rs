//! Parsing of interactive CLI input.

use groove_shared::protocol::TrackDto;
use thiserror::Error;

/// What the user asked for at the prompt
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Add(TrackDto),
    Remove(u64),
    Shuffle,
    Next,
    /// Resume, optionally from a position
    Play(Option<f64>),
    Pause,
    Seek(f64),
    Grant(String),
    Revoke(String),
    Request(TrackDto),
    Accept(u64),
    Decline(u64),
    React(String),
    Delete,
    Queue,
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("unknown command: {0} (try /help)")]
    UnknownCommand(String),

    #[error("{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: '{value}' is not a valid number")]
    InvalidNumber { command: &'static str, value: String },

    #[error("commands start with '/'")]
    NotACommand,
}

pub const HELP: &str = "\
/add <media_id> [title]    queue a track
/remove <entry_id>         remove a queue entry (DJ)
/shuffle                   shuffle the queue (DJ)
/next                      skip to the next track (DJ)
/play [seconds]            resume playback (DJ)
/pause                     pause playback (DJ)
/seek <seconds>            seek (DJ)
/grant <identity>          make someone a DJ (creator)
/revoke <identity>         take DJ rights away (creator)
/request <media_id> [title]  ask the DJs for a track
/accept <request_id>       accept a request (DJ)
/decline <request_id>      decline a request (DJ)
/react <emoji>             send a reaction
/delete                    delete the room (creator)
/queue                     show the queue
/status                    show what is playing
/quit                      leave the room";

/// Parse one line of input. `Ok(None)` for blank lines.
pub fn parse(line: &str) -> Result<Option<UserCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(body) = line.strip_prefix('/') else {
        return Err(ParseError::NotACommand);
    };
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    let command = match name {
        "add" => UserCommand::Add(track_arg("/add", rest)?),
        "remove" => UserCommand::Remove(number_arg("/remove", "an entry id", rest)?),
        "shuffle" => UserCommand::Shuffle,
        "next" | "skip" => UserCommand::Next,
        "play" => UserCommand::Play(if rest.is_empty() {
            None
        } else {
            Some(seconds_arg("/play", rest)?)
        }),
        "pause" => UserCommand::Pause,
        "seek" => UserCommand::Seek(seconds_arg("/seek", rest)?),
        "grant" => UserCommand::Grant(word_arg("/grant", "an identity", rest)?),
        "revoke" => UserCommand::Revoke(word_arg("/revoke", "an identity", rest)?),
        "request" => UserCommand::Request(track_arg("/request", rest)?),
        "accept" => UserCommand::Accept(number_arg("/accept", "a request id", rest)?),
        "decline" => UserCommand::Decline(number_arg("/decline", "a request id", rest)?),
        "react" => UserCommand::React(word_arg("/react", "an emoji", rest)?),
        "delete" => UserCommand::Delete,
        "queue" => UserCommand::Queue,
        "status" => UserCommand::Status,
        "quit" | "exit" => UserCommand::Quit,
        other => return Err(ParseError::UnknownCommand(format!("/{other}"))),
    };
    Ok(Some(command))
}

fn word_arg(
    command: &'static str,
    argument: &'static str,
    rest: &str,
) -> Result<String, ParseError> {
    rest.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument { command, argument })
}

fn number_arg(
    command: &'static str,
    argument: &'static str,
    rest: &str,
) -> Result<u64, ParseError> {
    let value = word_arg(command, argument, rest)?;
    value
        .parse()
        .map_err(|_| ParseError::InvalidNumber { command, value })
}

fn seconds_arg(command: &'static str, rest: &str) -> Result<f64, ParseError> {
    let value = word_arg(command, "a position in seconds", rest)?;
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(ParseError::InvalidNumber { command, value }),
    }
}

fn track_arg(command: &'static str, rest: &str) -> Result<TrackDto, ParseError> {
    let (media_id, title) = match rest.split_once(char::is_whitespace) {
        Some((media_id, title)) => (media_id, title.trim()),
        None => (rest, ""),
    };
    if media_id.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            argument: "a media id",
        });
    }
    Ok(TrackDto {
        media_id: media_id.to_string(),
        title: if title.is_empty() {
            media_id.to_string()
        } else {
            title.to_string()
        },
        channel: String::new(),
        thumbnail_url: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_title() {
        // テスト項目: /add は media id とタイトルを読み取る
        // given (前提条件):
        let line = "/add dQw4w9WgXcQ Never Gonna Give You Up";

        // when (操作):
        let command = parse(line).unwrap();

        // then (期待する結果):
        match command {
            Some(UserCommand::Add(track)) => {
                assert_eq!(track.media_id, "dQw4w9WgXcQ");
                assert_eq!(track.title, "Never Gonna Give You Up");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_without_title_uses_media_id() {
        // テスト項目: タイトル省略時は media id をタイトルにする
        // given (前提条件):
        let line = "/request abc";

        // when (操作):
        let command = parse(line).unwrap();

        // then (期待する結果):
        match command {
            Some(UserCommand::Request(track)) => assert_eq!(track.title, "abc"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_play_position_is_optional() {
        // テスト項目: /play は位置を省略できる
        // given (前提条件):
        // when (操作):
        let bare = parse("/play").unwrap();
        let at = parse("/play 42.5").unwrap();

        // then (期待する結果):
        assert_eq!(bare, Some(UserCommand::Play(None)));
        assert_eq!(at, Some(UserCommand::Play(Some(42.5))));
    }

    #[test]
    fn test_parse_rejects_bad_input_locally() {
        // テスト項目: 不正な入力は送信前にエラーになる
        // given (前提条件):
        // when (操作):
        // then (期待する結果):
        assert_eq!(
            parse("/seek -3"),
            Err(ParseError::InvalidNumber {
                command: "/seek",
                value: "-3".to_string()
            })
        );
        assert_eq!(
            parse("/remove"),
            Err(ParseError::MissingArgument {
                command: "/remove",
                argument: "an entry id"
            })
        );
        assert_eq!(parse("hello"), Err(ParseError::NotACommand));
        assert!(matches!(parse("/dance"), Err(ParseError::UnknownCommand(_))));
    }

    #[test]
    fn test_parse_blank_line() {
        // テスト項目: 空行はコマンドにならない
        // given (前提条件):
        // when (操作):
        // then (期待する結果):
        assert_eq!(parse("   "), Ok(None));
    }
}
