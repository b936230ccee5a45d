//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

const ROOM_ID_MAX_LEN: usize = 64;
const IDENTITY_MAX_LEN: usize = 128;
const TRACK_FIELD_MAX_LEN: usize = 512;
const DISPLAY_NAME_MAX_LEN: usize = 32;
const COLOR_MAX_LEN: usize = 32;
const EMOJI_MAX_LEN: usize = 16;

fn ensure_max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValueObjectError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValueObjectError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Room identifier value object.
///
/// A human-chosen slug. Input is trimmed, lowercased, and inner whitespace
/// runs become a single `-`, so `"  Chill Beats "` and `"chill-beats"` name
/// the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// Create a new RoomId from raw user input.
    ///
    /// # Errors
    ///
    /// Fails when the normalized slug is empty, longer than 64 characters,
    /// or contains anything other than ASCII alphanumerics, `-`, and `_`.
    pub fn new(raw: &str) -> Result<Self, ValueObjectError> {
        let slug = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        if slug.is_empty() {
            return Err(ValueObjectError::RoomIdEmpty);
        }
        ensure_max_len("room_id", &slug, ROOM_ID_MAX_LEN)?;
        if let Some(c) = slug
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ValueObjectError::RoomIdInvalidCharacter(c));
        }
        Ok(Self(slug))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Participant identity: an account id or a persisted guest id.
///
/// Authority and attribution compare identities by string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: &str) -> Result<Self, ValueObjectError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValueObjectError::IdentityEmpty);
        }
        ensure_max_len("identity", id, IDENTITY_MAX_LEN)?;
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection-scoped participant id. A reconnect gets a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Queue entry id, assigned monotonically per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(u64);

impl EntryId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Song request id, assigned monotonically per room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media item. Two tracks are equal when their `media_id` matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    media_id: String,
    title: String,
    channel: String,
    thumbnail_url: String,
}

impl Track {
    pub fn new(
        media_id: &str,
        title: &str,
        channel: &str,
        thumbnail_url: &str,
    ) -> Result<Self, ValueObjectError> {
        let media_id = media_id.trim();
        if media_id.is_empty() {
            return Err(ValueObjectError::MediaIdEmpty);
        }
        ensure_max_len("media_id", media_id, TRACK_FIELD_MAX_LEN)?;
        ensure_max_len("title", title, TRACK_FIELD_MAX_LEN)?;
        ensure_max_len("channel", channel, TRACK_FIELD_MAX_LEN)?;
        ensure_max_len("thumbnail_url", thumbnail_url, TRACK_FIELD_MAX_LEN)?;
        Ok(Self {
            media_id: media_id.to_string(),
            title: title.to_string(),
            channel: channel.to_string(),
            thumbnail_url: thumbnail_url.to_string(),
        })
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.media_id == other.media_id
    }
}

impl Eq for Track {}

/// Display name and color shown next to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    display_name: String,
    color: String,
}

impl Profile {
    pub fn new(display_name: &str, color: &str) -> Result<Self, ValueObjectError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        ensure_max_len("display_name", display_name, DISPLAY_NAME_MAX_LEN)?;
        ensure_max_len("color", color, COLOR_MAX_LEN)?;
        Ok(Self {
            display_name: display_name.to_string(),
            color: color.trim().to_string(),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn color(&self) -> &str {
        &self.color
    }
}

/// Playback position in seconds: finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Position(f64);

impl Position {
    pub const ZERO: Position = Position(0.0);

    pub fn new(seconds: f64) -> Result<Self, ValueObjectError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ValueObjectError::PositionOutOfRange);
        }
        Ok(Self(seconds))
    }

    pub fn seconds(&self) -> f64 {
        self.0
    }
}

/// Reaction emoji. Ephemeral, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoji(String);

impl Emoji {
    pub fn new(value: &str) -> Result<Self, ValueObjectError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValueObjectError::EmojiEmpty);
        }
        ensure_max_len("emoji", value, EMOJI_MAX_LEN)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(groove_shared::time::now_millis())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_normalizes_case_and_whitespace() {
        // テスト項目: ルーム ID は小文字化され、空白はハイフンになる
        // given (前提条件):
        let raw = "  Chill   Beats ";

        // when (操作):
        let result = RoomId::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "chill-beats");
    }

    #[test]
    fn test_room_id_empty_fails() {
        // テスト項目: 空白だけのルーム ID は作成できない
        // when (操作):
        let result = RoomId::new("   ");

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ValueObjectError::RoomIdEmpty);
    }

    #[test]
    fn test_room_id_rejects_invalid_character() {
        // テスト項目: スラッグに使えない文字を含むルーム ID は作成できない
        // when (操作):
        let result = RoomId::new("lofi/beats");

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::RoomIdInvalidCharacter('/')
        );
    }

    #[test]
    fn test_room_id_too_long_fails() {
        // テスト項目: 65 文字以上のルーム ID は作成できない
        // when (操作):
        let result = RoomId::new(&"a".repeat(65));

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ValueObjectError::TooLong {
                field: "room_id",
                max: 64,
                actual: 65
            }
        );
    }

    #[test]
    fn test_identity_equality_is_string_equality() {
        // テスト項目: 同じ文字列の Identity は等価
        // given (前提条件):
        let a = Identity::new("guest_abc_1").unwrap();
        let b = Identity::new("guest_abc_1").unwrap();
        let c = Identity::new("acct-42").unwrap();

        // then (期待する結果):
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_identity_empty_fails() {
        assert_eq!(Identity::new("").unwrap_err(), ValueObjectError::IdentityEmpty);
    }

    #[test]
    fn test_track_equality_by_media_id() {
        // テスト項目: Track は media_id だけで比較される
        // given (前提条件):
        let a = Track::new("yt:abc", "Song", "Artist", "").unwrap();
        let b = Track::new("yt:abc", "Song (Live)", "Other", "thumb.jpg").unwrap();

        // then (期待する結果):
        assert_eq!(a, b);
    }

    #[test]
    fn test_track_requires_media_id() {
        assert_eq!(
            Track::new(" ", "Song", "", "").unwrap_err(),
            ValueObjectError::MediaIdEmpty
        );
    }

    #[test]
    fn test_position_rejects_negative_and_nan() {
        // テスト項目: 負の値や NaN は再生位置として扱えない
        // then (期待する結果):
        assert_eq!(
            Position::new(-1.0).unwrap_err(),
            ValueObjectError::PositionOutOfRange
        );
        assert_eq!(
            Position::new(f64::NAN).unwrap_err(),
            ValueObjectError::PositionOutOfRange
        );
        assert_eq!(Position::new(12.5).unwrap().seconds(), 12.5);
    }

    #[test]
    fn test_profile_trims_display_name() {
        let profile = Profile::new("  dj kyo ", "#3b82f6").unwrap();
        assert_eq!(profile.display_name(), "dj kyo");
        assert_eq!(profile.color(), "#3b82f6");
    }

    #[test]
    fn test_timestamp_ordering() {
        // テスト項目: タイムスタンプは順序付けできる
        // given (前提条件):
        let ts1 = Timestamp::new(1000);
        let ts2 = Timestamp::new(2000);

        // then (期待する結果):
        assert!(ts1 < ts2);
    }
}
