use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, marker::PhantomData, num::NonZeroU64, str::FromStr};
use thiserror::Error;

pub trait Marker {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommentMarker;

impl Marker for UserMarker {
    const NAME: &'static str = "user";
}

impl Marker for PostMarker {
    const NAME: &'static str = "post";
}

impl Marker for CommentMarker {
    const NAME: &'static str = "comment";
}

/// Server-assigned identifier, tagged with the entity it belongs to.
///
/// The API is not consistent about sending ids as numbers or as numeric
/// strings, so both are accepted when deserializing. Past this boundary an
/// id is always a number and ids of different entities cannot be compared.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id<T> {
    value: NonZeroU64,
    phantom: PhantomData<T>,
}

pub type UserId = Id<UserMarker>;
pub type PostId = Id<PostMarker>;
pub type CommentId = Id<CommentMarker>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("id must be a positive integer, got {0:?}")]
    Invalid(String),
}

impl<T> Id<T> {
    /// # Panics
    ///
    /// Panics if the value is 0.
    #[must_use]
    #[track_caller]
    pub const fn new(n: u64) -> Self {
        match Self::new_checked(n) {
            Some(id) => id,
            None => panic!("id value is zero"),
        }
    }

    #[must_use]
    pub const fn new_checked(n: u64) -> Option<Self> {
        match NonZeroU64::new(n) {
            Some(value) => Some(Self {
                value,
                phantom: PhantomData,
            }),
            None => None,
        }
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.value.get()
    }
}

impl<T: Marker> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id<{}>({})", T::NAME, self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::new_checked)
            .ok_or_else(|| IdParseError::Invalid(s.to_string()))
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value.get())
    }
}

struct IdVisitor<T>(PhantomData<T>);

impl<'de, T: Marker> Visitor<'de> for IdVisitor<T> {
    type Value = Id<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a positive {} id as a number or numeric string", T::NAME)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Id::new_checked(v).ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        u64::try_from(v)
            .ok()
            .and_then(Id::new_checked)
            .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse()
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

impl<'de, T: Marker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor(PhantomData))
    }
}
