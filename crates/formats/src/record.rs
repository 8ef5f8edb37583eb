//! Typed rows for the four MovieLens tables

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub type UserId = u32;
pub type MovieId = u32;

/// The four tables of a MovieLens release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Ratings,
    Movies,
    Tags,
    Links,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Ratings, Table::Movies, Table::Tags, Table::Links];

    /// File stem used by MovieLens (`ratings` for `ratings.csv`)
    pub fn stem(self) -> &'static str {
        match self {
            Table::Ratings => "ratings",
            Table::Movies => "movies",
            Table::Tags => "tags",
            Table::Links => "links",
        }
    }

    /// Required header columns, in output order
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Ratings => &["userId", "movieId", "rating", "timestamp"],
            Table::Movies => &["movieId", "title", "genres"],
            Table::Tags => &["userId", "movieId", "tag", "timestamp"],
            Table::Links => &["movieId", "imdbId", "tmdbId"],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Table::ALL
            .into_iter()
            .find(|t| t.stem() == name)
            .ok_or_else(|| format!("unknown table '{}', expected ratings, movies, tags or links", s))
    }
}

/// A row type that can be read from and written to its table.
///
/// `from_fields` receives the required columns in [`Table::columns`] order,
/// whatever their position in the source header. The error string is the
/// human-readable reason; the reader attaches table and line context.
pub trait TableRow: Sized {
    const TABLE: Table;

    fn from_fields(fields: &[&str]) -> Result<Self, String>;

    fn to_fields(&self) -> Vec<String>;
}

/// Star rating stored as a count of half stars (1..=10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HalfStars(u8);

impl HalfStars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(half_stars: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&half_stars)
            .then_some(Self(half_stars))
    }

    /// Parse a decimal rating in [0.5, 5.0] with step 0.5
    pub fn parse(text: &str) -> Result<Self, String> {
        // Only MovieLens' own `d.d` form, so written ratings match the input text
        let &[whole, b'.', half] = text.as_bytes() else {
            return Err(format!("rating '{}' is not in d.d form", text));
        };
        let doubled = match (whole, half) {
            (b'0'..=b'9', b'0') => (whole - b'0') * 2,
            (b'0'..=b'9', b'5') => (whole - b'0') * 2 + 1,
            _ => return Err(format!("rating '{}' is not a multiple of 0.5", text)),
        };
        Self::new(doubled).ok_or_else(|| format!("rating '{}' is outside 0.5..=5.0", text))
    }

    pub fn half_stars(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl Serialize for HalfStars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl fmt::Display for HalfStars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = if self.0 % 2 == 1 { 5 } else { 0 };
        write!(f, "{}.{}", self.0 / 2, tenths)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: HalfStars,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    /// Pipe-delimited genre list, e.g. `Action|Comedy`
    pub genres: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub tag: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub movie_id: MovieId,
    /// IMDb id digits with leading zeros preserved, empty when unknown
    pub imdb_id: String,
    pub tmdb_id: Option<u64>,
}

fn parse_id(column: &str, text: &str) -> Result<u32, String> {
    text.parse()
        .map_err(|_| format!("{} '{}' is not a non-negative integer", column, text))
}

fn parse_timestamp(text: &str) -> Result<i64, String> {
    text.parse()
        .map_err(|_| format!("timestamp '{}' is not an integer", text))
}

impl TableRow for Rating {
    const TABLE: Table = Table::Ratings;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Self {
            user_id: parse_id("userId", fields[0])?,
            movie_id: parse_id("movieId", fields[1])?,
            rating: HalfStars::parse(fields[2])?,
            timestamp: parse_timestamp(fields[3])?,
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.movie_id.to_string(),
            self.rating.to_string(),
            self.timestamp.to_string(),
        ]
    }
}

impl TableRow for Movie {
    const TABLE: Table = Table::Movies;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Self {
            movie_id: parse_id("movieId", fields[0])?,
            title: fields[1].to_string(),
            genres: fields[2].to_string(),
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.movie_id.to_string(),
            self.title.clone(),
            self.genres.clone(),
        ]
    }
}

impl TableRow for Tag {
    const TABLE: Table = Table::Tags;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Self {
            user_id: parse_id("userId", fields[0])?,
            movie_id: parse_id("movieId", fields[1])?,
            tag: fields[2].to_string(),
            timestamp: parse_timestamp(fields[3])?,
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.movie_id.to_string(),
            self.tag.clone(),
            self.timestamp.to_string(),
        ]
    }
}

impl TableRow for Link {
    const TABLE: Table = Table::Links;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        let imdb_id = fields[1];
        if !imdb_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("imdbId '{}' is not numeric", imdb_id));
        }
        let tmdb_id = match fields[2] {
            "" => None,
            text => Some(
                text.parse()
                    .map_err(|_| format!("tmdbId '{}' is not numeric", text))?,
            ),
        };
        Ok(Self {
            movie_id: parse_id("movieId", fields[0])?,
            imdb_id: imdb_id.to_string(),
            tmdb_id,
        })
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.movie_id.to_string(),
            self.imdb_id.clone(),
            self.tmdb_id.map(|id| id.to_string()).unwrap_or_default(),
        ]
    }
}
