//! Atomic CSV table writer
//!
//! Every table is first written in full to a temporary file next to its
//! destination. Only after all tables of a dataset are staged and synced
//! are they renamed into place, so an existing output is never left
//! half-written. Staged files that are never committed are removed when
//! dropped.
//!
//! The renames themselves are sequential. Destinations are checked before
//! the first rename, but a rename that still fails part way leaves the
//! earlier tables already replaced; rerunning rewrites all four.

use crate::dataset::Dataset;
use crate::record::{Table, TableRow};
use crate::{Error, Result};
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default suffix appended to each table stem
pub const DEFAULT_SUFFIX: &str = "_filtered";

/// Destination of each output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub ratings: PathBuf,
    pub movies: PathBuf,
    pub tags: PathBuf,
    pub links: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<stem><suffix>.csv` for every table
    pub fn in_dir<P: AsRef<Path>>(dir: P, suffix: &str) -> Self {
        let dir = dir.as_ref();
        let path = |table: Table| dir.join(format!("{}{}.csv", table.stem(), suffix));
        Self {
            ratings: path(Table::Ratings),
            movies: path(Table::Movies),
            tags: path(Table::Tags),
            links: path(Table::Links),
        }
    }

    pub fn get(&self, table: Table) -> &Path {
        match table {
            Table::Ratings => &self.ratings,
            Table::Movies => &self.movies,
            Table::Tags => &self.tags,
            Table::Links => &self.links,
        }
    }
}

/// One table written to its destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenTable {
    pub table: Table,
    pub path: PathBuf,
    pub rows: usize,
}

/// A fully written table waiting to be renamed into place
pub struct StagedTable {
    table: Table,
    temp: NamedTempFile,
    destination: PathBuf,
    rows: usize,
}

impl StagedTable {
    /// Write `rows` with a header to a temporary file beside `destination`
    pub fn write<T: TableRow>(rows: &[T], destination: &Path) -> Result<Self> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| Error::write(dir, e))?;

        let temp = NamedTempFile::new_in(dir).map_err(|e| Error::write(destination, e))?;
        debug!("Staging {} rows of {} in {:?}", rows.len(), T::TABLE, temp.path());

        {
            let mut writer = WriterBuilder::new()
                .quote_style(QuoteStyle::Necessary)
                .from_writer(BufWriter::new(temp.as_file()));

            writer
                .write_record(T::TABLE.columns())
                .map_err(|e| Error::write(destination, e.into()))?;
            for row in rows {
                writer
                    .write_record(row.to_fields())
                    .map_err(|e| Error::write(destination, e.into()))?;
            }

            let mut inner = writer
                .into_inner()
                .map_err(|e| Error::write(destination, e.into_error()))?;
            inner.flush().map_err(|e| Error::write(destination, e))?;
        }

        temp.as_file()
            .sync_all()
            .map_err(|e| Error::write(destination, e))?;

        Ok(Self {
            table: T::TABLE,
            temp,
            destination: destination.to_path_buf(),
            rows: rows.len(),
        })
    }

    /// Fail early if the destination cannot be replaced by a rename
    fn check_destination(&self) -> Result<()> {
        match fs::symlink_metadata(&self.destination) {
            Ok(meta) if meta.is_dir() => Err(Error::write(
                &self.destination,
                io::Error::other("destination is a directory"),
            )),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::write(&self.destination, e)),
        }
    }

    /// Atomically rename the staged file onto its destination
    pub fn commit(self) -> Result<WrittenTable> {
        let Self {
            table,
            temp,
            destination,
            rows,
        } = self;

        temp.persist(&destination)
            .map_err(|e| Error::write(&destination, e.error))?;

        info!("Wrote {} rows to {:?}", rows, destination);
        Ok(WrittenTable {
            table,
            path: destination,
            rows,
        })
    }
}

/// Write all four tables, committing none unless all were staged
pub fn write_dataset(dataset: &Dataset, paths: &OutputPaths) -> Result<Vec<WrittenTable>> {
    let staged = vec![
        StagedTable::write(&dataset.ratings, &paths.ratings)?,
        StagedTable::write(&dataset.movies, &paths.movies)?,
        StagedTable::write(&dataset.tags, &paths.tags)?,
        StagedTable::write(&dataset.links, &paths.links)?,
    ];

    for table in &staged {
        table.check_destination()?;
    }

    staged.into_iter().map(StagedTable::commit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{HalfStars, Link, Movie, Rating, Tag};

    fn sample_dataset() -> Dataset {
        Dataset {
            ratings: vec![Rating {
                user_id: 1,
                movie_id: 10,
                rating: HalfStars::parse("4.0").unwrap(),
                timestamp: 100,
            }],
            movies: vec![Movie {
                movie_id: 10,
                title: "Heat, The \"Director's Cut\" (1995)".to_string(),
                genres: "Action|Crime".to_string(),
            }],
            tags: vec![Tag {
                user_id: 1,
                movie_id: 10,
                tag: "slow burn".to_string(),
                timestamp: 105,
            }],
            links: vec![Link {
                movie_id: 10,
                imdb_id: "0113277".to_string(),
                tmdb_id: None,
            }],
        }
    }

    #[test]
    fn test_output_paths_suffix() {
        let paths = OutputPaths::in_dir("/data", DEFAULT_SUFFIX);
        assert_eq!(paths.ratings, PathBuf::from("/data/ratings_filtered.csv"));
        assert_eq!(paths.get(Table::Links), Path::new("/data/links_filtered.csv"));
    }

    #[test]
    fn test_write_dataset_quotes_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path(), DEFAULT_SUFFIX);

        let written = write_dataset(&sample_dataset(), &paths).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|w| w.rows == 1));

        let movies = fs::read_to_string(&paths.movies).unwrap();
        assert_eq!(
            movies,
            "movieId,title,genres\n10,\"Heat, The \"\"Director's Cut\"\" (1995)\",Action|Crime\n"
        );

        let ratings = fs::read_to_string(&paths.ratings).unwrap();
        assert_eq!(ratings, "userId,movieId,rating,timestamp\n1,10,4.0,100\n");

        let links = fs::read_to_string(&paths.links).unwrap();
        assert_eq!(links, "movieId,imdbId,tmdbId\n10,0113277,\n");
    }

    #[test]
    fn test_write_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path(), DEFAULT_SUFFIX);
        fs::write(&paths.tags, "stale").unwrap();

        write_dataset(&sample_dataset(), &paths).unwrap();

        let tags = fs::read_to_string(&paths.tags).unwrap();
        assert!(tags.starts_with("userId,movieId,tag,timestamp\n"));

        // Only the four outputs remain, no leftover temporaries
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 4);
    }

    #[test]
    fn test_uncommitted_stage_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("ratings_filtered.csv");
        fs::write(&destination, "original").unwrap();

        let staged = StagedTable::write(&sample_dataset().ratings, &destination).unwrap();
        drop(staged);

        assert_eq!(fs::read_to_string(&destination).unwrap(), "original");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();

        let paths = OutputPaths::in_dir(blocker.join("out"), DEFAULT_SUFFIX);
        let result = write_dataset(&sample_dataset(), &paths);
        assert!(matches!(result, Err(Error::Write { .. })));
    }

    #[test]
    fn test_blocked_destination_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::in_dir(dir.path(), DEFAULT_SUFFIX);
        fs::write(&paths.ratings, "old ratings").unwrap();
        fs::create_dir(&paths.links).unwrap();

        let result = write_dataset(&sample_dataset(), &paths);
        assert!(matches!(result, Err(Error::Write { .. })));

        // The ratings table precedes links but must not be replaced
        assert_eq!(fs::read_to_string(&paths.ratings).unwrap(), "old ratings");
        assert!(!paths.movies.exists());
        assert!(!paths.tags.exists());
    }
}
