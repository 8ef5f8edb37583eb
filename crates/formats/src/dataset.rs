//! The four MovieLens tables loaded together

use crate::reader::load_table_with_progress;
use crate::record::{Link, Movie, Rating, Table, Tag};
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Location of each raw input table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetPaths {
    pub ratings: PathBuf,
    pub movies: PathBuf,
    pub tags: PathBuf,
    pub links: PathBuf,
}

impl DatasetPaths {
    /// Standard MovieLens file names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let path = |table: Table| dir.join(format!("{}.csv", table.stem()));
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

/// Rows of all four tables, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub ratings: Vec<Rating>,
    pub movies: Vec<Movie>,
    pub tags: Vec<Tag>,
    pub links: Vec<Link>,
}

impl Dataset {
    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::Ratings => self.ratings.len(),
            Table::Movies => self.movies.len(),
            Table::Tags => self.tags.len(),
            Table::Links => self.links.len(),
        }
    }
}

/// Load all four tables, failing on the first missing file or malformed row
pub fn load_dataset(paths: &DatasetPaths) -> Result<Dataset> {
    load_dataset_with_progress(paths, |_, _| {})
}

/// Load all four tables, reporting `(table, rows so far)` while reading
pub fn load_dataset_with_progress<F>(paths: &DatasetPaths, mut on_progress: F) -> Result<Dataset>
where
    F: FnMut(Table, usize),
{
    let ratings = load_table_with_progress(&paths.ratings, |n| on_progress(Table::Ratings, n))?;
    let movies = load_table_with_progress(&paths.movies, |n| on_progress(Table::Movies, n))?;
    let tags = load_table_with_progress(&paths.tags, |n| on_progress(Table::Tags, n))?;
    let links = load_table_with_progress(&paths.links, |n| on_progress(Table::Links, n))?;

    let dataset = Dataset {
        ratings,
        movies,
        tags,
        links,
    };

    info!(
        "Loaded {} ratings, {} movies, {} tags, {} links",
        dataset.ratings.len(),
        dataset.movies.len(),
        dataset.tags.len(),
        dataset.links.len()
    );

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;

    fn write_tables(dir: &Path) {
        fs::write(
            dir.join("ratings.csv"),
            "userId,movieId,rating,timestamp\n1,10,4.0,100\n2,20,2.5,101\n",
        )
        .unwrap();
        fs::write(
            dir.join("movies.csv"),
            "movieId,title,genres\n10,Heat (1995),Action\n20,Babe (1995),Children|Drama\n",
        )
        .unwrap();
        fs::write(dir.join("tags.csv"), "userId,movieId,tag,timestamp\n1,10,tense,102\n").unwrap();
        fs::write(dir.join("links.csv"), "movieId,imdbId,tmdbId\n10,0113277,949\n").unwrap();
    }

    #[test]
    fn test_load_dataset() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());

        let mut seen = Vec::new();
        let dataset =
            load_dataset_with_progress(&DatasetPaths::in_dir(dir.path()), |t, n| seen.push((t, n)))
                .unwrap();

        assert_eq!(dataset.row_count(Table::Ratings), 2);
        assert_eq!(dataset.row_count(Table::Movies), 2);
        assert_eq!(dataset.row_count(Table::Tags), 1);
        assert_eq!(dataset.links[0].tmdb_id, Some(949));
        assert_eq!(
            seen,
            vec![
                (Table::Ratings, 2),
                (Table::Movies, 2),
                (Table::Tags, 1),
                (Table::Links, 1)
            ]
        );
    }

    #[test]
    fn test_load_dataset_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        write_tables(dir.path());
        fs::remove_file(dir.path().join("links.csv")).unwrap();

        let result = load_dataset(&DatasetPaths::in_dir(dir.path()));
        match result {
            Err(Error::MissingFile { table, path }) => {
                assert_eq!(table, Table::Links);
                assert!(path.ends_with("links.csv"));
            }
            other => panic!("expected missing file, got {:?}", other),
        }
    }
}
