//! End-to-end properties of the pipeline over files on disk

use ahash::AHashMap;
use lensprep_core::{Error, PipelineBuilder};
use lensprep_filters::{AsciiStrategy, TextSanitizer};
use lensprep_formats::{
    load_table, DatasetPaths, Link, Movie, OutputPaths, Rating, Table, Tag, DEFAULT_SUFFIX,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RATINGS: &str = "userId,movieId,rating,timestamp
1,10,4.0,100
1,20,3.5,101
1,30,2.0,102
1,40,1.5,103
2,10,5.0,104
2,30,0.5,105
3,20,3.0,106
3,50,4.5,107
4,10,2.5,108
4,99,3.0,109
";

const MOVIES: &str = "movieId,title,genres
10,Heat (1995),Action|Crime|Thriller
20,Léon: The Professional (1994),Action|Crime|Drama
30,\"City of Lost Children, The (Cité des enfants perdus, La) (1995)\",Adventure|Drama|Fantasy
40,Amélie (2001),Comedy|Romance
50,Unrated Film (2000),(no genres listed)
60,Never Rated (1990),Drama
";

const TAGS: &str = "userId,movieId,tag,timestamp
1,10,tense,200
2,10,long,201
3,10,classic,202
1,20,café ★,203
3,20,★★★,204
4,10,overrated,205
1,60,no ratings,206
";

const LINKS: &str = "movieId,imdbId,tmdbId
10,0113277,949
20,0110413,101
30,0112682,
40,0211915,194
50,0000001,
60,0000002,3
";

fn write_inputs(dir: &Path) -> DatasetPaths {
    fs::write(dir.join("ratings.csv"), RATINGS).unwrap();
    fs::write(dir.join("movies.csv"), MOVIES).unwrap();
    fs::write(dir.join("tags.csv"), TAGS).unwrap();
    fs::write(dir.join("links.csv"), LINKS).unwrap();
    DatasetPaths::in_dir(dir)
}

fn setup() -> (TempDir, DatasetPaths, OutputPaths) {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(dir.path());
    let outputs = OutputPaths::in_dir(dir.path().join("out"), DEFAULT_SUFFIX);
    (dir, inputs, outputs)
}

#[test]
fn test_caps_hold_on_written_output() {
    let (_dir, inputs, outputs) = setup();
    let pipeline = PipelineBuilder::new()
        .max_users(3)
        .max_ratings_per_user(2)
        .max_tags_per_movie(1)
        .build();

    let (output, written) = pipeline.execute(&inputs, Some(&outputs)).unwrap();
    assert_eq!(written.len(), 4);

    let ratings: Vec<Rating> = load_table(&outputs.ratings).unwrap();
    let tags: Vec<Tag> = load_table(&outputs.tags).unwrap();
    assert_eq!(ratings, output.dataset.ratings);

    assert!(ratings.iter().all(|r| r.user_id <= 3));
    assert!(tags.iter().all(|t| t.user_id <= 3));

    let mut per_user: AHashMap<u32, usize> = AHashMap::new();
    for r in &ratings {
        *per_user.entry(r.user_id).or_default() += 1;
    }
    assert!(per_user.values().all(|&n| n <= 2));

    let mut per_movie: AHashMap<u32, usize> = AHashMap::new();
    for t in &tags {
        *per_movie.entry(t.movie_id).or_default() += 1;
    }
    assert!(per_movie.values().all(|&n| n <= 1));

    // User 1 keeps their first two ratings in file order
    let user1: Vec<u32> = ratings
        .iter()
        .filter(|r| r.user_id == 1)
        .map(|r| r.movie_id)
        .collect();
    assert_eq!(user1, vec![10, 20]);
}

#[test]
fn test_referential_closure() {
    let (_dir, inputs, outputs) = setup();
    let pipeline = PipelineBuilder::new().max_movies(3).build();
    let (output, _) = pipeline.execute(&inputs, Some(&outputs)).unwrap();

    let movies: Vec<Movie> = load_table(&outputs.movies).unwrap();
    let links: Vec<Link> = load_table(&outputs.links).unwrap();
    let ratings: Vec<Rating> = load_table(&outputs.ratings).unwrap();
    let tags: Vec<Tag> = load_table(&outputs.tags).unwrap();

    let movie_ids: BTreeSet<u32> = movies.iter().map(|m| m.movie_id).collect();
    assert_eq!(movie_ids, BTreeSet::from([10, 20, 30]));

    assert!(ratings.iter().all(|r| movie_ids.contains(&r.movie_id)));
    assert!(tags.iter().all(|t| movie_ids.contains(&t.movie_id)));
    assert!(links.iter().all(|l| movie_ids.contains(&l.movie_id)));

    let users: BTreeSet<u32> = output.users.sorted_ids().into_iter().collect();
    assert!(ratings.iter().all(|r| users.contains(&r.user_id)));
    assert!(tags.iter().all(|t| users.contains(&t.user_id)));

    // Movie 99 is rated but absent from the movies table
    assert_eq!(output.stats.ratings_dropped_orphan, 1);
    assert_eq!(output.stats.movies_orphaned, 1);
}

#[test]
fn test_runs_are_byte_identical() {
    let (dir, inputs, _) = setup();
    let pipeline = PipelineBuilder::new()
        .max_users(3)
        .max_movies(4)
        .ascii_only(AsciiStrategy::Transliterate)
        .build();

    let first = OutputPaths::in_dir(dir.path().join("first"), DEFAULT_SUFFIX);
    let second = OutputPaths::in_dir(dir.path().join("second"), DEFAULT_SUFFIX);
    pipeline.execute(&inputs, Some(&first)).unwrap();
    pipeline.execute(&inputs, Some(&second)).unwrap();

    for table in Table::ALL {
        let a = fs::read(first.get(table)).unwrap();
        let b = fs::read(second.get(table)).unwrap();
        assert_eq!(a, b, "{} output differs between runs", table);
    }
}

#[test]
fn test_ascii_only_output_is_printable() {
    for strategy in [AsciiStrategy::Transliterate, AsciiStrategy::Strip] {
        let (_dir, inputs, outputs) = setup();
        let pipeline = PipelineBuilder::new().ascii_only(strategy).build();
        pipeline.execute(&inputs, Some(&outputs)).unwrap();

        let movies: Vec<Movie> = load_table(&outputs.movies).unwrap();
        let tags: Vec<Tag> = load_table(&outputs.tags).unwrap();

        for movie in &movies {
            assert!(TextSanitizer::is_printable_ascii(&movie.title), "{:?}", movie.title);
            assert!(TextSanitizer::is_printable_ascii(&movie.genres));
        }
        for tag in &tags {
            assert!(TextSanitizer::is_printable_ascii(&tag.tag), "{:?}", tag.tag);
        }

        let cafe = tags
            .iter()
            .find(|t| t.user_id == 1 && t.movie_id == 20)
            .unwrap();
        match strategy {
            AsciiStrategy::Transliterate => assert_eq!(cafe.tag, "cafe "),
            AsciiStrategy::Strip => assert_eq!(cafe.tag, "caf "),
        }

        // A tag made only of symbols is kept with empty text
        assert!(tags.iter().any(|t| t.user_id == 3 && t.movie_id == 20 && t.tag.is_empty()));
    }
}

#[test]
fn test_unicode_preserved_without_ascii_only() {
    let (_dir, inputs, outputs) = setup();
    PipelineBuilder::new()
        .build()
        .execute(&inputs, Some(&outputs))
        .unwrap();

    let movies: Vec<Movie> = load_table(&outputs.movies).unwrap();
    assert!(movies.iter().any(|m| m.title == "Amélie (2001)"));
    assert!(movies.iter().all(|m| m.movie_id != 60));
}

#[test]
fn test_dry_run_writes_nothing() {
    let (_dir, inputs, outputs) = setup();
    let (output, written) = PipelineBuilder::new()
        .build()
        .execute(&inputs, None)
        .unwrap();

    assert!(written.is_empty());
    assert!(output.stats.ratings > 0);
    assert!(!outputs.ratings.exists());
}

#[test]
fn test_malformed_row_reports_line() {
    let (dir, inputs, outputs) = setup();
    fs::write(
        dir.path().join("ratings.csv"),
        "userId,movieId,rating,timestamp\n1,10,4.0,100\n1,abc,3.5,101\n",
    )
    .unwrap();

    let err = PipelineBuilder::new()
        .build()
        .execute(&inputs, Some(&outputs))
        .unwrap_err();

    match err {
        Error::Format(lensprep_formats::Error::MalformedRow { table, line, .. }) => {
            assert_eq!(table, Table::Ratings);
            assert_eq!(line, 3);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!outputs.ratings.exists());
}

#[test]
fn test_missing_input_fails_before_writing() {
    let (dir, inputs, outputs) = setup();
    fs::remove_file(dir.path().join("tags.csv")).unwrap();

    let err = PipelineBuilder::new()
        .build()
        .execute(&inputs, Some(&outputs))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Format(lensprep_formats::Error::MissingFile {
            table: Table::Tags,
            ..
        })
    ));
    assert!(!outputs.movies.exists());
}
