use lensprep_formats::{write_dataset, Dataset, HalfStars, Link, Movie, OutputPaths, Rating, Tag};
use std::path::PathBuf;

const TITLES: &[(&str, &str)] = &[
    ("Toy Story (1995)", "Adventure|Animation|Children|Comedy|Fantasy"),
    ("Heat (1995)", "Action|Crime|Thriller"),
    ("Léon: The Professional (1994)", "Action|Crime|Drama|Thriller"),
    ("Amélie (Fabuleux destin d'Amélie Poulain, Le) (2001)", "Comedy|Romance"),
    ("City of Lost Children, The (Cité des enfants perdus, La) (1995)", "Adventure|Drama|Fantasy|Mystery|Sci-Fi"),
    ("Crouching Tiger, Hidden Dragon (Wo hu cang long) (2000)", "Action|Drama|Romance"),
    ("\"Great Performances\" Cats (1998)", "Musical"),
    ("Spirited Away (Sen to Chihiro no kamikakushi) (2001)", "Adventure|Animation|Fantasy"),
];

const TAGS: &[&str] = &[
    "pixar",
    "slow burn",
    "café ★",
    "Jean Reno",
    "quirky, whimsical",
    "★★★",
    "\"must see\"",
    "naïve",
];

/// Small deterministic generator so repeated runs produce the same files
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: u32) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % u64::from(bound)) as u32
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp/lensprep-demo"));

    println!("Generating MovieLens-shaped tables in {}\n", output_dir.display());

    let mut rng = Lcg(42);
    let mut dataset = Dataset::default();
    let num_users = 120;
    let num_movies = 600;

    println!("Adding {} movies with links...", num_movies);
    for movie_id in 1..=num_movies {
        let (title, genres) = TITLES[(movie_id as usize - 1) % TITLES.len()];
        dataset.movies.push(Movie {
            movie_id,
            title: title.to_string(),
            genres: genres.to_string(),
        });
        dataset.links.push(Link {
            movie_id,
            imdb_id: format!("{:07}", 110_000 + movie_id),
            tmdb_id: (movie_id % 7 != 0).then_some(u64::from(movie_id) + 800),
        });
    }

    println!("Adding ratings and tags for {} users...", num_users);
    let mut timestamp = 964_982_703;
    for user_id in 1..=num_users {
        let count = 20 + rng.next(280);
        for _ in 0..count {
            timestamp += i64::from(rng.next(5_000));
            // A few ids past the catalog exercise orphan handling
            let movie_id = 1 + rng.next(num_movies + 5);
            let rating = HalfStars::new(1 + rng.next(10) as u8).ok_or("rating out of range")?;
            dataset.ratings.push(Rating {
                user_id,
                movie_id,
                rating,
                timestamp,
            });

            if rng.next(8) == 0 {
                dataset.tags.push(Tag {
                    user_id,
                    movie_id: 1 + rng.next(40),
                    tag: TAGS[rng.next(TAGS.len() as u32) as usize].to_string(),
                    timestamp,
                });
            }
        }
    }

    let written = write_dataset(&dataset, &OutputPaths::in_dir(&output_dir, ""))?;
    for table in &written {
        println!("  {:<8} {:>6} rows  {}", table.table, table.rows, table.path.display());
    }

    println!("\nFilter them with:");
    println!(
        "  cargo run -p lensprep -- run --data-dir {} --max-users 50 --max-movies 400 \\",
        output_dir.display()
    );
    println!("      --max-ratings-per-user 200 --max-tags-per-movie 30 --ascii-only");

    Ok(())
}
