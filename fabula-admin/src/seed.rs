//! Starter catalog
//!
//! Inserts a handful of well-known series and novels so a fresh install
//! has something to show. Entries are matched by slug, so running the
//! seeder again never duplicates anything.

use anyhow::Result;
use chrono::Utc;
use fabula_common::db::novels::{self, Novel};
use fabula_common::db::series::{self, Series};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

#[allow(clippy::too_many_arguments)]
fn series_entry(
    title: &str,
    slug: &str,
    short: &str,
    long: &str,
    rating: f64,
    review: &str,
    trailer: &str,
    seasons: i64,
) -> Series {
    Series {
        id: Uuid::new_v4(),
        title: title.to_string(),
        slug: slug.to_string(),
        short_description: Some(short.to_string()),
        long_description: Some(long.to_string()),
        cover_image: None,
        rating: Some(rating),
        personal_review: Some(review.to_string()),
        trailer_url: Some(trailer.to_string()),
        number_of_seasons: Some(seasons),
        tmdb_id: None,
        backdrop_url: None,
        theme_url: None,
        genre: None,
        release_year: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn novel_entry(
    title: &str,
    slug: &str,
    short: &str,
    long: &str,
    rating: f64,
    review: &str,
    link: &str,
    chapters: i64,
) -> Novel {
    Novel {
        id: Uuid::new_v4(),
        title: title.to_string(),
        slug: slug.to_string(),
        short_description: Some(short.to_string()),
        long_description: Some(long.to_string()),
        cover_image: None,
        rating: Some(rating),
        personal_review: Some(review.to_string()),
        external_link: Some(link.to_string()),
        number_of_chapters: Some(chapters),
        theme_url: None,
        genre: None,
        release_year: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn series_seeds() -> Vec<Series> {
    vec![
        series_entry(
            "Breaking Bad",
            "breaking-bad",
            "A high school chemistry teacher turned methamphetamine producer teams up with a former student.",
            "Breaking Bad follows Walter White, a struggling high school chemistry teacher diagnosed with cancer. To secure his family's financial future, he partners with former student Jesse Pinkman to produce and sell crystal meth. The series explores morality, transformation, and the consequences of choices.",
            9.5,
            "A masterclass in tension and character development. One of the best TV dramas ever made.",
            "https://www.youtube.com/watch?v=HhesaQXLuYw",
            5,
        ),
        series_entry(
            "Game of Thrones",
            "game-of-thrones",
            "Noble families fight for control of the Iron Throne in the Seven Kingdoms of Westeros.",
            "Game of Thrones is a fantasy drama set in the fictional continents of Westeros and Essos. Multiple plot lines follow a large ensemble cast as they navigate political intrigue, warfare, and supernatural threats. Based on George R. R. Martin's A Song of Ice and Fire.",
            9.2,
            "Epic scale and unforgettable characters. The earlier seasons are television at its finest.",
            "https://www.youtube.com/watch?v=KPLWWIOCOOQ",
            8,
        ),
        series_entry(
            "The Wire",
            "the-wire",
            "A realistic portrayal of the drug scene, law enforcement, and institutions in Baltimore.",
            "The Wire examines the city of Baltimore from multiple perspectives: police, drug dealers, politicians, and citizens. Each season focuses on a different institution while maintaining an overarching narrative. Praised for its depth and social commentary.",
            9.3,
            "Demanding but rewarding. The most nuanced and intelligent crime drama ever made.",
            "https://www.youtube.com/watch?v=9qK-VGjMr8g",
            5,
        ),
        series_entry(
            "Stranger Things",
            "stranger-things",
            "In 1980s Indiana, a group of kids encounter supernatural forces and a mysterious girl with powers.",
            "Stranger Things blends sci-fi, horror, and nostalgia as it follows the residents of Hawkins and their encounters with the Upside Down. The series pays homage to 80s pop culture while telling an original story of friendship and otherworldly danger.",
            8.7,
            "Nostalgic, fun, and full of heart. Perfect binge material.",
            "https://www.youtube.com/watch?v=b9EkMc79ZSU",
            4,
        ),
        series_entry(
            "The Crown",
            "the-crown",
            "A historical drama following the reign of Queen Elizabeth II and the British royal family.",
            "The Crown chronicles the life of Queen Elizabeth II from her wedding in 1947 through decades of political and personal challenges. The cast rotates every two seasons to reflect the aging of characters. Known for its production quality and nuanced portrayal of recent history.",
            8.6,
            "Lavish and compelling. A fascinating look at duty, power, and family.",
            "https://www.youtube.com/watch?v=JWtnJjn6ng0",
            6,
        ),
    ]
}

fn novel_seeds() -> Vec<Novel> {
    vec![
        novel_entry(
            "1984",
            "1984",
            "George Orwell's dystopian novel about totalitarianism, surveillance, and the manipulation of truth.",
            "1984 depicts a totalitarian society ruled by the Party and its leader Big Brother. Winston Smith works at the Ministry of Truth, altering historical records. His rebellion and doomed love affair with Julia explore themes of freedom, reality, and the power of language.",
            9.0,
            "As relevant today as when it was written. A must-read classic.",
            "https://www.goodreads.com/book/show/40961427-1984",
            23,
        ),
        novel_entry(
            "The Great Gatsby",
            "the-great-gatsby",
            "F. Scott Fitzgerald's tale of wealth, love, and the American Dream in the Jazz Age.",
            "Narrated by Nick Carraway, the novel centers on the mysterious millionaire Jay Gatsby and his obsession with the beautiful Daisy Buchanan. Set in the summer of 1922 on Long Island, it explores decadence, idealism, and the emptiness of the wealthy elite.",
            8.5,
            "Beautiful prose and a haunting portrait of the Roaring Twenties.",
            "https://www.goodreads.com/book/show/4671.The_Great_Gatsby",
            9,
        ),
        novel_entry(
            "Dune",
            "dune",
            "Frank Herbert's science fiction epic about desert planet Arrakis, spice, and political intrigue.",
            "Dune follows Paul Atreides as his family assumes control of the desert planet Arrakis, the only source of the valuable spice melange. Betrayal, ecology, religion, and destiny intertwine in a complex saga that has influenced generations of science fiction.",
            8.8,
            "Dense and immersive. The world-building is unmatched.",
            "https://www.goodreads.com/book/show/44767458-dune",
            46,
        ),
        novel_entry(
            "Harry Potter and the Philosopher's Stone",
            "harry-potter-and-the-philosophers-stone",
            "J.K. Rowling's first book in the series: a young wizard discovers his destiny at Hogwarts.",
            "Harry Potter learns on his eleventh birthday that he is a wizard. He leaves his miserable life with the Dursleys to attend Hogwarts School of Witchcraft and Wizardry, where he makes friends, learns magic, and uncovers the truth about his parents' death.",
            9.2,
            "A magical start to an unforgettable series. Perfect for all ages.",
            "https://www.goodreads.com/book/show/3.Harry_Potter_and_the_Sorcerer_s_Stone",
            17,
        ),
        novel_entry(
            "Pride and Prejudice",
            "pride-and-prejudice",
            "Jane Austen's beloved romance about Elizabeth Bennet and the proud Mr. Darcy.",
            "Pride and Prejudice follows the Bennet family and the complicated relationship between the quick-witted Elizabeth and the wealthy, aloof Fitzwilliam Darcy. Through misunderstandings and social expectations, Austen crafts a sharp and enduring comedy of manners.",
            8.8,
            "Witty, romantic, and endlessly re-readable.",
            "https://www.goodreads.com/book/show/1885.Pride_and_Prejudice",
            61,
        ),
    ]
}

/// Insert any starter entries whose slug is not yet in the catalog.
///
/// Returns `(inserted, skipped)` counts.
pub async fn run(pool: &SqlitePool) -> Result<(usize, usize)> {
    let mut inserted = 0;
    let mut skipped = 0;

    for entry in series_seeds() {
        if series::find_by_slug(pool, &entry.slug).await?.is_some() {
            skipped += 1;
            continue;
        }
        series::insert(pool, &entry).await?;
        inserted += 1;
    }

    for entry in novel_seeds() {
        if novels::find_by_slug(pool, &entry.slug).await?.is_some() {
            skipped += 1;
            continue;
        }
        novels::insert(pool, &entry).await?;
        inserted += 1;
    }

    info!("Seed complete: {} inserted, {} skipped", inserted, skipped);
    Ok((inserted, skipped))
}
