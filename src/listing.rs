//! Derives what the browse pages show from an in-memory template list.
//!
//! Engagement numbers are random and regenerated on each call to [`decorate`],
//! so category membership and ordering change between requests.

use crate::models::{Category, DisplayMeme, MemeTemplate, SortKey};
use chrono::{DateTime, Duration, Months, Utc};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

pub const PAGE_SIZE: usize = 12;
pub const HOME_FEED_SIZE: usize = 6;
pub const LEADERBOARD_SIZE: usize = 10;

const TRENDING_MIN_LIKES: u32 = 500;
const NEW_WITHIN_DAYS: i64 = 30;
const MAX_RANDOM_LIKES: u32 = 1000;
const MAX_RANDOM_COMMENTS: u32 = 100;
const MAX_LEADERBOARD_LIKES: u32 = 5000;
const MAX_BACKDATE_MS: i64 = 10_000_000_000;

/// Search, category, sort and page selection for one listing request.
///
/// Changing the search text, category or sort resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    search: String,
    category: Category,
    sort: SortKey,
    page: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: Category::All,
            sort: SortKey::Likes,
            page: 1,
        }
    }
}

impl ListingQuery {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into().to_lowercase();
        self.page = 1;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self.page = 1;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self.page = 1;
        self
    }

    /// Page numbers start at 1; 0 is read as 1.
    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub items: Vec<DisplayMeme>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Attaches random likes, comment counts and a backdated timestamp to each template.
pub fn decorate<R: Rng + ?Sized>(templates: Vec<MemeTemplate>, now: DateTime<Utc>, rng: &mut R) -> Vec<DisplayMeme> {
    templates
        .into_iter()
        .map(|template| DisplayMeme {
            template,
            likes: rng.gen_range(0..MAX_RANDOM_LIKES),
            comments: rng.gen_range(0..MAX_RANDOM_COMMENTS),
            created_at: now - Duration::milliseconds(rng.gen_range(0..MAX_BACKDATE_MS)),
        })
        .collect()
}

fn matches_search(meme: &DisplayMeme, needle: &str) -> bool {
    needle.is_empty() || meme.template.name.to_lowercase().contains(needle)
}

fn matches_category(meme: &DisplayMeme, category: Category, now: DateTime<Utc>) -> bool {
    match category {
        Category::Trending => meme.likes > TRENDING_MIN_LIKES,
        Category::New => meme.created_at > now - Duration::days(NEW_WITHIN_DAYS),
        Category::Classic => match now.checked_sub_months(Months::new(12)) {
            Some(one_year_ago) => meme.created_at < one_year_ago,
            None => false,
        },
        Category::All | Category::Random => true,
    }
}

/// Applies search, category and ordering, returning the full ordered result.
pub fn filter_and_sort<R: Rng + ?Sized>(
    memes: &[DisplayMeme],
    query: &ListingQuery,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<DisplayMeme> {
    let mut selected: Vec<DisplayMeme> = memes
        .iter()
        .filter(|meme| matches_search(meme, &query.search))
        .filter(|meme| matches_category(meme, query.category, now))
        .cloned()
        .collect();

    if query.category == Category::Random {
        selected.shuffle(rng);
    } else {
        // sort_by is stable, so ties keep their fetched order
        match query.sort {
            SortKey::Likes => selected.sort_by(|a, b| b.likes.cmp(&a.likes)),
            SortKey::Date => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortKey::Comments => selected.sort_by(|a, b| b.comments.cmp(&a.comments)),
        }
    }
    selected
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// Cuts one page out of an ordered result. Out-of-range pages are empty.
pub fn paginate(sorted: Vec<DisplayMeme>, page: usize) -> ListingPage {
    let page = page.max(1);
    let total_items = sorted.len();
    let items = sorted
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();
    ListingPage {
        items,
        page,
        total_pages: total_pages(total_items),
        total_items,
    }
}

pub fn list_page<R: Rng + ?Sized>(
    memes: &[DisplayMeme],
    query: &ListingQuery,
    now: DateTime<Utc>,
    rng: &mut R,
) -> ListingPage {
    let sorted = filter_and_sort(memes, query, now, rng);
    let page = paginate(sorted, query.page());
    tracing::debug!(
        page = page.page,
        total_pages = page.total_pages,
        total_items = page.total_items,
        category = ?query.category,
        sort = ?query.sort,
        "Listing page derived"
    );
    page
}

pub fn home_feed(mut templates: Vec<MemeTemplate>) -> Vec<MemeTemplate> {
    templates.truncate(HOME_FEED_SIZE);
    templates
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub template: MemeTemplate,
    pub likes: u32,
}

/// Top templates by a freshly drawn like count, highest first.
pub fn leaderboard<R: Rng + ?Sized>(templates: Vec<MemeTemplate>, rng: &mut R) -> Vec<LeaderboardEntry> {
    let mut scored: Vec<(MemeTemplate, u32)> = templates
        .into_iter()
        .map(|t| (t, rng.gen_range(0..MAX_LEADERBOARD_LIKES)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, (template, likes))| LeaderboardEntry {
            rank: i + 1,
            template,
            likes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn template(id: usize, name: &str) -> MemeTemplate {
        MemeTemplate {
            id: id.to_string(),
            name: name.to_string(),
            url: format!("https://i.imgflip.com/{}.jpg", id),
            width: 500,
            height: 500,
        }
    }

    fn meme(id: usize, name: &str, likes: u32, comments: u32, age_days: i64) -> DisplayMeme {
        DisplayMeme {
            template: template(id, name),
            likes,
            comments,
            created_at: now() - Duration::days(age_days),
        }
    }

    fn sample() -> Vec<DisplayMeme> {
        vec![
            meme(1, "Drake Hotline Bling", 900, 10, 5),
            meme(2, "Distracted Boyfriend", 120, 80, 400),
            meme(3, "Two Buttons", 650, 40, 45),
            meme(4, "Change My Mind", 501, 5, 20),
            meme(5, "Left Exit 12 Off Ramp", 500, 99, 800),
            meme(6, "Running Away Balloon", 30, 60, 2),
        ]
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut rng = StdRng::seed_from_u64(1);
        let query = ListingQuery::default().with_search("BUTTON");
        let result = filter_and_sort(&sample(), &query, now(), &mut rng);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].template.name, "Two Buttons");
        for excluded in sample().iter().filter(|m| m.template.id != "3") {
            assert!(!excluded.template.name.to_lowercase().contains("button"));
        }
    }

    #[test]
    fn empty_search_matches_everything() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = filter_and_sort(&sample(), &ListingQuery::default(), now(), &mut rng);
        assert_eq!(result.len(), sample().len());
    }

    #[test]
    fn trending_keeps_strictly_more_than_500_likes() {
        let mut rng = StdRng::seed_from_u64(1);
        let query = ListingQuery::default().with_category(Category::Trending);
        let result = filter_and_sort(&sample(), &query, now(), &mut rng);

        let ids: Vec<_> = result.iter().map(|m| m.template.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert!(result.iter().all(|m| m.likes > 500));
    }

    #[test]
    fn new_keeps_only_last_thirty_days() {
        let mut rng = StdRng::seed_from_u64(1);
        let memes = vec![meme(10, "Fresh", 1, 1, 10), meme(11, "Stale", 1, 1, 40)];
        let query = ListingQuery::default().with_category(Category::New);
        let result = filter_and_sort(&memes, &query, now(), &mut rng);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].template.name, "Fresh");
    }

    #[test]
    fn classic_keeps_items_older_than_a_year() {
        let mut rng = StdRng::seed_from_u64(1);
        let query = ListingQuery::default().with_category(Category::Classic);
        let result = filter_and_sort(&sample(), &query, now(), &mut rng);

        let ids: Vec<_> = result.iter().map(|m| m.template.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "2"]);
        let one_year_ago = now().checked_sub_months(Months::new(12)).unwrap();
        assert!(result.iter().all(|m| m.created_at < one_year_ago));
    }

    #[test]
    fn sorts_are_non_increasing() {
        let mut rng = StdRng::seed_from_u64(1);
        for sort in [SortKey::Likes, SortKey::Date, SortKey::Comments] {
            let query = ListingQuery::default().with_sort(sort);
            let result = filter_and_sort(&sample(), &query, now(), &mut rng);
            for pair in result.windows(2) {
                match sort {
                    SortKey::Likes => assert!(pair[0].likes >= pair[1].likes),
                    SortKey::Date => assert!(pair[0].created_at >= pair[1].created_at),
                    SortKey::Comments => assert!(pair[0].comments >= pair[1].comments),
                }
            }
        }
    }

    #[test]
    fn ties_keep_source_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let memes = vec![meme(1, "a", 7, 0, 1), meme(2, "b", 9, 0, 1), meme(3, "c", 7, 0, 1)];
        let result = filter_and_sort(&memes, &ListingQuery::default(), now(), &mut rng);
        let ids: Vec<_> = result.iter().map(|m| m.template.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn random_category_shuffles_without_filtering() {
        let mut rng = StdRng::seed_from_u64(42);
        let query = ListingQuery::default().with_category(Category::Random);
        let result = filter_and_sort(&sample(), &query, now(), &mut rng);

        let mut ids: Vec<_> = result.iter().map(|m| m.template.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn fourteen_templates_split_into_twelve_and_two() {
        let mut rng = StdRng::seed_from_u64(7);
        let memes: Vec<_> = (0..14).map(|i| meme(i, &format!("meme {}", i), (i as u32) * 10, 0, 1)).collect();

        let first = list_page(&memes, &ListingQuery::default(), now(), &mut rng);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.total_items, 14);
        assert_eq!(first.items.len(), 12);
        let likes: Vec<u32> = first.items.iter().map(|m| m.likes).collect();
        assert_eq!(likes, (2..14).rev().map(|i| i * 10).collect::<Vec<u32>>());

        let second = list_page(&memes, &ListingQuery::default().with_page(2), now(), &mut rng);
        let likes: Vec<u32> = second.items.iter().map(|m| m.likes).collect();
        assert_eq!(likes, vec![10, 0]);
    }

    #[test]
    fn pages_concatenate_to_the_sorted_sequence() {
        let mut rng = StdRng::seed_from_u64(3);
        let memes = decorate((0..31).map(|i| template(i, "x")).collect(), now(), &mut rng);
        let sorted = filter_and_sort(&memes, &ListingQuery::default(), now(), &mut rng);
        let pages = total_pages(sorted.len());
        assert_eq!(pages, 3);

        let mut joined = Vec::new();
        for page in 1..=pages {
            let cut = paginate(sorted.clone(), page);
            if page < pages {
                assert_eq!(cut.items.len(), PAGE_SIZE);
            }
            joined.extend(cut.items);
        }
        assert_eq!(joined, sorted);
    }

    #[test]
    fn out_of_range_page_is_empty_not_a_panic() {
        let page = paginate(sample(), 9);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);

        let zero = paginate(sample(), 0);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.items.len(), 6);

        let empty = paginate(Vec::new(), 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn changing_filters_resets_page() {
        let query = ListingQuery::default().with_page(3);
        assert_eq!(query.clone().with_search("cat").page(), 1);
        assert_eq!(query.clone().with_category(Category::New).page(), 1);
        assert_eq!(query.clone().with_sort(SortKey::Date).page(), 1);
        assert_eq!(query.page(), 3);
    }

    #[test]
    fn decoration_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(9);
        let memes = decorate((0..50).map(|i| template(i, "x")).collect(), now(), &mut rng);
        for m in &memes {
            assert!(m.likes < 1000);
            assert!(m.comments < 100);
            assert!(m.created_at <= now());
            assert!(m.created_at > now() - Duration::milliseconds(MAX_BACKDATE_MS));
        }
    }

    #[test]
    fn home_feed_takes_first_six() {
        let feed = home_feed((0..10).map(|i| template(i, "x")).collect());
        let ids: Vec<_> = feed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5"]);
    }

    #[test]
    fn leaderboard_is_top_ten_descending() {
        let mut rng = StdRng::seed_from_u64(11);
        let board = leaderboard((0..25).map(|i| template(i, "x")).collect(), &mut rng);
        assert_eq!(board.len(), LEADERBOARD_SIZE);
        assert_eq!(board[0].rank, 1);
        for pair in board.windows(2) {
            assert!(pair[0].likes >= pair[1].likes);
        }
    }
}
