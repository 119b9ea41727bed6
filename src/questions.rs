//! Question content and the provider seam.
//!
//! The orchestrator only ever talks to [`QuestionProvider`]; the built-in
//! [`StaticCatalog`] is enough for a single-process deployment and a remote
//! content store can slot in behind the same trait.

use crate::types::{Category, ContentTier, Question};
use async_trait::async_trait;
use rand::seq::SliceRandom;

#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Return up to `count` questions for a category, filtered to
    /// `tier_ceiling`. With `exclusive_only` the result contains only
    /// top-tier items, irrespective of the ceiling. May return fewer than
    /// `count`; callers own the shortage handling.
    async fn fetch(
        &self,
        category: Category,
        count: usize,
        tier_ceiling: ContentTier,
        exclusive_only: bool,
    ) -> Vec<Question>;
}

/// The built-in, process-embedded question set. Stateless and side-effect
/// free, safely shared by all rooms.
pub struct StaticCatalog {
    questions: Vec<Question>,
}

fn q(id: &str, text: &str, options: &[&str], tier: ContentTier, category: Category) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        tier,
        category,
    }
}

impl StaticCatalog {
    pub fn builtin() -> Self {
        use Category::*;
        use ContentTier::*;
        let questions = vec![
            // Favorites
            q("fav-01", "What is your partner's favorite season?", &["Spring", "Summer", "Autumn", "Winter"], Mild, Favorites),
            q("fav-02", "Which cuisine would your partner pick for a night out?", &["Italian", "Japanese", "Mexican", "Indian"], Mild, Favorites),
            q("fav-03", "What is your partner's favorite way to spend a Sunday?", &["Sleeping in", "Outdoors", "Movies", "Cooking"], Mild, Favorites),
            q("fav-04", "Which drink does your partner order first?", &["Coffee", "Tea", "Beer", "Wine"], Mild, Favorites),
            q("fav-05", "What kind of music does your partner play most?", &["Pop", "Rock", "Hip-hop", "Classical"], Mild, Favorites),
            q("fav-06", "What is your partner's favorite dessert?", &["Ice cream", "Cake", "Chocolate", "Fruit"], Mild, Favorites),
            q("fav-07", "Which vacation would your partner choose?", &["Beach", "Mountains", "City trip", "Road trip"], Mild, Favorites),
            // Daily life
            q("day-01", "Who takes longer to get ready in the morning?", &["Me", "My partner"], Mild, DailyLife),
            q("day-02", "What does your partner reach for first after waking up?", &["Phone", "Coffee", "Snooze button", "Shower"], Mild, DailyLife),
            q("day-03", "Who is more likely to forget a birthday?", &["Me", "My partner"], Mild, DailyLife),
            q("day-04", "What chore does your partner secretly hate most?", &["Dishes", "Laundry", "Vacuuming", "Trash"], Mild, DailyLife),
            q("day-05", "Who falls asleep first most nights?", &["Me", "My partner"], Mild, DailyLife),
            q("day-06", "Who would win an argument about directions?", &["Me", "My partner"], Spicy, DailyLife),
            // Memories
            q("mem-01", "Where was your first date?", &["Restaurant", "Cinema", "Park", "Somewhere else"], Mild, Memories),
            q("mem-02", "Who said 'I love you' first?", &["Me", "My partner"], Mild, Memories),
            q("mem-03", "What did your partner first notice about you?", &["Smile", "Eyes", "Humor", "Style"], Mild, Memories),
            q("mem-04", "Which trip together would your partner call the best?", &["The first one", "The longest one", "The cheapest one", "The disaster one"], Mild, Memories),
            q("mem-05", "Who was more nervous on the first date?", &["Me", "My partner"], Spicy, Memories),
            // Would you rather
            q("wyr-01", "Would your partner rather give up coffee or dessert?", &["Coffee", "Dessert"], Mild, WouldYouRather),
            q("wyr-02", "Would your partner rather live by the sea or in the mountains?", &["Sea", "Mountains"], Mild, WouldYouRather),
            q("wyr-03", "Would your partner rather cook every day or clean every day?", &["Cook", "Clean"], Mild, WouldYouRather),
            q("wyr-04", "Would your partner rather time-travel to the past or the future?", &["Past", "Future"], Mild, WouldYouRather),
            q("wyr-05", "Would your partner rather sing karaoke or dance in public?", &["Karaoke", "Dance"], Spicy, WouldYouRather),
            q("wyr-06", "Would your partner rather share their search history or their bank balance?", &["Search history", "Bank balance"], Spicy, WouldYouRather),
            // Intimacy
            q("int-01", "Where does your partner like to be kissed most?", &["Cheek", "Neck", "Forehead", "Hand"], Spicy, Intimacy),
            q("int-02", "Who is more romantic?", &["Me", "My partner"], Spicy, Intimacy),
            q("int-03", "What would your partner call the perfect date night ending?", &["Dancing", "Long walk", "Nightcap", "Straight home"], Spicy, Intimacy),
            q("int-04", "Which compliment does your partner most want to hear?", &["Beautiful", "Smart", "Funny", "Irresistible"], Explicit, Intimacy),
            q("int-05", "Who is more likely to suggest staying in bed all day?", &["Me", "My partner"], Explicit, Intimacy),
            q("int-06", "What does your partner find most attractive in you?", &["Confidence", "Kindness", "Looks", "Spontaneity"], Explicit, Intimacy),
            q("int-07", "Who initiates affection more often?", &["Me", "My partner"], Explicit, Intimacy),
            q("int-08", "Which surprise would your partner enjoy most?", &["Candlelight dinner", "Weekend away", "Love letter", "Slow dance at home"], Explicit, Intimacy),
        ];
        Self { questions }
    }
}

#[async_trait]
impl QuestionProvider for StaticCatalog {
    async fn fetch(
        &self,
        category: Category,
        count: usize,
        tier_ceiling: ContentTier,
        exclusive_only: bool,
    ) -> Vec<Question> {
        let mut pool: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.category == category)
            .filter(|q| {
                if exclusive_only {
                    q.tier == ContentTier::EXCLUSIVE
                } else {
                    q.tier <= tier_ceiling
                }
            })
            .cloned()
            .collect();
        pool.shuffle(&mut rand::rng());
        pool.truncate(count);
        pool
    }
}
