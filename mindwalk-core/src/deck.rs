//! History-aware card selection.
//!
//! Draws pick uniformly among the kinds tied for the lowest usage count,
//! then uniformly among that kind's prompts, steering away from content
//! already seen. Content de-duplication is a bounded retry, not a
//! guarantee: once the catalog is exhausted a repeat is accepted.

use rand::Rng;

use crate::catalog;
use crate::models::{CardKind, WalkCard};

/// Attempts at a fresh content string before accepting a repeat.
pub const MAX_CONTENT_RETRIES: usize = 10;

/// Usage count per kind, indexed by `CardKind::index`.
pub fn kind_usage(history: &[CardKind]) -> [u32; 5] {
    let mut counts = [0u32; 5];
    for kind in history {
        counts[kind.index()] += 1;
    }
    counts
}

/// The kinds tied for the minimum usage count.
pub fn least_used_kinds(history: &[CardKind]) -> Vec<CardKind> {
    least_used_among(&CardKind::ALL, history)
}

fn least_used_among(candidates: &[CardKind], history: &[CardKind]) -> Vec<CardKind> {
    let counts = kind_usage(history);
    let min = candidates
        .iter()
        .map(|kind| counts[kind.index()])
        .min()
        .unwrap_or(0);
    candidates
        .iter()
        .copied()
        .filter(|kind| counts[kind.index()] == min)
        .collect()
}

/// Pick the next kind: uniform among the least-used of `preferred`, or of
/// all kinds when the preference list is empty.
pub fn choose_kind<R: Rng>(preferred: &[CardKind], history: &[CardKind], rng: &mut R) -> CardKind {
    let candidates: &[CardKind] = if preferred.is_empty() {
        &CardKind::ALL
    } else {
        preferred
    };
    let tied = least_used_among(candidates, history);
    tied[rng.gen_range(0..tied.len())]
}

fn pick_content<R: Rng>(kind: CardKind, avoid: &[String], rng: &mut R) -> &'static str {
    let prompts = catalog::examples_for(kind);
    let mut choice = prompts[rng.gen_range(0..prompts.len())];
    for _ in 0..MAX_CONTENT_RETRIES {
        if !avoid.iter().any(|used| used.as_str() == choice) {
            break;
        }
        choice = prompts[rng.gen_range(0..prompts.len())];
    }
    choice
}

fn estimate_minutes<R: Rng>(kind: CardKind, rng: &mut R) -> Option<u8> {
    if catalog::is_markable(kind) {
        Some(rng.gen_range(1..=5))
    } else {
        None
    }
}

/// Draw the next card given the kinds drawn so far and the content strings
/// to steer away from.
pub fn draw_card<R: Rng>(history: &[CardKind], avoid: &[String], rng: &mut R) -> WalkCard {
    draw_card_preferring(&[], history, avoid, rng)
}

/// Like [`draw_card`], restricted to a preferred-kind subset. An empty
/// preference list falls back to all kinds.
pub fn draw_card_preferring<R: Rng>(
    preferred: &[CardKind],
    history: &[CardKind],
    avoid: &[String],
    rng: &mut R,
) -> WalkCard {
    let kind = choose_kind(preferred, history, rng);
    let content = pick_content(kind, avoid, rng);
    let estimated = estimate_minutes(kind, rng);
    WalkCard::new(kind, content, estimated)
}

/// Draw `count` cards with best-effort distinct contents.
pub fn draw_batch<R: Rng>(count: usize, rng: &mut R) -> Vec<WalkCard> {
    let mut cards = Vec::with_capacity(count);
    let mut drawn: Vec<String> = Vec::with_capacity(count);
    for _ in 0..count {
        let kind = CardKind::ALL[rng.gen_range(0..CardKind::ALL.len())];
        let content = pick_content(kind, &drawn, rng);
        let estimated = estimate_minutes(kind, rng);
        drawn.push(content.to_string());
        cards.push(WalkCard::new(kind, content, estimated));
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_kind_usage_counts_per_kind() {
        let history = [
            CardKind::Observation,
            CardKind::Observation,
            CardKind::Movement,
        ];
        let counts = kind_usage(&history);
        assert_eq!(counts[CardKind::Observation.index()], 2);
        assert_eq!(counts[CardKind::Movement.index()], 1);
        assert_eq!(counts[CardKind::Discovery.index()], 0);
    }

    #[test]
    fn test_least_used_kinds_returns_the_tied_minimum() {
        let history = [
            CardKind::Observation,
            CardKind::Observation,
            CardKind::Movement,
        ];
        let tied = least_used_kinds(&history);
        assert_eq!(
            tied,
            vec![
                CardKind::Interaction,
                CardKind::Reflection,
                CardKind::Discovery
            ]
        );
    }

    #[test]
    fn test_used_kind_never_drawn_while_others_are_fresh() {
        let mut rng = StdRng::seed_from_u64(7);
        let history = [
            CardKind::Observation,
            CardKind::Observation,
            CardKind::Observation,
        ];
        for _ in 0..50 {
            let card = draw_card(&history, &[], &mut rng);
            assert_ne!(card.kind, CardKind::Observation);
        }
    }

    #[test]
    fn test_estimated_minutes_only_where_the_kind_supports_it() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let card = draw_card_preferring(&[CardKind::Reflection], &[], &[], &mut rng);
            let minutes = card.estimated_minutes.unwrap();
            assert!((1..=5).contains(&minutes));

            let card = draw_card_preferring(&[CardKind::Movement], &[], &[], &mut rng);
            assert!(card.estimated_minutes.is_none());
        }
    }

    #[test]
    fn test_content_steers_away_from_recent_repeats() {
        let mut rng = StdRng::seed_from_u64(13);
        let used = catalog::examples_for(CardKind::Observation)[0].to_string();
        let avoid = vec![used.clone()];
        for _ in 0..50 {
            let card = draw_card_preferring(&[CardKind::Observation], &[], &avoid, &mut rng);
            assert_ne!(card.content, used);
        }
    }

    #[test]
    fn test_exhausted_catalog_accepts_a_repeat() {
        let mut rng = StdRng::seed_from_u64(17);
        let avoid: Vec<String> = catalog::examples_for(CardKind::Observation)
            .iter()
            .map(|p| p.to_string())
            .collect();
        let card = draw_card_preferring(&[CardKind::Observation], &[], &avoid, &mut rng);
        assert!(avoid.contains(&card.content));
    }

    #[test]
    fn test_empty_preference_list_falls_back_to_all_kinds() {
        let mut rng = StdRng::seed_from_u64(19);
        let card = draw_card_preferring(&[], &[], &[], &mut rng);
        assert!(CardKind::ALL.contains(&card.kind));
    }

    #[test]
    fn test_preferred_subset_restricts_the_draw() {
        let mut rng = StdRng::seed_from_u64(23);
        let preferred = [CardKind::Movement, CardKind::Discovery];
        for _ in 0..30 {
            let card = draw_card_preferring(&preferred, &[], &[], &mut rng);
            assert!(preferred.contains(&card.kind));
        }
    }

    #[test]
    fn test_batch_draws_distinct_contents() {
        let mut rng = StdRng::seed_from_u64(29);
        let cards = draw_batch(5, &mut rng);
        assert_eq!(cards.len(), 5);
        let contents: HashSet<_> = cards.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents.len(), 5);
    }
}
