//! Comment forest assembly.
//!
//! Turns flat comment rows plus the two vote maps into the nested
//! structure the thread view serializes. The builder is pure: it touches
//! no storage, so it can be exercised exhaustively in tests and its output
//! is safe to cache.
//!
//! Two passes:
//! 1. map every row to a node, annotated with its score and the viewer's
//!    own vote
//! 2. link each node under its parent; nodes whose parent is not in the
//!    input set are dropped (their parent fell outside the fetched
//!    top-level page, so there is nowhere to hang them)

use crate::db::query::QueryComment;
use serde::Serialize;
use std::collections::HashMap;

/// One comment in the rendered thread, with its replies nested below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    pub comment_id: i64,
    pub parent_comment_id: Option<i64>,
    pub author: String,
    pub body: String,
    pub created_at_us: i64,
    /// Net score. Zero when nobody has voted.
    pub vote_count: i64,
    /// The viewing user's own vote: `-1`, `1`, or `null` when they have
    /// not voted (or are anonymous).
    pub user_vote: Option<i8>,
    pub replies: Vec<CommentNode>,
}

/// Build the nested comment forest from flat rows and vote maps.
///
/// `comments` holds top-level rows and reply rows together, each already
/// in the order its own level should render. Top-level comments are
/// re-sorted newest first for determinism regardless of input order;
/// replies keep their input order under each parent.
#[must_use]
pub fn build_forest(
    comments: &[QueryComment],
    scores: &HashMap<i64, i64>,
    viewer_votes: &HashMap<i64, i8>,
) -> Vec<CommentNode> {
    // Pass 1: index every row so parent links can be resolved.
    let mut index_by_id = HashMap::with_capacity(comments.len());
    for (idx, comment) in comments.iter().enumerate() {
        index_by_id.insert(comment.comment_id, idx);
    }

    // Pass 2: partition into roots and per-parent child lists, dropping
    // rows whose parent is absent.
    let mut roots: Vec<usize> = Vec::new();
    let mut children_of: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, comment) in comments.iter().enumerate() {
        match comment.parent_comment_id {
            None => roots.push(idx),
            Some(parent_id) => {
                if let Some(&parent_idx) = index_by_id.get(&parent_id) {
                    children_of.entry(parent_idx).or_default().push(idx);
                }
            }
        }
    }

    roots.sort_by(|&a, &b| {
        let (ca, cb) = (&comments[a], &comments[b]);
        cb.created_at_us
            .cmp(&ca.created_at_us)
            .then(cb.comment_id.cmp(&ca.comment_id))
    });

    roots
        .into_iter()
        .map(|idx| assemble(idx, comments, &children_of, scores, viewer_votes))
        .collect()
}

fn assemble(
    idx: usize,
    comments: &[QueryComment],
    children_of: &HashMap<usize, Vec<usize>>,
    scores: &HashMap<i64, i64>,
    viewer_votes: &HashMap<i64, i8>,
) -> CommentNode {
    let comment = &comments[idx];
    let replies = children_of
        .get(&idx)
        .map(|child_indexes| {
            child_indexes
                .iter()
                .map(|&child| assemble(child, comments, children_of, scores, viewer_votes))
                .collect()
        })
        .unwrap_or_default();

    CommentNode {
        comment_id: comment.comment_id,
        parent_comment_id: comment.parent_comment_id,
        author: comment.author.clone(),
        body: comment.body.clone(),
        created_at_us: comment.created_at_us,
        vote_count: scores.get(&comment.comment_id).copied().unwrap_or(0),
        user_vote: viewer_votes.get(&comment.comment_id).copied(),
        replies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(comment_id: i64, parent: Option<i64>, created: i64) -> QueryComment {
        QueryComment {
            comment_id,
            post_id: 1,
            parent_comment_id: parent,
            author: format!("user{comment_id}"),
            body: format!("body {comment_id}"),
            created_at_us: created,
        }
    }

    #[test]
    fn annotates_scores_and_viewer_votes() {
        let comments = vec![row(1, None, 100), row(2, None, 200), row(3, Some(1), 300)];
        let scores = HashMap::from([(1, 5), (2, -2)]);
        let viewer_votes = HashMap::from([(1, 1_i8)]);

        let forest = build_forest(&comments, &scores, &viewer_votes);

        assert_eq!(forest.len(), 2);
        // Newest top-level first.
        assert_eq!(forest[0].comment_id, 2);
        assert_eq!(forest[0].vote_count, -2);
        assert_eq!(forest[0].user_vote, None);

        assert_eq!(forest[1].comment_id, 1);
        assert_eq!(forest[1].vote_count, 5);
        assert_eq!(forest[1].user_vote, Some(1));
        assert_eq!(forest[1].replies.len(), 1);
        assert_eq!(forest[1].replies[0].comment_id, 3);
        assert_eq!(forest[1].replies[0].vote_count, 0);
    }

    #[test]
    fn unknown_ids_score_zero() {
        let comments = vec![row(7, None, 100)];
        let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());
        assert_eq!(forest[0].vote_count, 0);
        assert_eq!(forest[0].user_vote, None);
    }

    #[test]
    fn orphaned_replies_are_dropped() {
        // Reply 9's parent (id 8) is not in the input set.
        let comments = vec![row(1, None, 100), row(9, Some(8), 200)];
        let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].comment_id, 1);
        assert!(forest[0].replies.is_empty());
    }

    #[test]
    fn top_level_ties_break_by_id_descending() {
        let comments = vec![row(3, None, 100), row(5, None, 100), row(4, None, 100)];
        let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());
        let ids: Vec<i64> = forest.iter().map(|n| n.comment_id).collect();
        assert_eq!(ids, vec![5, 4, 3]);
    }

    #[test]
    fn replies_keep_input_order() {
        let comments = vec![
            row(1, None, 100),
            row(30, Some(1), 500),
            row(20, Some(1), 400),
            row(10, Some(1), 600),
        ];
        let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());
        let reply_ids: Vec<i64> = forest[0].replies.iter().map(|n| n.comment_id).collect();
        assert_eq!(reply_ids, vec![30, 20, 10]);
    }

    #[test]
    fn nested_depth_is_preserved() {
        let comments = vec![row(1, None, 100), row(2, Some(1), 200), row(3, Some(2), 300)];
        let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].replies[0].comment_id, 2);
        assert_eq!(forest[0].replies[0].replies[0].comment_id, 3);
    }

    #[test]
    fn builder_is_deterministic() {
        let comments = vec![row(1, None, 100), row(2, None, 200), row(3, Some(1), 300)];
        let scores = HashMap::from([(1, 5)]);
        let votes = HashMap::from([(2, -1_i8)]);

        let a = build_forest(&comments, &scores, &votes);
        let b = build_forest(&comments, &scores, &votes);
        assert_eq!(a, b);
    }

    #[test]
    fn user_vote_serializes_as_null_when_absent() {
        let comments = vec![row(1, None, 100)];
        let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());
        let json = serde_json::to_value(&forest[0]).expect("serialize node");
        assert!(json["user_vote"].is_null());
        assert_eq!(json["vote_count"], 0);
    }

    fn count_nodes(forest: &[CommentNode]) -> usize {
        forest
            .iter()
            .map(|node| 1 + count_nodes(&node.replies))
            .sum()
    }

    proptest! {
        /// With no orphans, every input row appears exactly once in the
        /// output forest.
        #[test]
        fn no_orphans_means_no_loss(reply_parents in prop::collection::vec(0_i64..10, 0..40)) {
            let mut comments: Vec<QueryComment> =
                (0..10).map(|id| row(id, None, 1000 + id)).collect();
            for (offset, parent) in reply_parents.iter().enumerate() {
                let id = 100 + offset as i64;
                comments.push(row(id, Some(*parent), 2000 + id));
            }

            let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());
            prop_assert_eq!(count_nodes(&forest), comments.len());
        }

        /// Orphaned replies never appear anywhere in the forest.
        #[test]
        fn orphans_never_surface(orphan_ids in prop::collection::vec(500_i64..600, 1..10)) {
            let mut comments = vec![row(1, None, 100)];
            for id in &orphan_ids {
                comments.push(row(*id, Some(9999), 200));
            }

            let forest = build_forest(&comments, &HashMap::new(), &HashMap::new());
            prop_assert_eq!(count_nodes(&forest), 1);
        }
    }
}
