//! Threaded comment reconstruction.
//!
//! The backend returns the comments of a feed item as a flat list in arrival
//! order, each pointing at its parent by id. A [`CommentForest`] groups that
//! list by parent and walks it depth-first from the synthetic root
//! ([`ROOT_PARENT`]), yielding every reachable comment with its depth.
//!
//! ```text
//! [{1, parent 0}, {2, parent 1}, {3, parent 0}]
//!
//! 1        depth 0
//!   2      depth 1
//! 3        depth 0
//! ```
//!
//! Sibling order is the arrival order; nothing is re-sorted. Comments whose
//! parent never appears are unreachable and are reported by
//! [`CommentForest::orphans`] instead of being yielded.

use crate::social::types::{Comment, CommentId, ROOT_PARENT};
use std::collections::{HashMap, HashSet};

/// Read-only view of one feed item's comments, grouped by parent.
#[derive(Debug, Clone, Default)]
pub struct CommentForest {
    comments: Vec<Comment>,
    /// Parent id → indices into `comments`, in arrival order.
    by_parent: HashMap<CommentId, Vec<usize>>,
}

impl CommentForest {
    /// Groups a flat comment list by parent id.
    pub fn build(comments: impl IntoIterator<Item = Comment>) -> Self {
        let comments: Vec<Comment> = comments.into_iter().collect();
        let mut by_parent: HashMap<CommentId, Vec<usize>> = HashMap::new();
        for (index, comment) in comments.iter().enumerate() {
            by_parent.entry(comment.parent_id).or_default().push(index);
        }
        Self {
            comments,
            by_parent,
        }
    }

    /// Number of comments held, reachable or not.
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// Returns true if there are no comments.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// All comments in arrival order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Top-level comments in arrival order.
    pub fn roots(&self) -> impl Iterator<Item = &Comment> + '_ {
        self.children(ROOT_PARENT)
    }

    /// Direct replies to `parent` in arrival order.
    pub fn children(&self, parent: CommentId) -> impl Iterator<Item = &Comment> + '_ {
        self.child_indices(parent)
            .iter()
            .map(move |&index| &self.comments[index])
    }

    /// Lazy depth-first walk in display order.
    ///
    /// Each call starts a fresh walk.
    pub fn iter(&self) -> Walk<'_> {
        Walk::new(self)
    }

    /// Comments never reached from the root: dangling parents, cycles and
    /// self-replies.
    pub fn orphans(&self) -> Vec<&Comment> {
        let mut reached = vec![false; self.comments.len()];
        let mut walk = self.iter();
        while let Some((index, _)) = walk.next_index() {
            reached[index] = true;
        }
        self.comments
            .iter()
            .zip(reached)
            .filter(|(_, seen)| !seen)
            .map(|(comment, _)| comment)
            .collect()
    }

    fn child_indices(&self, parent: CommentId) -> &[usize] {
        self.by_parent
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl<'a> IntoIterator for &'a CommentForest {
    type Item = ThreadedComment<'a>;
    type IntoIter = Walk<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A comment positioned in the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadedComment<'a> {
    pub comment: &'a Comment,
    /// 0 for top-level comments.
    pub depth: usize,
}

#[derive(Debug)]
struct Frame {
    parent: CommentId,
    cursor: usize,
}

/// Pre-order iterator over a [`CommentForest`].
///
/// Ids on the active path are tracked so a repeated id (duplicate records,
/// a comment claiming its own id as parent under a reachable duplicate)
/// truncates the branch instead of recursing forever.
#[derive(Debug)]
pub struct Walk<'a> {
    forest: &'a CommentForest,
    stack: Vec<Frame>,
    path: HashSet<CommentId>,
}

impl<'a> Walk<'a> {
    fn new(forest: &'a CommentForest) -> Self {
        let mut path = HashSet::new();
        path.insert(ROOT_PARENT);
        Self {
            forest,
            stack: vec![Frame {
                parent: ROOT_PARENT,
                cursor: 0,
            }],
            path,
        }
    }

    /// Advances the walk, returning the comment index and its depth.
    fn next_index(&mut self) -> Option<(usize, usize)> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let frame = self.stack.last_mut()?;
            let siblings = self.forest.child_indices(frame.parent);

            let Some(&index) = siblings.get(frame.cursor) else {
                if let Some(done) = self.stack.pop() {
                    self.path.remove(&done.parent);
                }
                continue;
            };
            frame.cursor += 1;

            let id = self.forest.comments[index].comment_id;
            if !self.path.insert(id) {
                continue;
            }
            self.stack.push(Frame {
                parent: id,
                cursor: 0,
            });
            return Some((index, depth));
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = ThreadedComment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let forest = self.forest;
        self.next_index().map(|(index, depth)| ThreadedComment {
            comment: &forest.comments[index],
            depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: CommentId, parent: CommentId) -> Comment {
        Comment {
            comment_id: id,
            parent_id: parent,
            user_id: 1,
            username: "u".to_string(),
            avatar: String::new(),
            content: format!("comment {}", id),
            created_at: id,
        }
    }

    fn order(forest: &CommentForest) -> Vec<(CommentId, usize)> {
        forest
            .iter()
            .map(|t| (t.comment.comment_id, t.depth))
            .collect()
    }

    #[test]
    fn test_simple_thread() {
        let forest = CommentForest::build(vec![comment(1, 0), comment(2, 1), comment(3, 0)]);
        assert_eq!(order(&forest), vec![(1, 0), (2, 1), (3, 0)]);
    }

    #[test]
    fn test_empty_forest() {
        let forest = CommentForest::build(Vec::new());
        assert!(forest.is_empty());
        assert_eq!(forest.iter().count(), 0);
        assert!(forest.orphans().is_empty());
    }

    #[test]
    fn test_sibling_order_is_arrival_order() {
        // Replies arrive before their parent and out of id order.
        let forest = CommentForest::build(vec![
            comment(5, 2),
            comment(9, 0),
            comment(2, 0),
            comment(4, 2),
            comment(7, 9),
        ]);
        assert_eq!(
            order(&forest),
            vec![(9, 0), (7, 1), (2, 0), (5, 1), (4, 1)]
        );
        let roots: Vec<_> = forest.roots().map(|c| c.comment_id).collect();
        assert_eq!(roots, vec![9, 2]);
        let replies: Vec<_> = forest.children(2).map(|c| c.comment_id).collect();
        assert_eq!(replies, vec![5, 4]);
    }

    #[test]
    fn test_deep_chain() {
        let comments: Vec<_> = (1..=200).map(|id| comment(id, id - 1)).collect();
        let forest = CommentForest::build(comments);
        let walked = order(&forest);
        assert_eq!(walked.len(), 200);
        assert_eq!(walked.last(), Some(&(200, 199)));
    }

    #[test]
    fn test_dangling_parent_is_orphaned() {
        let forest = CommentForest::build(vec![comment(1, 0), comment(2, 99), comment(3, 2)]);
        assert_eq!(order(&forest), vec![(1, 0)]);
        let orphans: Vec<_> = forest.orphans().iter().map(|c| c.comment_id).collect();
        assert_eq!(orphans, vec![2, 3]);
    }

    #[test]
    fn test_self_reference_terminates() {
        let forest = CommentForest::build(vec![comment(1, 0), comment(2, 2)]);
        assert_eq!(order(&forest), vec![(1, 0)]);
        assert_eq!(forest.orphans().len(), 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let forest = CommentForest::build(vec![comment(1, 2), comment(2, 1), comment(3, 0)]);
        assert_eq!(order(&forest), vec![(3, 0)]);
        assert_eq!(forest.orphans().len(), 2);
    }

    #[test]
    fn test_duplicate_id_under_itself_is_truncated() {
        // A second record reusing id 1 and replying to 1 would otherwise
        // re-enter the children of 1 forever.
        let forest = CommentForest::build(vec![comment(1, 0), comment(1, 1), comment(2, 1)]);
        assert_eq!(order(&forest), vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn test_zero_id_comment_does_not_recurse() {
        let forest = CommentForest::build(vec![comment(0, 0), comment(1, 0)]);
        assert_eq!(order(&forest), vec![(1, 0)]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let forest = CommentForest::build(vec![comment(1, 0), comment(2, 1)]);
        let first = order(&forest);
        let second: Vec<_> = (&forest)
            .into_iter()
            .map(|t| (t.comment.comment_id, t.depth))
            .collect();
        assert_eq!(first, second);
    }
}
