//! Arena-backed search tree.
//!
//! Nodes live in one `Vec` and refer to each other by index. A node's parent link is a plain
//! index used to walk back towards the root, so the tree owns no cycles and is dropped in one
//! piece when the search ends. Identical states reached along different paths stay separate
//! nodes.

use crate::error::{Result, SolverError};
use crate::pool::Evaluator;
use crate::rotation::Rotation;
use crate::state::PuzzleState;
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Index of a node in its tree's arena.
pub type NodeId = usize;

/// Reward of the solved state, the largest reward there is.
pub const SOLVED_REWARD: f64 = 1.0;

/// One state in the search tree with its reward bookkeeping.
#[derive(typed_builder::TypedBuilder, Clone, Debug)]
pub struct SearchNode {
    /// Exclusive copy of the state this node stands for.
    state: PuzzleState,

    /// The node this one was expanded from. None at the root.
    #[builder(default = None)]
    parent: Option<NodeId>,

    /// The rotation that turned the parent's state into this one.
    #[builder(default = None)]
    action: Option<Rotation>,

    /// Rotations from the root.
    #[builder(default = 0)]
    depth: usize,

    /// Rotations this node may expand into: every rotation not on `action`'s face.
    possible_actions: Vec<Rotation>,

    /// Arena indices of the children, empty until expanded.
    #[builder(default)]
    children: Vec<NodeId>,

    /// Heuristic reward of this node's own state. Zero until evaluated.
    #[builder(default = 0.0)]
    reward: f64,

    /// Largest reward seen anywhere in this subtree.
    #[builder(default = 0.0)]
    best_reward: f64,

    /// Backpropagation passes through this node, plus one so visit weighting never divides by
    /// zero.
    #[builder(default = 1)]
    visit_count: u64,
}

impl SearchNode {
    /// The state at this node.
    #[must_use]
    pub fn state(&self) -> &PuzzleState {
        &self.state
    }

    /// Parent index, None at the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The rotation that produced this node, None at the root.
    #[must_use]
    pub fn action(&self) -> Option<Rotation> {
        self.action
    }

    /// Distance from the root in rotations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Rotations this node expands into.
    #[must_use]
    pub fn possible_actions(&self) -> &[Rotation] {
        &self.possible_actions
    }

    /// Child indices, in `possible_actions` order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Reward of this node's own state.
    #[must_use]
    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// Largest reward seen in this subtree.
    #[must_use]
    pub fn best_reward(&self) -> f64 {
        self.best_reward
    }

    /// Times this node sat on a backpropagation path, plus one.
    #[must_use]
    pub fn visit_count(&self) -> u64 {
        self.visit_count
    }
}

/// A search tree rooted at one scrambled state.
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    expansions: usize,
}

impl SearchTree {
    /// A tree holding only |root|, with the root's reward computed by |evaluator|.
    #[must_use]
    pub fn new(root: PuzzleState, evaluator: &Evaluator) -> SearchTree {
        let reward = evaluator.reward(&root);
        let possible_actions = Rotation::possible_after(None);
        let node = SearchNode::builder()
            .state(root)
            .possible_actions(possible_actions)
            .reward(reward)
            .best_reward(reward)
            .build();
        SearchTree {
            nodes: vec![node],
            expansions: 0,
        }
    }

    /// Index of the root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        0
    }

    /// The node at |id|.
    ///
    /// # Panics
    /// If |id| was not handed out by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }

    /// Total nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node's distance from the root.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// How many times `expand` has succeeded.
    #[must_use]
    pub fn expansions(&self) -> usize {
        self.expansions
    }

    /// Best reward found anywhere in the tree.
    #[must_use]
    pub fn best_reward(&self) -> f64 {
        self.nodes[self.root()].best_reward
    }

    /// True iff the node's state is solved.
    #[must_use]
    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.nodes[id].state.is_solved()
    }

    /// True once every possible action has a child.
    #[must_use]
    pub fn is_fully_expanded(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.children.len() == node.possible_actions.len()
    }

    /// Creates one child per possible action of |id| in a single batch. Children start
    /// unevaluated; `rollout` scores them.
    ///
    /// # Errors
    /// `IllegalExpansion` if the node is terminal or already expanded.
    pub fn expand(&mut self, id: NodeId) -> Result<()> {
        if self.is_terminal(id) || self.is_fully_expanded(id) {
            return Err(SolverError::IllegalExpansion { node: id });
        }
        let parent = &self.nodes[id];
        let depth = parent.depth + 1;
        let children: Vec<SearchNode> = parent
            .possible_actions
            .iter()
            .map(|action| {
                SearchNode::builder()
                    .state(parent.state.apply_rotation(*action))
                    .parent(Some(id))
                    .action(Some(*action))
                    .depth(depth)
                    .possible_actions(Rotation::possible_after(Some(*action)))
                    .build()
            })
            .collect();

        let first = self.nodes.len();
        self.nodes.extend(children);
        self.nodes[id].children = (first..self.nodes.len()).collect();
        self.expansions += 1;
        debug!(
            "expanded node {id} at depth {} into {} children",
            depth - 1,
            self.nodes.len() - first
        );
        Ok(())
    }

    /// Picks a child of |id|. With |explore_param| zero this is the child with the largest
    /// `best_reward`, first one on ties. Otherwise children are sampled from a softmax over
    /// `best_reward` with |explore_param| as the temperature.
    ///
    /// # Errors
    /// `IllegalSelection` if the node has no children.
    pub fn best_child<R: Rng + ?Sized>(
        &self,
        id: NodeId,
        explore_param: f64,
        rng: &mut R,
    ) -> Result<NodeId> {
        if explore_param <= 0.0 {
            return self.greedy_child(id);
        }
        let children = &self.nodes[id].children;
        if children.is_empty() {
            return Err(SolverError::IllegalSelection { node: id });
        }
        let rewards: Vec<f64> = children.iter().map(|c| self.nodes[*c].best_reward).collect();
        // Shift by the largest reward so the exponentials cannot overflow.
        let max = rewards.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = rewards
            .iter()
            .map(|r| ((r - max) / explore_param).exp())
            .collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => Ok(children[dist.sample(rng)]),
            // Only reachable with non-finite rewards; fall back to exploitation.
            Err(_) => self.greedy_child(id),
        }
    }

    /// `best_child` with no exploration.
    ///
    /// # Errors
    /// `IllegalSelection` if the node has no children.
    pub fn greedy_child(&self, id: NodeId) -> Result<NodeId> {
        let mut best: Option<NodeId> = None;
        for child in &self.nodes[id].children {
            match best {
                Some(b) if self.nodes[*child].best_reward <= self.nodes[b].best_reward => {}
                _ => best = Some(*child),
            }
        }
        best.ok_or(SolverError::IllegalSelection { node: id })
    }

    /// Descends from the root through fully expanded nodes via `best_child`, then expands the
    /// first node that is not fully expanded and returns it.
    ///
    /// # Errors
    /// `IllegalExpansion` if the descent ends on a terminal node.
    pub fn tree_policy<R: Rng + ?Sized>(
        &mut self,
        explore_param: f64,
        rng: &mut R,
    ) -> Result<NodeId> {
        let mut current = self.root();
        while self.is_fully_expanded(current) {
            current = self.best_child(current, explore_param, rng)?;
        }
        self.expand(current)?;
        Ok(current)
    }

    /// One-ply lookahead: scores every child of |id|, records each score as the child's reward
    /// and best reward, and returns the best child's reward.
    ///
    /// # Errors
    /// `IllegalSelection` if the node has no children, `SearchAborted` if evaluation fails.
    pub fn rollout(&mut self, id: NodeId, evaluator: &Evaluator) -> Result<f64> {
        if self.nodes[id].children.is_empty() {
            return Err(SolverError::IllegalSelection { node: id });
        }
        let actions: Vec<Rotation> = self.nodes[id]
            .children
            .iter()
            .filter_map(|c| self.nodes[*c].action)
            .collect();
        let rewards = evaluator.rewards(&self.nodes[id].state, &actions)?;
        let children = self.nodes[id].children.clone();
        for (child, reward) in children.into_iter().zip(rewards) {
            let node = &mut self.nodes[child];
            node.reward = reward;
            node.best_reward = node.best_reward.max(reward);
        }
        let best = self.greedy_child(id)?;
        Ok(self.nodes[best].best_reward)
    }

    /// `rollout` of |id|, then repeatedly expands and rolls out the greedy best child, for at
    /// most |depth| plies in total. Stops early once a solved child turns up or the best child
    /// cannot be expanded. Returns the last node rolled out and the reward of its best child.
    ///
    /// # Errors
    /// As `rollout` and `expand`.
    pub fn deep_rollout(
        &mut self,
        id: NodeId,
        depth: usize,
        evaluator: &Evaluator,
    ) -> Result<(NodeId, f64)> {
        let mut leaf = id;
        let mut reward = self.rollout(leaf, evaluator)?;
        for _ in 1..depth {
            if reward >= SOLVED_REWARD {
                break;
            }
            let next = self.greedy_child(leaf)?;
            if self.is_terminal(next) || !self.nodes[next].children.is_empty() {
                break;
            }
            self.expand(next)?;
            reward = self.rollout(next, evaluator)?;
            leaf = next;
        }
        Ok((leaf, reward))
    }

    /// Walks from |id| to the root. Every node on the way gets one more visit and keeps the
    /// larger of its best reward and the value coming up from below; that best reward is what
    /// moves on to the parent. Returns the root's best reward.
    pub fn backpropagate(&mut self, id: NodeId, reward: f64) -> f64 {
        let mut current = Some(id);
        let mut value = reward;
        while let Some(i) = current {
            let node = &mut self.nodes[i];
            node.visit_count = node.visit_count.saturating_add(1);
            if value > node.best_reward {
                node.best_reward = value;
            }
            value = node.best_reward;
            current = node.parent;
        }
        value
    }

    /// Follows greedy children from the root until a terminal node or a leaf, collecting the
    /// rotations taken. The path ends on a solved state iff the search succeeded.
    #[must_use]
    pub fn solve_path(&self) -> Vec<Rotation> {
        let mut path = Vec::new();
        let mut current = self.root();
        while !self.is_terminal(current) {
            let Ok(next) = self.greedy_child(current) else {
                break;
            };
            if let Some(action) = self.nodes[next].action {
                path.push(action);
            }
            current = next;
        }
        path
    }
}
