//! In-memory k-d tree construction.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::kd_writer::write_kd_tree;
use crate::errors::IndexResult;
use crate::keyed_object::{KeyedObject, KeyedObjects};

/// A node of the in-memory k-d tree.
///
/// The node owns both children. Internal nodes split on
/// `dimension = level % N`; everything on the left sorts before the pivot on
/// that dimension and everything on the right sorts after it.
///
/// Children are attached only through [`KdNode::new`], so the cached
/// subtree size always matches the subtree.
#[derive(Debug)]
pub struct KdNode<const N: usize> {
    dimension: usize,
    pivot: KeyedObject<N>,
    left: Option<Box<KdNode<N>>>,
    right: Option<Box<KdNode<N>>>,
    /// Nodes in the subtree rooted here, this node included.
    len: usize,
}

impl<const N: usize> KdNode<N> {
    pub fn new(
        dimension: usize,
        pivot: KeyedObject<N>,
        left: Option<Box<KdNode<N>>>,
        right: Option<Box<KdNode<N>>>,
    ) -> Self {
        let len = 1
            + left.as_ref().map_or(0, |node| node.len)
            + right.as_ref().map_or(0, |node| node.len);
        Self {
            dimension,
            pivot,
            left,
            right,
            len,
        }
    }

    pub fn leaf(dimension: usize, pivot: KeyedObject<N>) -> Self {
        Self::new(dimension, pivot, None, None)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn pivot(&self) -> &KeyedObject<N> {
        &self.pivot
    }

    pub fn left(&self) -> Option<&KdNode<N>> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&KdNode<N>> {
        self.right.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Size of the subtree, cached when the node was built.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Height of the subtree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.left().map(|child| (child, depth + 1)));
            stack.extend(node.right().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Visits every node of the subtree in pre-order.
    pub fn preorder(&self) -> impl Iterator<Item = &KdNode<N>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Some(right) = node.right.as_deref() {
                stack.push(right);
            }
            if let Some(left) = node.left.as_deref() {
                stack.push(left);
            }
            Some(node)
        })
    }

    /// Structural equality: same pivots, split dimensions and shape.
    pub fn same_shape(&self, other: &KdNode<N>) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.dimension != b.dimension || a.pivot != b.pivot {
                return false;
            }
            for (a, b) in [(a.left(), b.left()), (a.right(), b.right())] {
                match (a, b) {
                    (None, None) => {}
                    (Some(a), Some(b)) => stack.push((a, b)),
                    _ => return false,
                }
            }
        }
        true
    }
}

impl<const N: usize> Drop for KdNode<N> {
    // Children are released with an explicit stack so that dropping a large
    // tree never recurses.
    fn drop(&mut self) {
        let mut stack: Vec<Box<KdNode<N>>> = Vec::new();
        stack.extend(self.left.take());
        stack.extend(self.right.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

/// Builds a k-d tree over `objects`, reordering the slice in place.
///
/// At every level the slice is stably sorted on `level % N` and the element
/// at `len / 2` becomes the pivot; the halves before and after it become the
/// left and right subtrees. Returns `None` for an empty slice.
pub fn build_kd_tree<const N: usize>(objects: &mut [KeyedObject<N>]) -> Option<Box<KdNode<N>>> {
    build_level(objects, 0)
}

fn build_level<const N: usize>(
    objects: &mut [KeyedObject<N>],
    level: usize,
) -> Option<Box<KdNode<N>>> {
    let dimension = level % N;
    match objects.len() {
        0 => None,
        1 => Some(Box::new(KdNode::leaf(dimension, objects[0]))),
        count => {
            objects.sort_by_key(|object| object.key[dimension]);
            let median = count / 2;
            let pivot = objects[median];
            let (left, rest) = objects.split_at_mut(median);
            let right = &mut rest[1..];
            let left = build_level(left, level + 1);
            let right = build_level(right, level + 1);
            Some(Box::new(KdNode::new(dimension, pivot, left, right)))
        }
    }
}

/// A static k-d tree, possibly empty.
#[derive(Debug)]
pub struct KdTree<const N: usize> {
    root: Option<Box<KdNode<N>>>,
}

impl<const N: usize> KdTree<N> {
    /// Builds the tree; see [`build_kd_tree`].
    pub fn build(objects: &mut [KeyedObject<N>]) -> Self {
        Self {
            root: build_kd_tree(objects),
        }
    }

    /// Builds the tree from a collector, consuming it.
    pub fn from_objects(objects: KeyedObjects<N>) -> Self {
        let mut values = objects.into_vec();
        Self::build(&mut values)
    }

    pub fn from_root(root: Option<Box<KdNode<N>>>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&KdNode<N>> {
        self.root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.len())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.depth())
    }

    /// Pivots of all nodes in pre-order, i.e. in file order.
    pub fn objects(&self) -> impl Iterator<Item = &KeyedObject<N>> {
        self.root
            .as_deref()
            .into_iter()
            .flat_map(|root| root.preorder())
            .map(|node| &node.pivot)
    }

    /// Serializes the tree; returns the number of bytes written.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> IndexResult<u64> {
        write_kd_tree(self.root(), sink)
    }

    /// Creates (or truncates) `path` and writes the tree into it.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> IndexResult<u64> {
        let path = path.as_ref();
        log::debug!("Writing {}-d index to {:?}", N, path);
        let mut sink = BufWriter::new(File::create(path)?);
        let written = self.write_to(&mut sink)?;
        sink.flush()?;
        Ok(written)
    }

    /// Whether both trees have the same pivots in the same places.
    pub fn same_shape(&self, other: &KdTree<N>) -> bool {
        match (self.root(), other.root()) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_shape(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn random_objects<const N: usize>(count: usize, spread: i32, seed: u64) -> Vec<KeyedObject<N>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                let mut key = [0i32; N];
                for value in key.iter_mut() {
                    *value = rng.gen_range(-spread..=spread);
                }
                KeyedObject::new(key, 0, 18, i as u32)
            })
            .collect()
    }

    fn check_ordering<const N: usize>(node: &KdNode<N>) {
        let d = node.dimension();
        let pivot = node.pivot().key[d];
        if let Some(left) = node.left() {
            for descendant in left.preorder() {
                assert!(descendant.pivot().key[d] <= pivot, "left descendant above pivot");
            }
            check_ordering(left);
        }
        if let Some(right) = node.right() {
            for descendant in right.preorder() {
                assert!(descendant.pivot().key[d] >= pivot, "right descendant below pivot");
            }
            check_ordering(right);
        }
    }

    #[test]
    fn test_empty_input() {
        let mut objects: Vec<KeyedObject<2>> = Vec::new();
        assert!(build_kd_tree(&mut objects).is_none());
        let tree = KdTree::build(&mut objects);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn test_single_object_is_leaf() {
        let mut objects = vec![KeyedObject::new([4, 2], 1, 2, 3)];
        let root = build_kd_tree(&mut objects).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.dimension(), 0);
        assert_eq!(*root.pivot(), objects[0]);
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn test_three_points_pivot_is_median_on_x() {
        let mut objects = vec![
            KeyedObject::new([0, 0], 0, 5, 0),
            KeyedObject::new([10, 10], 0, 5, 1),
            KeyedObject::new([5, 5], 0, 5, 2),
        ];
        let tree = KdTree::build(&mut objects);
        let root = tree.root().unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(root.pivot().offset, 2);
        assert_eq!(root.left().unwrap().pivot().offset, 0);
        assert_eq!(root.right().unwrap().pivot().offset, 1);
        assert_eq!(root.left().unwrap().dimension(), 1);
    }

    #[test]
    fn test_input_slice_is_reordered_not_changed() {
        let original = random_objects::<2>(50, 100, 7);
        let mut objects = original.clone();
        let _ = build_kd_tree(&mut objects);
        let mut a: Vec<u32> = original.iter().map(|o| o.offset).collect();
        let mut b: Vec<u32> = objects.iter().map(|o| o.offset).collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_object_appears_once() {
        for count in [1usize, 2, 3, 7, 64, 1000] {
            let mut objects = random_objects::<4>(count, 1_000, count as u64);
            let tree = KdTree::build(&mut objects);
            assert_eq!(tree.len(), count);
            let mut offsets: Vec<u32> = tree.objects().map(|o| o.offset).collect();
            assert_eq!(offsets.len(), count);
            offsets.sort_unstable();
            assert_eq!(offsets, (0..count as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_split_ordering_holds() {
        let mut points = random_objects::<2>(500, 50, 11);
        check_ordering(KdTree::build(&mut points).root().unwrap());
        let mut boxes = random_objects::<4>(500, 50, 12);
        check_ordering(KdTree::build(&mut boxes).root().unwrap());
    }

    #[test]
    fn test_duplicate_keys_stay_ordered() {
        let mut objects: Vec<KeyedObject<2>> =
            (0..100u32).map(|i| KeyedObject::new([1, (i % 3) as i32], 0, 18, i)).collect();
        let tree = KdTree::build(&mut objects);
        assert_eq!(tree.len(), 100);
        check_ordering(tree.root().unwrap());
    }

    #[test]
    fn test_depth_is_logarithmic() {
        let mut objects = random_objects::<2>(1024, 10_000, 3);
        let tree = KdTree::build(&mut objects);
        // ceil(log2(1025))
        assert!(tree.depth() <= 11, "depth {}", tree.depth());
    }

    #[test]
    fn test_dimensions_cycle() {
        let mut objects = random_objects::<4>(31, 100, 5);
        let tree = KdTree::build(&mut objects);
        let root = tree.root().unwrap();
        assert_eq!(root.dimension(), 0);
        let mut node = root;
        let mut level = 0;
        while let Some(left) = node.left() {
            level += 1;
            assert_eq!(left.dimension(), level % 4);
            node = left;
        }
    }

    #[test]
    fn test_subtree_len_matches_count() {
        let mut objects = random_objects::<2>(300, 1000, 9);
        let tree = KdTree::build(&mut objects);
        for node in tree.root().unwrap().preorder() {
            assert_eq!(node.len(), node.preorder().count());
        }
    }

    #[test]
    fn test_from_objects_collector() {
        let mut collector = KeyedObjects::<2>::new();
        collector.collect([3, 3], 0, 18, 0);
        collector.collect([1, 1], 0, 18, 1);
        let tree = KdTree::from_objects(collector);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root().unwrap().pivot().offset, 0);
    }

    #[test]
    fn test_drop_large_tree() {
        let mut objects = random_objects::<2>(200_000, 1_000_000, 1);
        let tree = KdTree::build(&mut objects);
        assert_eq!(tree.len(), 200_000);
        drop(tree);
    }

    #[test]
    fn test_deep_chain_depth_and_shape() {
        // a left-only chain, far deeper than the call stack allows recursion
        let chain = |count: i32| {
            let mut node: Option<Box<KdNode<2>>> = None;
            for i in (0..count).rev() {
                let pivot = KeyedObject::new([i, i], 0, 18, i as u32);
                node = Some(Box::new(KdNode::new(0, pivot, node, None)));
            }
            KdTree::from_root(node)
        };
        let a = chain(500_000);
        let b = chain(500_000);
        assert_eq!(a.len(), 500_000);
        assert_eq!(a.depth(), 500_000);
        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&chain(499_999)));
    }

    #[test]
    fn test_assembled_node_len() {
        let left = KdNode::leaf(1, KeyedObject::new([1, 1], 0, 18, 1));
        let right = KdNode::leaf(1, KeyedObject::new([9, 9], 0, 18, 2));
        let root = KdNode::new(
            0,
            KeyedObject::new([5, 5], 0, 18, 0),
            Some(Box::new(left)),
            Some(Box::new(right)),
        );
        assert_eq!(root.len(), 3);
        assert_eq!(root.depth(), 2);
        assert_eq!(root.left().unwrap().pivot().offset, 1);
        assert_eq!(root.right().unwrap().pivot().offset, 2);
        assert!(root.left().unwrap().is_leaf());
    }

    #[test]
    fn test_same_shape() {
        let objects = random_objects::<2>(40, 100, 21);
        let a = KdTree::build(&mut objects.clone());
        let b = KdTree::build(&mut objects.clone());
        assert!(a.same_shape(&b));
        let c = KdTree::build(&mut objects[1..].to_vec());
        assert!(!a.same_shape(&c));
    }
}
