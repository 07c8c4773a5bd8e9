/// A bitset over a dense index range which additionally keeps the list of positions that were
/// set at least once, so that iteration is proportional to the number of set bits rather than
/// the universe size.
///
/// Used to track the variables whose lower bound changed since the last propagation.
#[derive(Debug, Default, Clone)]
pub struct SparseBitset {
    in_set: Vec<bool>,
    positions: Vec<usize>,
}

impl SparseBitset {
    /// Marks `index` as set; grows the universe if needed. Setting an index twice records it
    /// once.
    pub fn set(&mut self, index: usize) {
        if index >= self.in_set.len() {
            self.in_set.resize(index + 1, false);
        }
        if !self.in_set[index] {
            self.in_set[index] = true;
            self.positions.push(index);
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.in_set.len() && self.in_set[index]
    }

    /// The number of positions set at least once since the last clear.
    pub fn num_positions(&self) -> usize {
        self.positions.len()
    }

    /// The i-th position which was set, in first-set order.
    pub fn position(&self, i: usize) -> usize {
        self.positions[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    /// Unsets all positions and resizes the universe to `new_len`.
    pub fn clear_and_resize(&mut self, new_len: usize) {
        for &position in &self.positions {
            self.in_set[position] = false;
        }
        self.positions.clear();
        self.in_set.resize(new_len, false);
    }
}
