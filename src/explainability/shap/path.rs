//! Decision path bookkeeping for TreeSHAP.
//!
//! A path holds one element per split feature seen from the root to the
//! current node. Each element carries the fraction of "zero" paths (feature
//! absent, weighted by cover) and "one" paths (feature present, follows the
//! explained row) flowing through it, plus the permutation weight used to
//! combine subsets of every size.

/// One unique feature on the current root-to-node path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathElement {
    /// Feature index, `None` for the root sentinel.
    pub feature: Option<usize>,
    /// Fraction of zero paths (cover-weighted).
    pub zero_fraction: f64,
    /// Fraction of one paths (0 or 1).
    pub one_fraction: f64,
    /// Permutation weight.
    pub pweight: f64,
}

/// Path state carried down one recursion of TreeSHAP.
#[derive(Clone, Debug, Default)]
pub struct PathState {
    elements: Vec<PathElement>,
}

impl PathState {
    pub fn with_capacity(max_depth: usize) -> Self {
        Self {
            elements: Vec::with_capacity(max_depth + 2),
        }
    }

    /// Number of elements, including the root sentinel.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn element(&self, i: usize) -> &PathElement {
        &self.elements[i]
    }

    /// Index of `feature` on the path, skipping the root sentinel.
    pub fn position(&self, feature: usize) -> Option<usize> {
        self.elements
            .iter()
            .skip(1)
            .position(|e| e.feature == Some(feature))
            .map(|i| i + 1)
    }

    /// Append a feature and update permutation weights.
    pub fn extend(&mut self, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
        let depth = self.elements.len();
        self.elements.push(PathElement {
            feature,
            zero_fraction,
            one_fraction,
            pweight: if depth == 0 { 1.0 } else { 0.0 },
        });

        let d = depth as f64;
        for i in (0..depth).rev() {
            let w = self.elements[i].pweight;
            self.elements[i + 1].pweight += one_fraction * w * (i as f64 + 1.0) / (d + 1.0);
            self.elements[i].pweight = zero_fraction * w * (d - i as f64) / (d + 1.0);
        }
    }

    /// Remove element `index` and undo its effect on the weights.
    pub fn unwind(&mut self, index: usize) {
        let depth = self.elements.len() - 1;
        let d = depth as f64;
        let PathElement {
            zero_fraction,
            one_fraction,
            ..
        } = self.elements[index];

        let mut next_one = self.elements[depth].pweight;
        for i in (0..depth).rev() {
            if one_fraction != 0.0 {
                let tmp = self.elements[i].pweight;
                self.elements[i].pweight = next_one * (d + 1.0) / ((i as f64 + 1.0) * one_fraction);
                next_one = tmp - self.elements[i].pweight * zero_fraction * (d - i as f64) / (d + 1.0);
            } else {
                self.elements[i].pweight =
                    self.elements[i].pweight * (d + 1.0) / (zero_fraction * (d - i as f64));
            }
        }

        for i in index..depth {
            self.elements[i].feature = self.elements[i + 1].feature;
            self.elements[i].zero_fraction = self.elements[i + 1].zero_fraction;
            self.elements[i].one_fraction = self.elements[i + 1].one_fraction;
        }
        self.elements.pop();
    }

    /// Total permutation weight if element `index` were unwound.
    pub fn unwound_sum(&self, index: usize) -> f64 {
        let depth = self.elements.len() - 1;
        let d = depth as f64;
        let PathElement {
            zero_fraction,
            one_fraction,
            ..
        } = self.elements[index];

        let mut total = 0.0;
        if one_fraction != 0.0 {
            let mut next_one = self.elements[depth].pweight;
            for i in (0..depth).rev() {
                let tmp = next_one / ((i as f64 + 1.0) * one_fraction);
                total += tmp;
                next_one = self.elements[i].pweight - tmp * zero_fraction * (d - i as f64);
            }
        } else {
            for i in (0..depth).rev() {
                total += self.elements[i].pweight / (zero_fraction * (d - i as f64));
            }
        }
        total * (d + 1.0)
    }
}
