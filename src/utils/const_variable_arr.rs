/// A fixed capacity array of which only the first `len` elements are in use.
///
/// Per pos_state tables are sized by `pb` at runtime but never exceed 16 entries, so they
/// can live inline instead of behind a `Vec`.
#[derive(Debug, Clone)]
pub struct ConstVariableArr<T, const MAX_LEN: usize> {
    arr: [T; MAX_LEN],
    len: usize,
}

impl<T, const MAX_LEN: usize> ConstVariableArr<T, MAX_LEN> {
    /// Fills every slot with clones of `val`, exposing the first `len` of them.
    pub fn new(val: T, len: usize) -> Self
    where
        T: Clone,
    {
        debug_assert!(len <= MAX_LEN);

        Self {
            arr: array_macro::array![val; MAX_LEN],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

impl<T, const MAX_LEN: usize> std::ops::Index<usize> for ConstVariableArr<T, MAX_LEN> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.arr[..self.len][index]
    }
}

impl<T, const MAX_LEN: usize> std::ops::IndexMut<usize> for ConstVariableArr<T, MAX_LEN> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.arr[..self.len][index]
    }
}
