/// A constant size cyclic buffer structure that allows appending and reading data,
/// but doesn't delete it, just lets the writer overwrite it.
#[derive(Debug, Clone)]
pub struct CyclicBuffer<T: Copy + Default> {
    buf: Vec<T>,

    /// The wrapping position in the buffer. The buffer index is calculated as `pos % buf.len()`.
    pos: u64,
}

impl<T: Copy + Default> CyclicBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);

        Self {
            buf: vec![T::default(); capacity],
            pos: 0,
        }
    }

    /// Total number of elements ever pushed.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Number of elements that can currently be read back.
    pub fn capacity(&self) -> usize {
        self.pos.min(self.buf.len() as u64) as usize
    }

    #[cfg(test)]
    pub fn max_capacity(&self) -> usize {
        self.buf.len()
    }

    /// Reads an element counting backwards from the newest one, which is at offset 0.
    pub fn get_relative(&self, backwards_offset: usize) -> T {
        debug_assert!(
            backwards_offset < self.capacity(),
            "backwards_offset: {}, capacity: {}",
            backwards_offset,
            self.capacity()
        );

        self.buf[((self.pos - backwards_offset as u64 - 1) % self.buf.len() as u64) as usize]
    }

    /// The newest `backwards_offset` elements as 2 slices that are contiguous in memory.
    ///
    /// If the range doesn't wrap around the end of the buffer, the second slice is empty.
    pub fn as_slices_after(&self, backwards_offset: usize) -> (&[T], &[T]) {
        let buf = &self.buf;
        let index = (self.pos % buf.len() as u64) as usize;

        debug_assert!(
            backwards_offset <= self.capacity(),
            "backwards_offset: {}, capacity: {}",
            backwards_offset,
            self.capacity()
        );

        if backwards_offset <= index {
            (&buf[(index - backwards_offset)..index], &[])
        } else {
            (
                &buf[(buf.len() - (backwards_offset - index))..],
                &buf[..index],
            )
        }
    }

    /// Forgets every element. The storage is kept and overwritten by later pushes.
    pub fn clear(&mut self) {
        self.pos = 0;
    }

    #[cfg(test)]
    pub fn push(&mut self, val: T) {
        let index = (self.pos % self.buf.len() as u64) as usize;
        self.buf[index] = val;
        self.pos += 1;
    }

    pub fn push_slice(&mut self, val: &[T]) {
        let mut index = (self.pos % self.buf.len() as u64) as usize;
        let mut written = 0;
        while written < val.len() {
            let distance_to_end = self.buf.len() - index;
            let to_write = distance_to_end.min(val.len() - written);

            self.buf[index..(index + to_write)]
                .copy_from_slice(&val[written..(written + to_write)]);
            written += to_write;
            index = (index + to_write) % self.buf.len();
        }

        self.pos += val.len() as u64;
    }
}
