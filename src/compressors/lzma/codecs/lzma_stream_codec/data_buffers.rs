use self::cyclic_buffer::CyclicBuffer;

mod cyclic_buffer;

/// The sliding window the encoder reads from.
///
/// It holds up to `dict_size` bytes of history behind the encode position, and up to
/// `max_forwards_bytes` of appended but not yet encoded bytes ahead of it.
///
/// Distances are zero based: distance 0 is the byte right before the encode position.
#[derive(Debug, Clone)]
pub struct EncoderDataBuffer {
    compress_pos: u64,
    max_forwards_bytes: u32,
    dict_size: u32,
    buf: CyclicBuffer<u8>,
}

impl EncoderDataBuffer {
    pub fn new(dict_size: u32, max_forwards_bytes: u32) -> Self {
        // max_forwards_bytes is the number of extra bytes that should be stored on top of the dict_size.
        // It is used to find matches, so the minimum forward_bytes should be the maximum match size.
        // However, bigger max_forwards_bytes means less data copying is needed so it may be faster.
        Self {
            buf: CyclicBuffer::new(dict_size as usize + max_forwards_bytes as usize),
            compress_pos: 0,
            max_forwards_bytes,
            dict_size,
        }
    }

    /// Drops all history and buffered bytes, moving the encode position back to 0.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.compress_pos = 0;
    }

    /// The number of bytes ahead that are currently in the buffer
    pub fn forwards_bytes(&self) -> usize {
        (self.buf.pos() - self.compress_pos) as usize
    }

    /// The number of bytes behind the encode position that matches may refer to.
    pub fn history_len(&self) -> u32 {
        self.compress_pos.min(self.dict_size as u64) as u32
    }

    /// True until the first byte has been consumed, i.e. while there is no history at all.
    pub fn is_empty(&self) -> bool {
        self.compress_pos == 0
    }

    pub fn pos(&self) -> u64 {
        self.compress_pos
    }

    /// The number of free bytes that could safely be appended without overwriting the dictionary
    pub fn available_append_bytes(&self) -> usize {
        self.max_forwards_bytes as usize - self.forwards_bytes()
    }

    /// Appends as much of `input` as fits, returning how many bytes were taken.
    pub fn append_data(&mut self, input: &[u8]) -> usize {
        let accepted = input.len().min(self.available_append_bytes());
        self.buf.push_slice(&input[..accepted]);
        accepted
    }

    pub fn skip(&mut self, len: u32) {
        debug_assert!(
            len as usize <= self.forwards_bytes(),
            "len: {}, forwards_bytes(): {}",
            len,
            self.forwards_bytes()
        );

        self.compress_pos += len as u64;
    }

    #[cfg(test)]
    pub fn increment_pos(&mut self) {
        self.skip(1);
    }

    /// Get the byte `offset` bytes ahead of the encode position. 0 is the next byte to encode.
    pub fn get_byte(&self, offset: u32) -> u8 {
        debug_assert!((offset as usize) < self.forwards_bytes());
        self.buf
            .get_relative(self.forwards_bytes() - offset as usize - 1)
    }

    /// Get the byte at `distance` behind the encode position. 0 is the last encoded byte.
    pub fn get_history_byte(&self, distance: u32) -> u8 {
        debug_assert!(
            distance < self.history_len(),
            "distance: {}, history_len(): {}",
            distance,
            self.history_len()
        );
        self.buf
            .get_relative(self.forwards_bytes() + distance as usize)
    }

    /// The last encoded byte, or 0 at the start of the stream.
    pub fn prev_byte(&self) -> u8 {
        if self.is_empty() {
            0
        } else {
            self.get_history_byte(0)
        }
    }

    /// How many bytes from the encode position on repeat the bytes at `distance`, starting the
    /// comparison at `start_len` and stopping at `max_len` or the end of the buffered data.
    pub fn get_match_length(&self, start_len: u32, distance: u32, max_len: u32) -> u32 {
        debug_assert!(distance < self.history_len());

        // The below code is equivalent to
        //
        // ```
        // let mut len = start_len;
        // while len < max_len && self.get_byte(len) == self.get_byte_behind(distance, len) {
        //     len += 1;
        // }
        // len
        // ```
        //
        // Except it loops over slices directly, making this much more auto-SIMD friendly

        let max_len = max_len.min(self.forwards_bytes() as u32);
        if start_len >= max_len {
            return max_len;
        }

        let mut len = start_len;

        let ahead = self.forwards_bytes() - start_len as usize;
        let behind = ahead + distance as usize + 1;

        let src = self.buf.as_slices_after(ahead);
        let dst = self.buf.as_slices_after(behind);

        let (src, dst) = align_slices(src, dst);

        'outer: for i in 0..3 {
            let src = src[i];
            let dst = dst[i];

            let mut j = 0;
            let max = (max_len - len).min(src.len() as u32).min(dst.len() as u32);

            while j < max as usize {
                if src[j] != dst[j] {
                    len += j as u32;
                    break 'outer;
                }

                j += 1;
            }

            len += j as u32;
        }

        len
    }
}

/// Given two pairs of slices, split and align them both into [&[T]; 3] each so that
/// the first two slices are the same length and the last slice is the remainder.
///
/// This is useful for quickly checking matches on contiguous bytes in memory.
fn align_slices<'a, T>(
    mut left: (&'a [T], &'a [T]),
    mut right: (&'a [T], &'a [T]),
) -> ([&'a [T]; 3], [&'a [T]; 3]) {
    // Let's assume that the left one is always smaller for the below code to work
    if left.0.len() > right.0.len() {
        std::mem::swap(&mut left, &mut right);
    }

    let length_diff = right.0.len() - left.0.len();
    let length_diff = length_diff.min(left.1.len());

    let left_1 = left.0;
    let right_1 = &right.0[..left_1.len()];

    let left_2 = &left.1[..length_diff];
    let right_2 = &right.0[left_1.len()..];

    let left_3 = &left.1[length_diff..];
    let right_3 = right.1;

    let left = [left_1, left_2, left_3];
    let right = [right_1, right_2, right_3];

    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_match_length(data: &[u8], pos: usize, distance: usize, max_len: usize) -> u32 {
        let mut len = 0;
        while len < max_len
            && pos + len < data.len()
            && data[pos + len] == data[pos + len - distance - 1]
        {
            len += 1;
        }
        len as u32
    }

    #[test]
    fn test_align_slices() {
        let left = (&[1, 2, 3][..], &[4, 5, 6, 7][..]);
        let right = (&[8, 9, 10, 11][..], &[12, 13, 14][..]);

        let (left, right) = align_slices(left, right);

        assert_eq!(left[0], &[1, 2, 3][..]);
        assert_eq!(left[1], &[4][..]);
        assert_eq!(left[2], &[5, 6, 7][..]);

        assert_eq!(right[0], &[8, 9, 10][..]);
        assert_eq!(right[1], &[11][..]);
        assert_eq!(right[2], &[12, 13, 14][..]);
    }

    #[test]
    fn test_align_slices_left_longer() {
        let left = (&[1, 2, 3][..], &[4, 5, 6, 7, 8, 9][..]);
        let right = (&[8, 9, 10, 11][..], &[12][..]);

        let (left, right) = align_slices(right, left);

        assert_eq!(left[0], &[1, 2, 3][..]);
        assert_eq!(left[1], &[4][..]);
        assert_eq!(left[2], &[5, 6, 7, 8, 9][..]);

        assert_eq!(right[0], &[8, 9, 10][..]);
        assert_eq!(right[1], &[11][..]);
        assert_eq!(right[2], &[12][..]);
    }

    #[test]
    fn test_align_slices_left_empty() {
        let left = (&[][..], &[][..]);
        let right = (&[1, 2][..], &[3, 4][..]);

        let (left, right) = align_slices(right, left);

        assert_eq!(left[0], &[][..]);
        assert_eq!(left[1], &[][..]);
        assert_eq!(left[2], &[][..]);

        assert_eq!(right[0], &[][..]);
        assert_eq!(right[1], &[1, 2][..]);
        assert_eq!(right[2], &[3, 4][..]);
    }

    #[test]
    fn test_append_is_bounded() {
        let mut buffer = EncoderDataBuffer::new(8, 4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.append_data(b"abcdef"), 4);
        assert_eq!(buffer.forwards_bytes(), 4);
        assert_eq!(buffer.append_data(b"ef"), 0);

        buffer.skip(3);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.history_len(), 3);
        assert_eq!(buffer.append_data(b"efgh"), 3);
    }

    #[test]
    fn test_bytes_ahead_and_behind() {
        let mut buffer = EncoderDataBuffer::new(4, 4);
        buffer.append_data(b"abcd");
        assert_eq!(buffer.prev_byte(), 0);
        assert_eq!(buffer.get_byte(0), b'a');
        assert_eq!(buffer.get_byte(3), b'd');

        buffer.skip(3);
        buffer.append_data(b"efg");
        assert_eq!(buffer.get_byte(0), b'd');
        assert_eq!(buffer.prev_byte(), b'c');
        assert_eq!(buffer.get_history_byte(2), b'a');

        buffer.skip(4);
        buffer.append_data(b"hijk");
        assert_eq!(buffer.pos(), 7);
        // Only dict_size bytes of history remain reachable
        assert_eq!(buffer.history_len(), 4);
        assert_eq!(buffer.get_history_byte(3), b'd');
        assert_eq!(buffer.get_byte(3), b'k');
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut buffer = EncoderDataBuffer::new(4, 4);
        buffer.append_data(b"abcd");
        buffer.skip(2);

        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.forwards_bytes(), 0);
        assert_eq!(buffer.history_len(), 0);
        assert_eq!(buffer.prev_byte(), 0);

        assert_eq!(buffer.append_data(b"wxyz!"), 4);
        assert_eq!(buffer.get_byte(0), b'w');
    }

    #[test]
    fn test_match_length_across_wraparound() {
        let data: Vec<u8> = b"abcabcabcxabcabcabcabcy".to_vec();

        let mut buffer = EncoderDataBuffer::new(6, 5);
        let mut fed = 0;
        for pos in 0..data.len() {
            fed += buffer.append_data(&data[fed..]);

            for distance in 0..buffer.history_len() as usize {
                for start_len in [0, 1] {
                    // A non-zero start_len promises the first bytes already match
                    let expected = naive_match_length(&data[..fed], pos, distance, 273);
                    if expected < start_len {
                        continue;
                    }
                    assert_eq!(
                        buffer.get_match_length(start_len, distance as u32, 273),
                        expected,
                        "pos {} distance {} start_len {}",
                        pos,
                        distance,
                        start_len
                    );
                }
            }

            buffer.increment_pos();
        }
    }
}
