use super::{data_buffers::EncoderDataBuffer, prices::EncoderPriceCalc};

use self::match_finding::{Match, MatchFinder};

pub mod match_finding;

/// What gets coded at one position. Each kind has its own emit path in the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeInstruction {
    /// A literal after a literal, coded plainly.
    Literal,
    /// A literal after a match, coded against the byte at rep0.
    DeltaLiteral,
    /// One byte copied from rep0.
    ShortRep,
    Rep0Long { len: u32 },
    Rep1 { len: u32 },
    Rep2 { len: u32 },
    Rep3 { len: u32 },
    /// A match at a distance that isn't one of the reps.
    Fresh(Match),
}

impl EncodeInstruction {
    /// A long rep match with rep `rep_index`.
    pub fn long_rep(rep_index: usize, len: u32) -> Self {
        match rep_index {
            0 => EncodeInstruction::Rep0Long { len },
            1 => EncodeInstruction::Rep1 { len },
            2 => EncodeInstruction::Rep2 { len },
            _ => EncodeInstruction::Rep3 { len },
        }
    }

    /// Number of bytes this instruction covers.
    pub fn length(&self) -> u32 {
        match *self {
            EncodeInstruction::Literal
            | EncodeInstruction::DeltaLiteral
            | EncodeInstruction::ShortRep => 1,
            EncodeInstruction::Rep0Long { len }
            | EncodeInstruction::Rep1 { len }
            | EncodeInstruction::Rep2 { len }
            | EncodeInstruction::Rep3 { len } => len,
            EncodeInstruction::Fresh(match_) => match_.len,
        }
    }

    /// The rep register a rep instruction reads from.
    pub fn rep_index(&self) -> Option<usize> {
        match *self {
            EncodeInstruction::ShortRep | EncodeInstruction::Rep0Long { .. } => Some(0),
            EncodeInstruction::Rep1 { .. } => Some(1),
            EncodeInstruction::Rep2 { .. } => Some(2),
            EncodeInstruction::Rep3 { .. } => Some(3),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            EncodeInstruction::Literal | EncodeInstruction::DeltaLiteral
        )
    }
}

/// The sliding window together with the match finder that searches it.
pub struct LZMAEncoderInput<M: MatchFinder> {
    buffer: EncoderDataBuffer,
    match_finder: M,
}

impl<M: MatchFinder> LZMAEncoderInput<M> {
    pub fn new(match_finder: M, dict_size: u32, max_forwards_bytes: u32) -> Self {
        Self {
            buffer: EncoderDataBuffer::new(dict_size, max_forwards_bytes),
            match_finder,
        }
    }

    pub fn pos(&self) -> u64 {
        self.buffer.pos()
    }

    /// The number of free bytes that could safely be appended without overwriting the dictionary
    pub fn available_append_bytes(&self) -> usize {
        self.buffer.available_append_bytes()
    }

    /// Appends as much of `data` as fits, returning the number of bytes taken.
    pub fn append_data(&mut self, data: &[u8]) -> usize {
        self.buffer.append_data(data)
    }

    pub fn forward_bytes(&self) -> usize {
        self.buffer.forwards_bytes()
    }

    pub fn buffer(&self) -> &EncoderDataBuffer {
        &self.buffer
    }

    pub fn match_finder(&self) -> &M {
        &self.match_finder
    }

    pub fn find_match(&mut self, prices: &EncoderPriceCalc) -> Match {
        if self.buffer.forwards_bytes() == 0 {
            return Match::NONE;
        }
        self.match_finder.find_match(&self.buffer, prices)
    }

    /// Empties the window and lets the match finder drop whatever it remembers about it.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.match_finder.reset();
    }

    /// Moves the encode position forwards, letting the match finder see the skipped bytes first.
    pub fn skip(&mut self, len: u32) {
        self.match_finder.skip(&self.buffer, len);
        self.buffer.skip(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_lengths() {
        let fresh = Match {
            distance: 10,
            len: 7,
        };

        assert_eq!(EncodeInstruction::Literal.length(), 1);
        assert_eq!(EncodeInstruction::DeltaLiteral.length(), 1);
        assert_eq!(EncodeInstruction::ShortRep.length(), 1);
        assert_eq!(EncodeInstruction::Rep2 { len: 40 }.length(), 40);
        assert_eq!(EncodeInstruction::Fresh(fresh).length(), 7);
    }

    #[test]
    fn test_rep_indices() {
        for index in 0..4 {
            let instruction = EncodeInstruction::long_rep(index, 3);
            assert_eq!(instruction.rep_index(), Some(index));
            assert_eq!(instruction.length(), 3);
        }
        assert_eq!(EncodeInstruction::ShortRep.rep_index(), Some(0));
        assert_eq!(EncodeInstruction::Literal.rep_index(), None);
        assert!(EncodeInstruction::DeltaLiteral.is_literal());
        assert!(!EncodeInstruction::ShortRep.is_literal());
    }
}
