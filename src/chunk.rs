use super::*;

/// A single script element: either a bare opcode or a data push whose
/// length-prefix opcode is implied by the payload length. The variant is
/// fixed at construction, never re-inferred from numeric ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Chunk {
  Op(u8),
  Push(Vec<u8>),
}

const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_PUSHNUM_BASE: u8 = 0x50;

impl Chunk {
  pub(crate) fn push(data: impl Into<Vec<u8>>) -> Result<Self> {
    let data = data.into();

    ensure!(
      data.len() <= MAX_SCRIPT_ELEMENT_SIZE,
      "pushed element of {} bytes exceeds maximum of {MAX_SCRIPT_ELEMENT_SIZE} bytes",
      data.len(),
    );

    Ok(Self::Push(data))
  }

  pub(crate) fn op(opcode: opcodes::Opcode) -> Self {
    Self::Op(opcode.to_u8())
  }

  /// Encodes integers the way the deployed junkscription indexer expects:
  /// 0..=16 as bare opcodes, 17..=127 as a single byte push, and larger
  /// values as a two byte push of `n % 256` then `n / 256`. The two byte
  /// form is *not* the inverse of `as_small_int`, which reconstructs
  /// `high * 255 + low`; both sides are pinned to the wire format as
  /// deployed and must not be corrected independently.
  pub(crate) fn small_int(n: u32) -> Self {
    if n == 0 {
      Self::op(opcodes::OP_0)
    } else if n <= 16 {
      Self::Op(OP_PUSHNUM_BASE + u8::try_from(n).unwrap())
    } else if n < 128 {
      Self::Push(vec![u8::try_from(n).unwrap()])
    } else {
      Self::Push(vec![
        u8::try_from(n % 256).unwrap(),
        u8::try_from(n / 256 % 256).unwrap(),
      ])
    }
  }

  pub(crate) fn as_small_int(&self) -> Option<u32> {
    match self {
      Self::Op(0) => Some(0),
      Self::Op(op) if (OP_PUSHNUM_BASE + 1..=OP_PUSHNUM_BASE + 16).contains(op) => {
        Some(u32::from(op - OP_PUSHNUM_BASE))
      }
      Self::Push(data) if data.len() == 1 => Some(u32::from(data[0])),
      Self::Push(data) if data.len() == 2 => {
        Some(u32::from(data[1]) * 255 + u32::from(data[0]))
      }
      _ => None,
    }
  }

  pub(crate) fn as_push(&self) -> Option<&[u8]> {
    match self {
      Self::Push(data) => Some(data),
      Self::Op(_) => None,
    }
  }

  pub(crate) fn serialized_len(&self) -> usize {
    match self {
      Self::Op(_) => 1,
      Self::Push(data) => {
        data.len()
          + if data.len() <= 75 {
            1
          } else if data.len() <= 255 {
            2
          } else {
            3
          }
      }
    }
  }

  fn encode_into(&self, bytes: &mut Vec<u8>) {
    match self {
      Self::Op(op) => bytes.push(*op),
      Self::Push(data) => {
        if data.len() <= 75 {
          bytes.push(u8::try_from(data.len()).unwrap());
        } else if data.len() <= 255 {
          bytes.push(OP_PUSHDATA1);
          bytes.push(u8::try_from(data.len()).unwrap());
        } else {
          bytes.push(OP_PUSHDATA2);
          bytes.extend(u16::try_from(data.len()).unwrap().to_le_bytes());
        }
        bytes.extend_from_slice(data);
      }
    }
  }
}

/// An ordered chunk sequence. Construction only ever appends or removes at
/// the ends, so the chunks live in a deque rather than a shifting vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ChunkedScript(VecDeque<Chunk>);

impl ChunkedScript {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn len(&self) -> usize {
    self.0.len()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub(crate) fn push_back(&mut self, chunk: Chunk) {
    self.0.push_back(chunk);
  }

  pub(crate) fn pop_front(&mut self) -> Option<Chunk> {
    self.0.pop_front()
  }

  pub(crate) fn pop_back(&mut self) -> Option<Chunk> {
    self.0.pop_back()
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = &Chunk> {
    self.0.iter()
  }

  pub(crate) fn serialized_len(&self) -> usize {
    self.0.iter().map(Chunk::serialized_len).sum()
  }

  pub(crate) fn to_bytes(&self) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(self.serialized_len());
    for chunk in &self.0 {
      chunk.encode_into(&mut bytes);
    }
    bytes
  }

  pub(crate) fn to_script_buf(&self) -> ScriptBuf {
    ScriptBuf::from_bytes(self.to_bytes())
  }

  pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
    let mut chunks = VecDeque::new();
    let mut i = 0;

    while i < bytes.len() {
      let opcode = bytes[i];
      i += 1;

      let len = match opcode {
        1..=75 => usize::from(opcode),
        OP_PUSHDATA1 => {
          let len = usize::from(*bytes.get(i).context("truncated OP_PUSHDATA1")?);
          i += 1;
          len
        }
        OP_PUSHDATA2 => {
          let slice = bytes
            .get(i..i + 2)
            .context("truncated OP_PUSHDATA2")?
            .try_into()?;
          i += 2;
          usize::from(u16::from_le_bytes(slice))
        }
        OP_PUSHDATA4 => {
          let slice = bytes
            .get(i..i + 4)
            .context("truncated OP_PUSHDATA4")?
            .try_into()?;
          i += 4;
          usize::try_from(u32::from_le_bytes(slice))?
        }
        _ => {
          chunks.push_back(Chunk::Op(opcode));
          continue;
        }
      };

      let data = bytes
        .get(i..i + len)
        .context("script push extends past end of script")?;
      i += len;

      chunks.push_back(Chunk::Push(data.to_vec()));
    }

    Ok(Self(chunks))
  }
}

impl Extend<Chunk> for ChunkedScript {
  fn extend<T: IntoIterator<Item = Chunk>>(&mut self, iter: T) {
    self.0.extend(iter);
  }
}
