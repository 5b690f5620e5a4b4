use super::*;

pub(crate) const PROTOCOL_ID: [u8; 3] = *b"ord";

/// Maximum bytes carried by a single content piece.
pub(crate) const MAX_CHUNK_LEN: usize = 240;

/// Maximum serialized length of the partial script carried by one
/// transaction.
pub(crate) const MAX_PAYLOAD_LEN: usize = 1500;

/// Hard cap on inscription bodies, one hundred full pieces.
pub(crate) const MAX_INSCRIPTION_LEN: usize = MAX_CHUNK_LEN * 100;

/// An inscription: a content type and a body, split into pieces of at most
/// `MAX_CHUNK_LEN` bytes on the wire. Each piece is paired with a descending
/// countdown index so a reader walking the transaction chain can detect when
/// the payload continues in another transaction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Envelope {
  pub(crate) content_type: String,
  pub(crate) body: Vec<u8>,
}

impl Envelope {
  pub(crate) fn new(content_type: impl Into<String>, body: Vec<u8>) -> Result<Self> {
    let content_type = content_type.into();

    ensure!(!body.is_empty(), "no data to inscribe");

    ensure!(
      body.len() <= MAX_INSCRIPTION_LEN,
      "inscription body of {} bytes exceeds maximum of {MAX_INSCRIPTION_LEN} bytes",
      body.len(),
    );

    ensure!(
      content_type.len() <= MAX_SCRIPT_ELEMENT_SIZE,
      "content type of {} bytes exceeds maximum of {MAX_SCRIPT_ELEMENT_SIZE} bytes",
      content_type.len(),
    );

    Ok(Self { content_type, body })
  }

  fn pieces(&self) -> Vec<&[u8]> {
    self.body.chunks(MAX_CHUNK_LEN).collect()
  }

  /// The envelope chunk sequence: the protocol marker standing alone,
  /// followed by pairs. The first pair is the piece count and content type,
  /// every later pair is a countdown index and a piece.
  fn chunks(&self) -> Result<(Chunk, VecDeque<(Chunk, Chunk)>)> {
    let pieces = self.pieces();

    let marker = Chunk::push(PROTOCOL_ID)?;

    let mut pairs = VecDeque::with_capacity(pieces.len() + 1);

    pairs.push_back((
      Chunk::small_int(pieces.len().try_into()?),
      Chunk::push(self.content_type.as_bytes().to_vec())?,
    ));

    for (i, piece) in pieces.iter().enumerate() {
      pairs.push_back((
        Chunk::small_int((pieces.len() - 1 - i).try_into()?),
        Chunk::push(piece.to_vec())?,
      ));
    }

    Ok((marker, pairs))
  }

  /// Splits the envelope into payload-bounded partial scripts. Pairs are
  /// accumulated greedily; a pair that pushes a partial past
  /// `MAX_PAYLOAD_LEN` is returned to the front of the queue for the next
  /// partial. Only the first partial carries the bare marker chunk.
  pub(crate) fn partials(&self) -> Result<Vec<ChunkedScript>> {
    let (marker, mut pairs) = self.chunks()?;

    let mut marker = Some(marker);
    let mut partials = Vec::new();

    while marker.is_some() || !pairs.is_empty() {
      let mut partial = ChunkedScript::new();

      if let Some(marker) = marker.take() {
        partial.push_back(marker);
      }

      while partial.serialized_len() <= MAX_PAYLOAD_LEN {
        let Some((index, data)) = pairs.pop_front() else {
          break;
        };
        partial.push_back(index);
        partial.push_back(data);
      }

      if partial.serialized_len() > MAX_PAYLOAD_LEN {
        if let (Some(data), Some(index)) = (partial.pop_back(), partial.pop_back()) {
          pairs.push_front((index, data));
        }
      }

      partials.push(partial);
    }

    Ok(partials)
  }
}
