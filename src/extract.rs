use {super::*, crate::client::VerboseTransaction, crate::envelope::PROTOCOL_ID};

/// Reassembles an inscription starting from the transaction that reveals
/// its first partial script. When the payload continues beyond one
/// transaction, the walk follows the node's spent-by annotation on output
/// zero to the next reveal.
pub(crate) fn extract(node: &dyn Node, txid: Txid) -> Result<Envelope> {
  let mut tx = node.get_verbose_transaction(txid)?;
  let mut chunks = payload_chunks(&tx)?;

  ensure!(
    chunks
      .pop_front()
      .as_ref()
      .and_then(Chunk::as_push)
      .is_some_and(|data| data == PROTOCOL_ID.as_slice()),
    "transaction {txid} is not a junkscription",
  );

  let count = chunks
    .pop_front()
    .as_ref()
    .and_then(Chunk::as_small_int)
    .with_context(|| format!("junkscription {txid} has a malformed piece count"))?;

  let content_type = chunks
    .pop_front()
    .as_ref()
    .and_then(Chunk::as_push)
    .map(|data| String::from_utf8_lossy(data).into_owned())
    .with_context(|| format!("junkscription {txid} has a malformed content type"))?;

  let mut body = Vec::new();
  let mut remaining = count;

  while remaining > 0 {
    if chunks.is_empty() {
      let spent = tx
        .vout
        .first()
        .and_then(|vout| vout.spent.as_ref())
        .with_context(|| {
          format!(
            "junkscription {txid} is incomplete: output {}:0 is not yet spent",
            tx.txid
          )
        })?
        .hash;

      tx = node.get_verbose_transaction(spent)?;
      chunks = payload_chunks(&tx)?;
      continue;
    }

    let index = chunks
      .pop_front()
      .as_ref()
      .and_then(Chunk::as_small_int)
      .with_context(|| format!("junkscription {txid} has a malformed piece index"))?;

    ensure!(
      index == remaining - 1,
      "junkscription {txid} has piece index {index} where {} was expected",
      remaining - 1,
    );

    body.extend_from_slice(
      chunks
        .pop_front()
        .as_ref()
        .and_then(Chunk::as_push)
        .with_context(|| format!("junkscription {txid} has a malformed piece"))?,
    );

    remaining -= 1;
  }

  Envelope::new(content_type, body)
}

/// The payload chunks revealed by a transaction: its first input's
/// unlocking script with the trailing signature and serialized lock
/// removed.
fn payload_chunks(tx: &VerboseTransaction) -> Result<ChunkedScript> {
  let script_sig = tx
    .vin
    .first()
    .and_then(|vin| vin.script_sig.as_ref())
    .with_context(|| format!("transaction {} has no unlocking script", tx.txid))?;

  let mut chunks = ChunkedScript::from_bytes(&hex::decode(&script_sig.hex)?)?;

  chunks.pop_back();
  chunks.pop_back();

  Ok(chunks)
}

#[cfg(test)]
mod tests {
  use {
    super::*,
    crate::{
      client::{ScriptSig, SpentBy, VerboseInput, VerboseOutput},
      inscribe::inscribe,
      test_helpers::wallet_with_utxos,
    },
    pretty_assertions::assert_eq,
    std::collections::HashMap,
  };

  struct ChainNode {
    txs: HashMap<Txid, VerboseTransaction>,
  }

  impl ChainNode {
    fn new(chain: &[Transaction]) -> Self {
      let mut txs = HashMap::new();

      for (i, tx) in chain.iter().enumerate() {
        txs.insert(
          tx.compute_txid(),
          verbose(tx, chain.get(i + 1).map(Transaction::compute_txid)),
        );
      }

      Self { txs }
    }
  }

  fn verbose(tx: &Transaction, spent: Option<Txid>) -> VerboseTransaction {
    VerboseTransaction {
      txid: tx.compute_txid(),
      vin: tx
        .input
        .iter()
        .map(|input| VerboseInput {
          script_sig: Some(ScriptSig {
            hex: hex::encode(input.script_sig.as_bytes()),
          }),
        })
        .collect(),
      vout: tx
        .output
        .iter()
        .enumerate()
        .map(|(vout, _)| VerboseOutput {
          spent: (vout == 0)
            .then_some(spent.map(|hash| SpentBy { hash }))
            .flatten(),
        })
        .collect(),
    }
  }

  impl Node for ChainNode {
    fn import_private_key(&self, _: &PrivateKey, _: &str) -> Result {
      Ok(())
    }

    fn list_unspent(&self, _: &Address) -> Result<Vec<Utxo>> {
      Ok(Vec::new())
    }

    fn broadcast(&self, tx: &Transaction) -> Result<Txid, BroadcastError> {
      Ok(tx.compute_txid())
    }

    fn get_verbose_transaction(&self, txid: Txid) -> Result<VerboseTransaction> {
      self
        .txs
        .get(&txid)
        .cloned()
        .with_context(|| format!("no transaction with txid {txid}"))
    }
  }

  fn inscription_chain(envelope: &Envelope) -> Vec<Transaction> {
    let mut wallet = wallet_with_utxos(&[Amount::from_sat(10_000_000_000)]);

    let destination = wallet.address.clone();

    inscribe(&mut wallet, &destination, envelope, FeeRate::default()).unwrap()
  }

  #[test]
  fn single_transaction_inscription_round_trips() {
    let envelope = Envelope::new("text/plain", b"hello world".to_vec()).unwrap();

    let chain = inscription_chain(&envelope);
    let node = ChainNode::new(&chain);

    assert_eq!(
      extract(&node, chain[1].compute_txid()).unwrap(),
      envelope
    );
  }

  #[test]
  fn multi_transaction_inscription_round_trips() {
    let envelope =
      Envelope::new("image/png", (0..=255).cycle().take(9000).collect()).unwrap();

    let chain = inscription_chain(&envelope);
    let node = ChainNode::new(&chain);

    assert!(chain.len() > 2);

    assert_eq!(
      extract(&node, chain[1].compute_txid()).unwrap(),
      envelope
    );
  }

  #[test]
  fn non_inscription_transaction_is_rejected() {
    let envelope = Envelope::new("text/plain", b"hi".to_vec()).unwrap();

    let chain = inscription_chain(&envelope);
    let node = ChainNode::new(&chain);

    // the first transaction only commits, its input reveals nothing
    assert!(extract(&node, chain[0].compute_txid())
      .unwrap_err()
      .to_string()
      .contains("not a junkscription"));
  }

  #[test]
  fn unspent_continuation_is_an_error() {
    let envelope =
      Envelope::new("image/png", (0..=255).cycle().take(9000).collect()).unwrap();

    let chain = inscription_chain(&envelope);

    // drop the final reveal so the walk dead-ends
    let node = ChainNode::new(&chain[..chain.len() - 1]);

    assert!(extract(&node, chain[1].compute_txid())
      .unwrap_err()
      .to_string()
      .contains("not yet spent"));
  }
}
