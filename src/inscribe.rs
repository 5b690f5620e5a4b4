use super::*;

/// Builds the transaction chain for an inscription. Each transaction
/// commits to the next partial script behind a P2SH output holding
/// `INSCRIPTION_VALUE`, and reveals the previous partial in its first
/// input's unlocking script. The final transaction reveals the last
/// partial and pays the carrier value to `destination`.
///
/// The wallet is updated in memory as each transaction is built so later
/// transactions fund themselves from earlier change; the caller persists
/// wallet state as transactions are actually broadcast.
pub(crate) fn inscribe(
  wallet: &mut Wallet,
  destination: &Address,
  envelope: &Envelope,
  fee_rate: FeeRate,
) -> Result<Vec<Transaction>> {
  let partials = envelope.partials()?;
  let public_key = wallet.public_key();

  let mut txs = Vec::new();
  let mut last: Option<(OutPoint, ChunkedScript, ChunkedScript)> = None;

  for partial in partials {
    let lock = lock_script(&public_key, partial.len())?;

    let mut tx = Transaction {
      version: Version::ONE,
      lock_time: LockTime::ZERO,
      input: Vec::new(),
      output: vec![TxOut {
        value: INSCRIPTION_VALUE,
        script_pubkey: ScriptBuf::new_p2sh(&lock.to_script_buf().script_hash()),
      }],
    };

    build(wallet, &mut tx, &last, fee_rate)?;

    last = Some((
      OutPoint {
        txid: tx.compute_txid(),
        vout: 0,
      },
      lock,
      partial,
    ));

    txs.push(tx);
  }

  let mut tx = Transaction {
    version: Version::ONE,
    lock_time: LockTime::ZERO,
    input: Vec::new(),
    output: vec![TxOut {
      value: INSCRIPTION_VALUE,
      script_pubkey: destination.script_pubkey(),
    }],
  };

  build(wallet, &mut tx, &last, fee_rate)?;

  txs.push(tx);

  Ok(txs)
}

/// Funds and signs one transaction in the chain. When a previous carrier
/// exists it becomes input zero, its value counts toward funding, and the
/// revealing unlock script is attached once outputs are final.
fn build(
  wallet: &mut Wallet,
  tx: &mut Transaction,
  last: &Option<(OutPoint, ChunkedScript, ChunkedScript)>,
  fee_rate: FeeRate,
) -> Result {
  let mut carried = Amount::ZERO;

  if let Some((outpoint, _, _)) = last {
    tx.input.push(TxIn {
      previous_output: *outpoint,
      script_sig: ScriptBuf::new(),
      sequence: Sequence::MAX,
      witness: Witness::new(),
    });
    carried = INSCRIPTION_VALUE;
  }

  wallet.fund(tx, carried, fee_rate)?;

  if let Some((_, lock, partial)) = last {
    attach_unlock(tx, &wallet.private_key, lock, partial)?;
  }

  wallet.update(tx);

  Ok(())
}

/// The locking script a carrier output commits to: the inscriber's key,
/// a signature check, and one `OP_DROP` per chunk of the partial script
/// that will precede the signature in the unlocking script.
fn lock_script(public_key: &PublicKey, chunk_count: usize) -> Result<ChunkedScript> {
  let mut lock = ChunkedScript::new();

  lock.push_back(Chunk::push(public_key.to_bytes())?);
  lock.push_back(Chunk::op(opcodes::all::OP_CHECKSIGVERIFY));

  for _ in 0..chunk_count {
    lock.push_back(Chunk::op(opcodes::all::OP_DROP));
  }

  lock.push_back(Chunk::op(opcodes::OP_TRUE));

  Ok(lock)
}

/// Signs input zero against the previous locking script and sets its
/// unlocking script: the revealed partial chunks, then the signature, then
/// the serialized lock for the P2SH redeem. Legacy sighash ignores input
/// scripts, so attaching after the P2PKH inputs are signed does not
/// invalidate them.
fn attach_unlock(
  tx: &mut Transaction,
  private_key: &PrivateKey,
  lock: &ChunkedScript,
  partial: &ChunkedScript,
) -> Result {
  let secp = Secp256k1::new();
  let sighash_type = EcdsaSighashType::All;

  let sighash =
    SighashCache::new(&*tx).legacy_signature_hash(0, &lock.to_script_buf(), sighash_type.to_u32())?;

  let signature = secp.sign_ecdsa(
    &Message::from_digest_slice(sighash.as_ref())?,
    &private_key.inner,
  );

  let mut signature = signature.serialize_der().to_vec();
  signature.push(u8::try_from(sighash_type.to_u32()).unwrap());

  let mut unlock = partial.clone();
  unlock.push_back(Chunk::push(signature)?);
  unlock.push_back(Chunk::push(lock.to_bytes())?);

  tx.input[0].script_sig = unlock.to_script_buf();

  Ok(())
}

#[cfg(test)]
mod tests {
  use {super::*, crate::test_helpers::wallet_with_utxos, pretty_assertions::assert_eq};

  fn rich_wallet() -> Wallet {
    wallet_with_utxos(&[
      Amount::from_sat(5_000_000_000),
      Amount::from_sat(5_000_000_000),
    ])
  }

  fn destination() -> Address {
    "1BitcoinEaterAddressDontSendf59kuE"
      .parse::<Address<NetworkUnchecked>>()
      .unwrap()
      .require_network(Network::Bitcoin)
      .unwrap()
  }

  #[test]
  fn small_inscription_is_two_transactions() {
    let mut wallet = rich_wallet();
    let destination = destination();

    let envelope = Envelope::new("text/plain", b"hi".to_vec()).unwrap();

    let txs = inscribe(&mut wallet, &destination, &envelope, FeeRate::default()).unwrap();

    assert_eq!(txs.len(), 2);
    assert!(txs[0].output[0].script_pubkey.is_p2sh());
    assert_eq!(txs[0].output[0].value, INSCRIPTION_VALUE);
    assert_eq!(txs[1].output[0].script_pubkey, destination.script_pubkey());
    assert_eq!(txs[1].output[0].value, INSCRIPTION_VALUE);
  }

  #[test]
  fn transactions_chain_through_first_outputs() {
    let mut wallet = rich_wallet();

    let envelope = Envelope::new("image/png", vec![0xaa; 4000]).unwrap();

    let txs = inscribe(&mut wallet, &destination(), &envelope, FeeRate::default()).unwrap();

    assert!(txs.len() > 2);

    for (tx, next) in txs.iter().zip(txs.iter().skip(1)) {
      assert_eq!(
        next.input[0].previous_output,
        OutPoint {
          txid: tx.compute_txid(),
          vout: 0
        }
      );
    }
  }

  #[test]
  fn unlock_reveals_partial_then_signature_then_lock() {
    let mut wallet = rich_wallet();

    let envelope = Envelope::new("text/plain", b"hello world".to_vec()).unwrap();

    let partials = envelope.partials().unwrap();
    let lock = lock_script(&wallet.public_key(), partials[0].len()).unwrap();

    let txs = inscribe(&mut wallet, &destination(), &envelope, FeeRate::default()).unwrap();

    let unlock = ChunkedScript::from_bytes(txs[1].input[0].script_sig.as_bytes()).unwrap();

    assert_eq!(unlock.len(), partials[0].len() + 2);

    let chunks = unlock.iter().cloned().collect::<Vec<Chunk>>();

    assert_eq!(
      chunks[..partials[0].len()],
      partials[0].iter().cloned().collect::<Vec<Chunk>>()
    );

    assert_eq!(chunks[unlock.len() - 1].as_push().unwrap(), lock.to_bytes());
  }

  #[test]
  fn reveal_signature_verifies_against_lock() {
    let mut wallet = rich_wallet();

    let envelope = Envelope::new("text/plain", b"hi".to_vec()).unwrap();

    let partials = envelope.partials().unwrap();
    let lock = lock_script(&wallet.public_key(), partials[0].len()).unwrap();

    let txs = inscribe(&mut wallet, &destination(), &envelope, FeeRate::default()).unwrap();

    let unlock = ChunkedScript::from_bytes(txs[1].input[0].script_sig.as_bytes()).unwrap();
    let chunks = unlock.iter().cloned().collect::<Vec<Chunk>>();

    let signature = chunks[unlock.len() - 2].as_push().unwrap();
    let signature = bitcoin::secp256k1::ecdsa::Signature::from_der(
      &signature[..signature.len() - 1],
    )
    .unwrap();

    let sighash = SighashCache::new(&txs[1])
      .legacy_signature_hash(0, &lock.to_script_buf(), EcdsaSighashType::All.to_u32())
      .unwrap();

    Secp256k1::new()
      .verify_ecdsa(
        &Message::from_digest_slice(sighash.as_ref()).unwrap(),
        &signature,
        &wallet.public_key().inner,
      )
      .unwrap();
  }

  #[test]
  fn chain_funds_itself_from_change() {
    let mut wallet = wallet_with_utxos(&[Amount::from_sat(10_000_000_000)]);

    let envelope = Envelope::new("image/png", vec![0xaa; 6000]).unwrap();

    let txs = inscribe(&mut wallet, &destination(), &envelope, FeeRate::default()).unwrap();

    let txids = txs
      .iter()
      .map(Transaction::compute_txid)
      .collect::<Vec<Txid>>();

    for tx in &txs[1..] {
      for input in &tx.input[1..] {
        assert!(txids.contains(&input.previous_output.txid));
      }
    }
  }
}
