use super::*;

/// Broadcast failures, split by how the driver should react: transient
/// failures are retried, already-accepted transactions are skipped, and
/// everything else aborts the run with the pending queue intact.
#[derive(Debug, Snafu)]
pub(crate) enum BroadcastError {
  #[snafu(display("node rejected transaction transiently: {message}"))]
  Transient { message: String },
  #[snafu(display("transaction already accepted: {message}"))]
  AlreadyAccepted { message: String },
  #[snafu(display("node rejected transaction: {source}"))]
  Rejected { source: bitcoincore_rpc::Error },
}

fn classify(err: bitcoincore_rpc::Error) -> BroadcastError {
  if let bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(ref rpc)) =
    err
  {
    let message = rpc.message.clone();

    if message.contains("too-long-mempool-chain") {
      return BroadcastError::Transient { message };
    }

    if rpc.code == -27
      || message.contains("bad-txns-inputs-spent")
      || message.contains("already in block chain")
    {
      return BroadcastError::AlreadyAccepted { message };
    }
  }

  BroadcastError::Rejected { source: err }
}

/// A raw transaction as the node reports it with verbosity enabled,
/// reduced to the fields the extractor walks: input scripts and the
/// node's spent-by annotation on outputs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VerboseTransaction {
  pub(crate) txid: Txid,
  pub(crate) vin: Vec<VerboseInput>,
  pub(crate) vout: Vec<VerboseOutput>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VerboseInput {
  #[serde(default, rename = "scriptSig")]
  pub(crate) script_sig: Option<ScriptSig>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ScriptSig {
  pub(crate) hex: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VerboseOutput {
  #[serde(default)]
  pub(crate) spent: Option<SpentBy>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SpentBy {
  pub(crate) hash: Txid,
}

/// The node operations the rest of the crate needs. Kept narrow so the
/// broadcast driver and extractor can run against a fake in tests.
pub(crate) trait Node {
  fn import_private_key(&self, private_key: &PrivateKey, label: &str) -> Result;

  fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>>;

  fn broadcast(&self, tx: &Transaction) -> Result<Txid, BroadcastError>;

  fn get_verbose_transaction(&self, txid: Txid) -> Result<VerboseTransaction>;
}

#[derive(Debug)]
pub(crate) struct CoreClient {
  client: bitcoincore_rpc::Client,
}

impl CoreClient {
  pub(crate) fn new(url: &str, auth: bitcoincore_rpc::Auth) -> Result<Self> {
    Ok(Self {
      client: bitcoincore_rpc::Client::new(url, auth)
        .with_context(|| format!("failed to connect to node at `{url}`"))?,
    })
  }
}

impl Node for CoreClient {
  fn import_private_key(&self, private_key: &PrivateKey, label: &str) -> Result {
    self
      .client
      .import_private_key(private_key, Some(label), Some(false))?;
    Ok(())
  }

  fn list_unspent(&self, address: &Address) -> Result<Vec<Utxo>> {
    Ok(
      self
        .client
        .list_unspent(Some(0), Some(9_999_999), Some(&[address]), None, None)?
        .into_iter()
        .map(|entry| Utxo {
          outpoint: OutPoint {
            txid: entry.txid,
            vout: entry.vout,
          },
          script_pubkey: entry.script_pub_key,
          value: entry.amount,
        })
        .collect(),
    )
  }

  fn broadcast(&self, tx: &Transaction) -> Result<Txid, BroadcastError> {
    self.client.send_raw_transaction(tx).map_err(classify)
  }

  fn get_verbose_transaction(&self, txid: Txid) -> Result<VerboseTransaction> {
    Ok(self.client.call(
      "getrawtransaction",
      &[serde_json::to_value(txid)?, true.into()],
    )?)
  }
}

#[cfg(test)]
mod tests {
  use {super::*, bitcoincore_rpc::jsonrpc::error::RpcError, pretty_assertions::assert_eq};

  fn rpc_error(code: i32, message: &str) -> bitcoincore_rpc::Error {
    bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(RpcError {
      code,
      message: message.into(),
      data: None,
    }))
  }

  #[test]
  fn mempool_chain_limit_is_transient() {
    assert!(matches!(
      classify(rpc_error(-26, "too-long-mempool-chain, too many unconfirmed ancestors")),
      BroadcastError::Transient { .. }
    ));
  }

  #[test]
  fn spent_inputs_and_known_transactions_are_already_accepted() {
    assert!(matches!(
      classify(rpc_error(-25, "bad-txns-inputs-spent")),
      BroadcastError::AlreadyAccepted { .. }
    ));
    assert!(matches!(
      classify(rpc_error(-27, "Transaction already in block chain")),
      BroadcastError::AlreadyAccepted { .. }
    ));
  }

  #[test]
  fn other_failures_are_rejections() {
    assert!(matches!(
      classify(rpc_error(-26, "min relay fee not met")),
      BroadcastError::Rejected { .. }
    ));
    assert!(matches!(
      classify(bitcoincore_rpc::Error::ReturnedError("boom".into())),
      BroadcastError::Rejected { .. }
    ));
  }

  #[test]
  fn verbose_transaction_tolerates_extra_fields() {
    let tx = serde_json::from_str::<VerboseTransaction>(
      r#"{
        "txid": "0000000000000000000000000000000000000000000000000000000000000001",
        "hash": "0000000000000000000000000000000000000000000000000000000000000001",
        "version": 1,
        "vin": [
          {
            "txid": "0000000000000000000000000000000000000000000000000000000000000002",
            "vout": 0,
            "scriptSig": {"asm": "", "hex": "036f7264"},
            "sequence": 4294967295
          },
          {"coinbase": "04ffff001d"}
        ],
        "vout": [
          {
            "value": 0.005,
            "n": 0,
            "scriptPubKey": {"hex": "a914000000000000000000000000000000000000000087"},
            "spent": {"hash": "0000000000000000000000000000000000000000000000000000000000000003"}
          },
          {"value": 0.1, "n": 1, "scriptPubKey": {"hex": "51"}}
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(tx.vin[0].script_sig.as_ref().unwrap().hex, "036f7264");
    assert!(tx.vin[1].script_sig.is_none());
    assert_eq!(
      tx.vout[0].spent.as_ref().unwrap().hash,
      Txid::from_byte_array({
        let mut bytes = [0; 32];
        bytes[0] = 3;
        bytes
      })
    );
    assert!(tx.vout[1].spent.is_none());
  }
}
